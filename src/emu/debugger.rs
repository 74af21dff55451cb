use std::{cell::RefCell, io::Write};

use anyhow::Result;
use easy_repl::{command, repl::LoopStatus, CommandStatus, Repl};

use super::emulator::{EmuState, Emulator};

/// Parses a memory address given either in decimal or as hex (with or without `0x`).
pub fn parse_addr(addr: &str) -> Result<usize> {
    if let Ok(addr) = addr.parse::<usize>() {
        return Ok(addr);
    }
    let hex = addr.trim_start_matches("0x").trim_start_matches("0X");
    Ok(usize::from_str_radix(hex, 16)?)
}

pub struct Debugger<'b, W> {
    pub emu: RefCell<&'b mut Emulator<W>>,
}

impl<'b, W: Write> Debugger<'b, W> {
    pub fn new(emu: &'b mut Emulator<W>) -> Self {
        Self {
            emu: RefCell::new(emu),
        }
    }

    pub fn repl(&self) -> Result<()> {
        let mut repl = Repl::builder()
            .description("LS-8 Debug REPL")
            .add(
                "c",
                command! {
                    "Continue execution",
                    () => || {
                        Ok(CommandStatus::Quit)
                    }
                },
            )
            .add(
                "s",
                command! {
                    "Step one instruction",
                    () => || {
                        self.emu.borrow_mut().step()?;
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "pr",
                command! {
                    "Print the value of all registers",
                    () => || {
                        let emu = self.emu.borrow();
                        eprintln!("{}", emu.registers);
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "trace",
                command! {
                    "Print the trace line for the current instruction",
                    () => || {
                        eprintln!("{}", self.emu.borrow().trace());
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "peek",
                command! {
                    "Peek a value from memory",
                    (addr:String) => |addr: String| {
                        let emu = self.emu.borrow();
                        let addr = parse_addr(&addr)?;
                        let val = emu.ram.read(addr)?;
                        eprintln!("{:02X}={:02X}", addr, val);
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "halt",
                command! {
                    "Halt execution",
                    () => || {
                        self.emu.borrow_mut().state = EmuState::Halted;
                        Ok(CommandStatus::Quit)
                    }
                },
            )
            .build()?;
        eprintln!("LS-8 Debug REPL");
        'repl: loop {
            eprintln!();
            {
                let emu = self.emu.borrow();
                eprintln!("{}", emu.trace());
            }

            let status = repl.next()?;
            if let LoopStatus::Break = status {
                break 'repl;
            }
            {
                let emu = self.emu.borrow();
                if let EmuState::Halted = emu.state {
                    break 'repl;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr("244").unwrap(), 244);
        assert_eq!(parse_addr("0xF4").unwrap(), 0xF4);
        assert_eq!(parse_addr("ff").unwrap(), 0xFF);
        assert!(parse_addr("zz").is_err());
    }
}
