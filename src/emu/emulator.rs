use std::io::{self, Stdout, Write};

use anyhow::{anyhow, Context, Result};

use crate::plat::Instruction;

use super::{
    debugger::Debugger,
    instructions::OpcodeTable,
    ram::Ram,
    registers::Registers,
    EmuError, EmuResult,
};

/// The emulator's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmuState {
    /// The emulator is allowed to fetch and execute the next instruction.
    Running,
    /// Execution has ended, either by `HLT`, an unrecognized opcode, or a fatal error.
    /// This state is terminal.
    Halted,
}

/// Why a call to [`Emulator::run`] or [`Emulator::run_for`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A `HLT` instruction was executed.
    Halted,
    /// The word at `pc` is not in the opcode table. The machine halts in an orderly fashion.
    UnrecognizedOpcode { opcode: u8, pc: usize },
    /// The step budget given to [`Emulator::run_for`] ran out while the machine was still running.
    StepLimit,
}

/// The main emulation context for LS-8.
pub struct Emulator<W = Stdout> {
    pub registers: Registers,
    pub ram: Ram,
    pub state: EmuState,
    pub(crate) output: W,
    pub(crate) stop: Option<StopReason>,
    fault: Option<String>,
    table: OpcodeTable<W>,
    steps: u64,
}

impl Emulator<Stdout> {
    /// Creates a powered-on machine whose `PRN` output goes to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Emulator<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Emulator<W> {
    /// Creates a powered-on machine whose `PRN` output goes to `output`.
    pub fn with_output(output: W) -> Self {
        Self {
            registers: Registers::new(),
            ram: Ram::new(),
            state: EmuState::Running,
            output,
            stop: None,
            fault: None,
            table: OpcodeTable::new(),
            steps: 0,
        }
    }

    /// Loads a program image into memory starting at address 0.
    ///
    /// # Errors
    ///
    /// This function will return an error if the image is larger than memory, in which case memory is unchanged.
    pub fn load(&mut self, image: &[u8]) -> EmuResult<()> {
        self.ram.load(0, image)?;
        log::info!("loaded {} byte program", image.len());
        Ok(())
    }

    /// Runs the emulator, stepping through instructions until it reaches a halt state.
    ///
    /// # Errors
    ///
    /// This function will return an error if an instruction faults. An unrecognized
    /// opcode is not a fault: it is reported through the returned [`StopReason`].
    pub fn run(&mut self) -> Result<StopReason> {
        while self.step()? == EmuState::Running {}
        Ok(self.stop.unwrap_or(StopReason::Halted))
    }

    /// Like [`run`][Emulator::run], but gives up after executing `max_steps` instructions.
    pub fn run_for(&mut self, max_steps: u64) -> Result<StopReason> {
        for _ in 0..max_steps {
            if self.step()? == EmuState::Halted {
                return Ok(self.stop.unwrap_or(StopReason::Halted));
            }
        }
        match self.state {
            EmuState::Running => Ok(StopReason::StepLimit),
            EmuState::Halted => Ok(self.stop.unwrap_or(StopReason::Halted)),
        }
    }

    /// Fetches, decodes and executes a single instruction.
    ///
    /// Once halted, this does nothing. A fault halts the machine before the error is
    /// returned, and every later call reports that fault again.
    pub fn step(&mut self) -> Result<EmuState> {
        if let Some(fault) = &self.fault {
            return Err(anyhow!("machine halted on an earlier fault: {}", fault));
        }
        if self.state == EmuState::Halted {
            return Ok(EmuState::Halted);
        }
        if let Err(e) = self.cycle() {
            self.state = EmuState::Halted;
            self.fault = Some(format!("{:#}", e));
            return Err(e);
        }
        Ok(self.state)
    }

    fn cycle(&mut self) -> Result<()> {
        let pc = self.registers.pc;
        let word = self
            .ram
            .read(pc)
            .with_context(|| format!("fetching instruction at pc={:#04x}", pc))?;
        log::trace!("{}", self.trace());

        let Some(entry) = self.table.get(word) else {
            log::warn!(
                "{}, halting",
                EmuError::UnrecognizedOpcode { opcode: word, pc }
            );
            self.state = EmuState::Halted;
            self.stop = Some(StopReason::UnrecognizedOpcode { opcode: word, pc });
            return Ok(());
        };

        let mut operands = [0u8; 2];
        for (i, slot) in operands.iter_mut().take(entry.operand_count).enumerate() {
            *slot = self.ram.read(pc + 1 + i).with_context(|| {
                format!("fetching operands of {} at pc={:#04x}", entry.opcode, pc)
            })?;
        }
        let instr = Instruction {
            op: entry.opcode,
            operands,
        };
        log::debug!(">>> {}", instr);

        (entry.handler)(self, operands).with_context(|| {
            format!(
                "executing {} (opcode {:#010b}) at pc={:#04x} with operands {:02X?}",
                instr,
                word,
                pc,
                &operands[..entry.operand_count]
            )
        })?;
        self.steps += 1;

        if !entry.sets_pc {
            self.registers.pc = pc + entry.operand_count + 1;
        }
        Ok(())
    }

    /// Renders the current CPU state as a single trace line:
    /// `TRACE: pc | ir op1 op2 | R0 .. R7`.
    pub fn trace(&self) -> String {
        let pc = self.registers.pc;
        let peek = |addr: usize| match self.ram.read(addr) {
            Ok(byte) => format!("{:02X}", byte),
            Err(_) => "--".to_owned(),
        };
        let mut line = format!(
            "TRACE: {:02X} | {} {} {} |",
            pc,
            peek(pc),
            peek(pc + 1),
            peek(pc + 2)
        );
        for val in self.registers.gp() {
            line.push_str(&format!(" {:02X}", val));
        }
        line
    }

    pub fn is_running(&self) -> bool {
        self.state == EmuState::Running
    }

    /// Whether execution ended on a fault rather than `HLT` or an unrecognized opcode.
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// The reason the machine stopped, if it stopped on its own.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn debug(&mut self) -> Result<()> {
        Debugger::new(self).repl()
    }
}

impl<W> Emulator<W> {
    /// Decrements SP and stores `value` at the new top of the stack.
    pub(crate) fn push(&mut self, value: u8) -> EmuResult<()> {
        let sp = self
            .registers
            .sp
            .checked_sub(1)
            .ok_or(EmuError::StackOverflow)?;
        self.ram.write(sp, value)?;
        self.registers.sp = sp;
        Ok(())
    }

    /// Hands the top of the stack to `store`, then increments SP.
    ///
    /// SP only moves once `store` succeeds, so a failed pop leaves the stack as it was.
    pub(crate) fn pop_into(
        &mut self,
        store: impl FnOnce(&mut Self, u8) -> EmuResult<()>,
    ) -> EmuResult<()> {
        let value = self.ram.read(self.registers.sp)?;
        store(self, value)?;
        self.registers.sp += 1;
        Ok(())
    }
}
