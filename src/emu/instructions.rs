//! Instruction handlers and the opcode table that dispatches to them.

use std::io::Write;

use rustc_hash::FxHashMap;

use crate::plat::Opcode;

use super::{
    alu::AluOp,
    emulator::{EmuState, Emulator, StopReason},
    registers::Fl,
    EmuError, EmuResult,
};

/// An instruction handler. Receives the machine and the instruction's operand bytes.
pub type Handler<W> = fn(&mut Emulator<W>, [u8; 2]) -> EmuResult<()>;

/// Everything the run loop needs to know about one opcode.
pub struct OpcodeEntry<W> {
    pub opcode: Opcode,
    pub operand_count: usize,
    pub sets_pc: bool,
    pub handler: Handler<W>,
}

impl<W> Clone for OpcodeEntry<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for OpcodeEntry<W> {}

/// Maps instruction words to their [`OpcodeEntry`]. Built once per machine.
pub struct OpcodeTable<W> {
    entries: FxHashMap<u8, OpcodeEntry<W>>,
}

impl<W: Write> OpcodeTable<W> {
    pub fn new() -> Self {
        let entries = Opcode::ALL
            .into_iter()
            .map(|opcode| {
                let entry = OpcodeEntry {
                    opcode,
                    operand_count: opcode.operand_count(),
                    sets_pc: opcode.sets_pc(),
                    handler: handler_for(opcode),
                };
                (opcode as u8, entry)
            })
            .collect();
        Self { entries }
    }
}

impl<W> OpcodeTable<W> {
    pub fn get(&self, word: u8) -> Option<OpcodeEntry<W>> {
        self.entries.get(&word).copied()
    }
}

impl<W: Write> Default for OpcodeTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

fn handler_for<W: Write>(opcode: Opcode) -> Handler<W> {
    match opcode {
        Opcode::Hlt => hlt,
        Opcode::Ldi => ldi,
        Opcode::Prn => prn,
        Opcode::Add => add,
        Opcode::Mul => mul,
        Opcode::Cmp => cmp,
        Opcode::Push => push,
        Opcode::Pop => pop,
        Opcode::Call => call,
        Opcode::Ret => ret,
        Opcode::Jmp => jmp,
        Opcode::Jeq => jeq,
        Opcode::Jne => jne,
    }
}

fn hlt<W>(emu: &mut Emulator<W>, _: [u8; 2]) -> EmuResult<()> {
    emu.state = EmuState::Halted;
    emu.stop = Some(StopReason::Halted);
    Ok(())
}

fn ldi<W>(emu: &mut Emulator<W>, [reg, value]: [u8; 2]) -> EmuResult<()> {
    emu.registers.set(reg, value)
}

fn prn<W: Write>(emu: &mut Emulator<W>, [reg, _]: [u8; 2]) -> EmuResult<()> {
    let value = emu.registers.get(reg)?;
    writeln!(emu.output, "{}", value)?;
    Ok(())
}

fn add<W>(emu: &mut Emulator<W>, [a, b]: [u8; 2]) -> EmuResult<()> {
    AluOp::Add.execute(&mut emu.registers, a, b)
}

fn mul<W>(emu: &mut Emulator<W>, [a, b]: [u8; 2]) -> EmuResult<()> {
    AluOp::Mul.execute(&mut emu.registers, a, b)
}

fn cmp<W>(emu: &mut Emulator<W>, [a, b]: [u8; 2]) -> EmuResult<()> {
    AluOp::Cmp.execute(&mut emu.registers, a, b)
}

fn push<W>(emu: &mut Emulator<W>, [reg, _]: [u8; 2]) -> EmuResult<()> {
    let value = emu.registers.get(reg)?;
    emu.push(value)
}

fn pop<W>(emu: &mut Emulator<W>, [reg, _]: [u8; 2]) -> EmuResult<()> {
    emu.pop_into(|emu, value| emu.registers.set(reg, value))
}

fn call<W>(emu: &mut Emulator<W>, [reg, _]: [u8; 2]) -> EmuResult<()> {
    let target = emu.registers.get(reg)?;
    let return_addr = emu.registers.pc + 2;
    let return_addr = u8::try_from(return_addr).map_err(|_| EmuError::OutOfRange(return_addr))?;
    emu.push(return_addr)?;
    emu.registers.pc = target as usize;
    Ok(())
}

fn ret<W>(emu: &mut Emulator<W>, _: [u8; 2]) -> EmuResult<()> {
    emu.pop_into(|emu, addr| {
        emu.registers.pc = addr as usize;
        Ok(())
    })
}

fn jmp<W>(emu: &mut Emulator<W>, [reg, _]: [u8; 2]) -> EmuResult<()> {
    emu.registers.pc = emu.registers.get(reg)? as usize;
    Ok(())
}

fn jeq<W>(emu: &mut Emulator<W>, [reg, _]: [u8; 2]) -> EmuResult<()> {
    let taken = emu.registers.flags().contains(Fl::EQUAL);
    branch(emu, reg, taken)
}

fn jne<W>(emu: &mut Emulator<W>, [reg, _]: [u8; 2]) -> EmuResult<()> {
    let taken = !emu.registers.flags().contains(Fl::EQUAL);
    branch(emu, reg, taken)
}

fn branch<W>(emu: &mut Emulator<W>, reg: u8, taken: bool) -> EmuResult<()> {
    if taken {
        emu.registers.pc = emu.registers.get(reg)? as usize;
    } else {
        emu.registers.pc += 2;
    }
    Ok(())
}
