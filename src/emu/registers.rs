use std::fmt;

use crate::plat::{Register, NUM_REGISTERS, STACK_TOP};

use super::{EmuError, EmuResult};

bitflags::bitflags! {
    /// The CPU comparison flags register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Fl: u8 {
        /// Set if regA == regB at the last comparison.
        const EQUAL = 1 << 0;
        /// Set if regA > regB at the last comparison.
        const GREATER = 1 << 1;
        /// Set if regA < regB at the last comparison.
        const LESS = 1 << 2;
    }
}

/// The full set of registers in the emulator.
///
/// `pc` and `sp` are only moved by the run loop and by the stack and branching
/// instructions; `fl` only by the ALU's compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    gp: [u8; NUM_REGISTERS],
    pub(crate) pc: usize,
    pub(crate) sp: usize,
    fl: Fl,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            gp: [0; NUM_REGISTERS],
            pc: 0,
            sp: STACK_TOP as usize,
            fl: Fl::empty(),
        }
    }

    fn slot(index: u8) -> EmuResult<usize> {
        Register::try_from(index)
            .map(Register::index)
            .map_err(|_| EmuError::InvalidRegister(index))
    }

    /// Reads general purpose register `index`.
    pub fn get(&self, index: u8) -> EmuResult<u8> {
        Ok(self.gp[Self::slot(index)?])
    }

    /// Writes general purpose register `index`.
    pub fn set(&mut self, index: u8, value: u8) -> EmuResult<()> {
        self.gp[Self::slot(index)?] = value;
        Ok(())
    }

    pub fn gp(&self) -> &[u8; NUM_REGISTERS] {
        &self.gp
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn flags(&self) -> Fl {
        self.fl
    }

    pub(super) fn set_flags(&mut self, fl: Fl) {
        self.fl = fl;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, val) in self.gp.iter().enumerate() {
            writeln!(f, "R{}={:02X}", i, val)?;
        }
        writeln!(f, "PC={:02X}", self.pc)?;
        writeln!(f, "SP={:02X}", self.sp)?;
        write!(f, "FL={:03b}", self.fl.bits())
    }
}
