//! Common platform definitions for LS-8: machine constants, registers, opcodes,
//! and the layout of an instruction word.

use std::fmt;

use thiserror::Error;

/// Number of addressable bytes of main memory.
pub const MEMORY_SIZE: usize = 256;

/// Number of general purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Address the stack pointer holds on power-up. The stack grows downward from here.
pub const STACK_TOP: u8 = 0xF4;

/// An error for the core platform of LS-8.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("invalid opcode {0:#010b}")]
    InvalidOpcode(u8),
    #[error("invalid register index {0}")]
    InvalidRegister(u8),
}

/// The eight general purpose registers of LS-8.
///
/// The stack pointer is *not* one of these: it is held separately by the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Register {
    /// Index of the register in the register file.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Register {
    type Error = PlatformError;

    fn try_from(value: u8) -> Result<Self, PlatformError> {
        match value {
            0 => Ok(Self::R0),
            1 => Ok(Self::R1),
            2 => Ok(Self::R2),
            3 => Ok(Self::R3),
            4 => Ok(Self::R4),
            5 => Ok(Self::R5),
            6 => Ok(Self::R6),
            7 => Ok(Self::R7),
            _ => Err(PlatformError::InvalidRegister(value)),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", *self as u8)
    }
}

/// Bit layout of an instruction word.
///
/// ```text
/// AABCDDDD
/// ||||
/// |||+---- instruction identifier
/// ||+----- sets PC directly
/// |+------ ALU operation
/// +------- number of operand bytes that follow (0-2)
/// ```
pub mod word {
    pub const OPERANDS_MASK: u8 = 0b1100_0000;
    pub const OPERANDS_SHIFT: u32 = 6;
    pub const ALU_BIT: u8 = 0b0010_0000;
    pub const SETS_PC_BIT: u8 = 0b0001_0000;

    /// Number of immediate operand bytes following the instruction word.
    pub fn operand_count(word: u8) -> usize {
        ((word & OPERANDS_MASK) >> OPERANDS_SHIFT) as usize
    }

    /// Whether the instruction places PC itself.
    pub fn sets_pc(word: u8) -> bool {
        word & SETS_PC_BIT != 0
    }

    pub fn is_alu(word: u8) -> bool {
        word & ALU_BIT != 0
    }
}

/// Every instruction LS-8 understands, tagged with its machine-code value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /* Halt */
    /// Stops the machine.
    Hlt = 0b0000_0001,

    /* Registers */
    /// `regA <- (immediate value)`
    Ldi = 0b1000_0010,
    /// Prints the decimal value of `regA`.
    Prn = 0b0100_0111,

    /* ALU */
    /// `regA <- regA + regB`
    Add = 0b1010_0000,
    /// `regA <- regA * regB`
    Mul = 0b1010_0010,
    /// Compares `regA` with `regB`, setting exactly one of the FL bits.
    Cmp = 0b1010_0111,

    /* Stack */
    /// `SP <- SP - 1; mem[SP] <- regA`
    Push = 0b0100_0101,
    /// `regA <- mem[SP]; SP <- SP + 1`
    Pop = 0b0100_0110,

    /* Branching */
    /// Pushes the address of the next instruction and jumps to `regA`.
    Call = 0b0101_0000,
    /// Pops the return address into PC.
    Ret = 0b0001_0001,
    /// `PC <- regA`
    Jmp = 0b0101_0100,
    /// "Jump if Equal"
    /// ```text
    /// if FL.E == 1 {
    ///     PC <- regA
    /// }
    /// ```
    Jeq = 0b0101_0101,
    /// "Jump if Not Equal"
    /// ```text
    /// if FL.E == 0 {
    ///     PC <- regA
    /// }
    /// ```
    Jne = 0b0101_0110,
}

impl Opcode {
    /// The full instruction set, in table order.
    pub const ALL: [Opcode; 13] = [
        Self::Hlt,
        Self::Ldi,
        Self::Prn,
        Self::Add,
        Self::Mul,
        Self::Cmp,
        Self::Push,
        Self::Pop,
        Self::Call,
        Self::Ret,
        Self::Jmp,
        Self::Jeq,
        Self::Jne,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Hlt => "HLT",
            Self::Ldi => "LDI",
            Self::Prn => "PRN",
            Self::Add => "ADD",
            Self::Mul => "MUL",
            Self::Cmp => "CMP",
            Self::Push => "PUSH",
            Self::Pop => "POP",
            Self::Call => "CALL",
            Self::Ret => "RET",
            Self::Jmp => "JMP",
            Self::Jeq => "JEQ",
            Self::Jne => "JNE",
        }
    }

    pub fn operand_count(self) -> usize {
        word::operand_count(self as u8)
    }

    pub fn sets_pc(self) -> bool {
        word::sets_pc(self as u8)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = PlatformError;

    fn try_from(value: u8) -> Result<Self, PlatformError> {
        Self::ALL
            .into_iter()
            .find(|op| *op as u8 == value)
            .ok_or(PlatformError::InvalidOpcode(value))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction: the opcode plus its raw operand bytes.
///
/// Operand slots beyond [`Opcode::operand_count`] are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub op: Opcode,
    pub operands: [u8; 2],
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.operands;
        match self.op {
            Opcode::Hlt | Opcode::Ret => write!(f, "{}", self.op),
            Opcode::Ldi => write!(f, "{} R{}, {:#04x}", self.op, a, b),
            op if word::is_alu(op as u8) => write!(f, "{} R{}, R{}", op, a, b),
            op => write!(f, "{} R{}", op, a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_metadata() {
        assert_eq!(Opcode::Hlt.operand_count(), 0);
        assert_eq!(Opcode::Ldi.operand_count(), 2);
        assert_eq!(Opcode::Prn.operand_count(), 1);
        assert_eq!(Opcode::Cmp.operand_count(), 2);
        assert_eq!(Opcode::Ret.operand_count(), 0);

        let sets_pc: Vec<_> = Opcode::ALL.into_iter().filter(|op| op.sets_pc()).collect();
        assert_eq!(
            sets_pc,
            [Opcode::Call, Opcode::Ret, Opcode::Jmp, Opcode::Jeq, Opcode::Jne]
        );
        assert!(word::is_alu(Opcode::Mul as u8));
        assert!(!word::is_alu(Opcode::Ldi as u8));
    }

    #[test]
    fn test_opcode_decode() {
        assert_eq!(Opcode::try_from(0b1000_0010), Ok(Opcode::Ldi));
        assert_eq!(Opcode::try_from(0b0001_0001), Ok(Opcode::Ret));
        assert_eq!(
            Opcode::try_from(0xFF),
            Err(PlatformError::InvalidOpcode(0xFF))
        );
    }

    #[test]
    fn test_register_decode() {
        assert_eq!(Register::try_from(7), Ok(Register::R7));
        assert_eq!(
            Register::try_from(8),
            Err(PlatformError::InvalidRegister(8))
        );
    }

    #[test]
    fn test_instruction_display() {
        let ldi = Instruction {
            op: Opcode::Ldi,
            operands: [0, 8],
        };
        assert_eq!(ldi.to_string(), "LDI R0, 0x08");
        let call = Instruction {
            op: Opcode::Call,
            operands: [1, 0],
        };
        assert_eq!(call.to_string(), "CALL R1");
        let cmp = Instruction {
            op: Opcode::Cmp,
            operands: [0, 1],
        };
        assert_eq!(cmp.to_string(), "CMP R0, R1");
        let push = Instruction {
            op: Opcode::Push,
            operands: [3, 0],
        };
        assert_eq!(push.to_string(), "PUSH R3");
    }
}
