//! The emulator/debugger module for LS-8.

use std::io;

use thiserror::Error;

pub mod alu;
pub mod debugger;
pub mod emulator;
pub mod instructions;
pub mod ram;
pub mod registers;

#[derive(Debug, Error)]
pub enum EmuError {
    #[error("address {0:#04x} is outside of memory")]
    OutOfRange(usize),
    #[error("invalid register: R{0}")]
    InvalidRegister(u8),
    #[error("unsupported ALU operation: {0}")]
    UnsupportedOperation(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("stack pointer moved below address 0x00")]
    StackOverflow,
    #[error("unrecognized opcode {opcode:#010b} at pc={pc:#04x}")]
    UnrecognizedOpcode { opcode: u8, pc: usize },
    #[error("failed to write program output")]
    Output(#[from] io::Error),
}

/// Type alias for Result<T, [EmuError]>.
pub type EmuResult<T> = Result<T, EmuError>;
