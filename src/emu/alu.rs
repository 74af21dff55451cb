use std::{cmp::Ordering, fmt, str::FromStr};

use super::{
    registers::{Fl, Registers},
    EmuError, EmuResult,
};

/// The operations the ALU (Arithmetic and Logic Unit) can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Cmp,
}

impl AluOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Cmp => "CMP",
        }
    }

    /// Performs `regA <- regA op regB`, or for [`AluOp::Cmp`] updates FL instead.
    ///
    /// Results wrap to 8 bits. Registers are left untouched when an error is returned.
    ///
    /// # Errors
    ///
    /// This function will return an error if either register index is invalid,
    /// or on a division by zero.
    pub fn execute(self, regs: &mut Registers, reg_a: u8, reg_b: u8) -> EmuResult<()> {
        let a = regs.get(reg_a)?;
        let b = regs.get(reg_b)?;
        let result = match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::Mul => a.wrapping_mul(b),
            Self::Div => a.checked_div(b).ok_or(EmuError::DivisionByZero)?,
            Self::Cmp => {
                regs.set_flags(compare(a, b));
                return Ok(());
            }
        };
        log::trace!("alu: {} {:#04x}, {:#04x} = {:#04x}", self, a, b, result);
        regs.set(reg_a, result)
    }
}

impl FromStr for AluOp {
    type Err = EmuError;

    fn from_str(s: &str) -> Result<Self, EmuError> {
        match s {
            "ADD" => Ok(Self::Add),
            "SUB" => Ok(Self::Sub),
            "MUL" => Ok(Self::Mul),
            "DIV" => Ok(Self::Div),
            "CMP" => Ok(Self::Cmp),
            _ => Err(EmuError::UnsupportedOperation(s.to_owned())),
        }
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// The FL value describing `a` relative to `b`. Exactly one bit is set.
pub fn compare(a: u8, b: u8) -> Fl {
    match a.cmp(&b) {
        Ordering::Less => Fl::LESS,
        Ordering::Greater => Fl::GREATER,
        Ordering::Equal => Fl::EQUAL,
    }
}

/// Runs the ALU operation named by `op` on registers `reg_a` and `reg_b`.
///
/// # Errors
///
/// This function will return an error if `op` does not name an ALU operation,
/// or if the operation itself fails.
pub fn alu(regs: &mut Registers, op: &str, reg_a: u8, reg_b: u8) -> EmuResult<()> {
    op.parse::<AluOp>()?.execute(regs, reg_a, reg_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_with(a: u8, b: u8) -> Registers {
        let mut regs = Registers::new();
        regs.set(0, a).unwrap();
        regs.set(1, b).unwrap();
        regs
    }

    #[test]
    fn test_arithmetic() {
        let samples = [(0u8, 0u8), (8, 9), (200, 100), (3, 250), (255, 255), (17, 4)];
        for (a, b) in samples {
            let mut regs = regs_with(a, b);
            alu(&mut regs, "ADD", 0, 1).unwrap();
            assert_eq!(regs.get(0).unwrap(), a.wrapping_add(b));
            assert_eq!(regs.get(1).unwrap(), b);

            let mut regs = regs_with(a, b);
            alu(&mut regs, "SUB", 0, 1).unwrap();
            assert_eq!(regs.get(0).unwrap(), a.wrapping_sub(b));

            let mut regs = regs_with(a, b);
            alu(&mut regs, "MUL", 0, 1).unwrap();
            assert_eq!(regs.get(0).unwrap(), a.wrapping_mul(b));
        }
    }

    #[test]
    fn test_same_register_operands() {
        let mut regs = regs_with(21, 0);
        AluOp::Add.execute(&mut regs, 0, 0).unwrap();
        assert_eq!(regs.get(0).unwrap(), 42);
    }

    #[test]
    fn test_div() {
        let mut regs = regs_with(17, 4);
        AluOp::Div.execute(&mut regs, 0, 1).unwrap();
        assert_eq!(regs.get(0).unwrap(), 4);

        let mut regs = regs_with(17, 0);
        let before = regs.clone();
        assert!(matches!(
            AluOp::Div.execute(&mut regs, 0, 1),
            Err(EmuError::DivisionByZero)
        ));
        assert_eq!(regs, before);
    }

    #[test]
    fn test_cmp() {
        for a in (0..=255u8).step_by(15) {
            for b in (0..=255u8).step_by(17) {
                let mut regs = regs_with(a, b);
                AluOp::Cmp.execute(&mut regs, 0, 1).unwrap();
                let fl = regs.flags();
                assert_eq!(fl.bits().count_ones(), 1);
                assert_eq!(fl.contains(Fl::LESS), a < b);
                assert_eq!(fl.contains(Fl::GREATER), a > b);
                assert_eq!(fl.contains(Fl::EQUAL), a == b);
                // operands are not modified
                assert_eq!(regs.get(0).unwrap(), a);
                assert_eq!(regs.get(1).unwrap(), b);
            }
        }
    }

    #[test]
    fn test_flags_persist_across_arithmetic() {
        let mut regs = regs_with(5, 5);
        AluOp::Cmp.execute(&mut regs, 0, 1).unwrap();
        AluOp::Add.execute(&mut regs, 0, 1).unwrap();
        assert_eq!(regs.flags(), Fl::EQUAL);
    }

    #[test]
    fn test_unsupported_operation() {
        let mut regs = regs_with(1, 2);
        assert!(matches!(
            alu(&mut regs, "XOR", 0, 1),
            Err(EmuError::UnsupportedOperation(op)) if op == "XOR"
        ));
    }

    #[test]
    fn test_invalid_register() {
        let mut regs = Registers::new();
        assert!(matches!(
            AluOp::Add.execute(&mut regs, 0, 9),
            Err(EmuError::InvalidRegister(9))
        ));
    }
}
