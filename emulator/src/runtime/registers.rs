use bitflags::bitflags;
use parse_display::Display;
use thiserror::Error;

use crate::constants::{self as C, Address, Word};

bitflags! {
    /// Condition flags, only ever written by a comparison
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: Word {
        const EQUAL   = 0b0000_0001;
        const GREATER = 0b0000_0010;
        const LESS    = 0b0000_0100;
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010b}", self.bits())
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("invalid register index {0}")]
    InvalidRegister(Word),
}

/// A general purpose register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(style = "lowercase")]
pub enum Reg {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Reg {
    pub const ALL: [Reg; C::REGISTER_COUNT] = [
        Reg::R0,
        Reg::R1,
        Reg::R2,
        Reg::R3,
        Reg::R4,
        Reg::R5,
        Reg::R6,
        Reg::R7,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<Word> for Reg {
    type Error = RegisterError;

    fn try_from(index: Word) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(RegisterError::InvalidRegister(index))
    }
}

impl From<Reg> for Word {
    fn from(reg: Reg) -> Self {
        // There are only 8 of them
        reg as Word
    }
}

/// The register file.
///
/// General purpose registers are 8 bits wide and arithmetic on them wraps
/// around.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    /// General purpose
    pub gp: [Word; C::REGISTER_COUNT],

    /// Program counter
    pub pc: Address,

    /// Condition flags
    pub fl: Flags,
}

impl Registers {
    #[must_use]
    pub fn get(&self, reg: Reg) -> Word {
        self.gp[reg.index()]
    }

    pub fn set(&mut self, reg: Reg, value: Word) {
        self.gp[reg.index()] = value;
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for reg in Reg::ALL {
            write!(f, "{reg} = {:#04x} | ", self.get(reg))?;
        }
        write!(f, "pc = {:#04x} | fl = {:?}", self.pc, self.fl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reg_from_index_test() {
        assert_eq!(Reg::try_from(0), Ok(Reg::R0));
        assert_eq!(Reg::try_from(7), Ok(Reg::R7));
        assert_eq!(Reg::try_from(8), Err(RegisterError::InvalidRegister(8)));
        assert_eq!(
            Reg::try_from(0xFF),
            Err(RegisterError::InvalidRegister(0xFF))
        );

        for reg in Reg::ALL {
            assert_eq!(Reg::try_from(Word::from(reg)), Ok(reg));
        }
    }

    #[test]
    fn get_set_test() {
        let mut registers = Registers::default();
        assert_eq!(registers.gp, [0; C::REGISTER_COUNT]);
        assert!(registers.fl.is_empty());

        registers.set(Reg::R3, 42);
        assert_eq!(registers.get(Reg::R3), 42);
        assert_eq!(registers.gp, [0, 0, 0, 42, 0, 0, 0, 0]);
    }

    #[test]
    fn display_test() {
        let mut registers = Registers::default();
        registers.set(Reg::R1, 0x2A);
        registers.pc = 0x10;
        registers.fl = Flags::EQUAL;
        assert_eq!(
            registers.to_string(),
            "r0 = 0x00 | r1 = 0x2a | r2 = 0x00 | r3 = 0x00 | r4 = 0x00 | r5 = 0x00 | r6 = 0x00 \
             | r7 = 0x00 | pc = 0x10 | fl = 0b00000001"
        );
    }
}
