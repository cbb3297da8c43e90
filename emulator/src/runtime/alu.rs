//! Arithmetic and comparison between two registers.

use std::cmp::Ordering;

use parse_display::Display;
use thiserror::Error;
use tracing::debug;

use super::registers::{Flags, Reg, Registers};

/// An operation the ALU knows how to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "UPPERCASE")]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Cmp,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported ALU operation {0:?}")]
pub struct UnsupportedOperation(pub String);

impl std::str::FromStr for AluOp {
    type Err = UnsupportedOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADD" => Ok(AluOp::Add),
            "SUB" => Ok(AluOp::Sub),
            "MUL" => Ok(AluOp::Mul),
            "CMP" => Ok(AluOp::Cmp),
            _ => Err(UnsupportedOperation(s.to_owned())),
        }
    }
}

impl Flags {
    /// Exactly one flag for each possible ordering
    #[must_use]
    pub const fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Flags::LESS,
            Ordering::Equal => Flags::EQUAL,
            Ordering::Greater => Flags::GREATER,
        }
    }
}

impl Registers {
    /// Run an ALU operation on two registers.
    ///
    /// Arithmetic stores the wrapped result in `a` and leaves the flags alone.
    /// Comparison replaces the flags and leaves the registers alone.
    pub fn alu(&mut self, op: AluOp, a: Reg, b: Reg) {
        let lhs = self.get(a);
        let rhs = self.get(b);

        let res = match op {
            AluOp::Add => lhs.wrapping_add(rhs),
            AluOp::Sub => lhs.wrapping_sub(rhs),
            AluOp::Mul => lhs.wrapping_mul(rhs),
            AluOp::Cmp => {
                self.fl = Flags::from_ordering(lhs.cmp(&rhs));
                debug!("cmp({}, {}) => {:?}", lhs, rhs, self.fl);
                return;
            }
        };

        debug!("{} {} {} = {}", op, lhs, rhs, res);
        self.set(a, res);
    }
}
