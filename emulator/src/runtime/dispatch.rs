//! Opcode decoding and the opcode to handler table.

use parse_display::Display;

use super::{instructions as handlers, Computer, Output, ProcessorError, Transition};
use crate::constants::{Word, MEMORY_SIZE};

/// Implements one instruction.
///
/// A handler reads its own operands, and returns where execution continues.
pub(crate) type Handler =
    fn(&mut Computer, &mut dyn Output) -> Result<Transition, ProcessorError>;

/// Every opcode the machine understands.
///
/// The two high bits of an opcode hold its number of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(style = "lowercase")]
#[repr(u8)]
pub enum Opcode {
    /// Stop the machine
    Hlt = 0b0000_0001,

    /// Load an immediate value in a register
    Ldi = 0b1000_0010,

    /// Print the value of a register
    Prn = 0b0100_0111,

    /// Compare two registers
    Cmp = 0b1010_0111,

    /// Unconditional jump
    Jmp = 0b0101_0100,

    /// Jump if equal
    Jeq = 0b0101_0101,

    /// Jump if not equal
    Jne = 0b0101_0110,
}

impl Opcode {
    pub const ALL: [Opcode; 7] = [
        Opcode::Hlt,
        Opcode::Ldi,
        Opcode::Prn,
        Opcode::Cmp,
        Opcode::Jmp,
        Opcode::Jeq,
        Opcode::Jne,
    ];

    #[must_use]
    pub const fn byte(self) -> Word {
        self as Word
    }

    /// Number of operand bytes following the opcode
    #[must_use]
    pub const fn operand_count(self) -> usize {
        (self.byte() >> 6) as usize
    }

    /// Length of the whole instruction, in bytes
    #[must_use]
    pub const fn size(self) -> usize {
        1 + self.operand_count()
    }

    pub(crate) fn handler(self) -> Handler {
        match self {
            Opcode::Hlt => handlers::hlt,
            Opcode::Ldi => handlers::ldi,
            Opcode::Prn => handlers::prn,
            Opcode::Cmp => handlers::cmp,
            Opcode::Jmp => handlers::jmp,
            Opcode::Jeq => handlers::jeq,
            Opcode::Jne => handlers::jne,
        }
    }
}

impl TryFrom<Word> for Opcode {
    /// The unknown byte
    type Error = Word;

    fn try_from(byte: Word) -> Result<Self, Self::Error> {
        match byte {
            0b0000_0001 => Ok(Opcode::Hlt),
            0b1000_0010 => Ok(Opcode::Ldi),
            0b0100_0111 => Ok(Opcode::Prn),
            0b1010_0111 => Ok(Opcode::Cmp),
            0b0101_0100 => Ok(Opcode::Jmp),
            0b0101_0101 => Ok(Opcode::Jeq),
            0b0101_0110 => Ok(Opcode::Jne),
            other => Err(other),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Entry {
    pub opcode: Opcode,
    pub handler: Handler,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entry({})", self.opcode)
    }
}

/// Maps every possible byte to its handler, if any.
///
/// Built once with the machine and never modified.
#[derive(Clone)]
pub(crate) struct DispatchTable {
    entries: [Option<Entry>; MEMORY_SIZE],
}

impl Default for DispatchTable {
    fn default() -> Self {
        let mut entries = [None; MEMORY_SIZE];
        for opcode in Opcode::ALL {
            entries[usize::from(opcode.byte())] = Some(Entry {
                opcode,
                handler: opcode.handler(),
            });
        }
        Self { entries }
    }
}

impl DispatchTable {
    pub fn lookup(&self, byte: Word) -> Option<Entry> {
        self.entries[usize::from(byte)]
    }
}
