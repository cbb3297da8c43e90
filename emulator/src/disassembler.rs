//! Turn raw program bytes back into a readable listing.

use tracing::trace;

use crate::constants::Word;
use crate::runtime::Instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Instruction(Instruction),

    /// A byte that does not start a valid instruction
    Byte(Word),
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instruction(i) => write!(f, "{i}"),
            Self::Byte(b) => write!(f, ".byte {b:#010b}"),
        }
    }
}

/// One line of the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub address: usize,
    pub item: Item,
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}: {}", self.address, self.item)
    }
}

/// Decode a program linearly, from its first byte to its last.
///
/// Bytes that can't be decoded are emitted one by one, and decoding resumes
/// right after them.
#[must_use]
pub fn disassemble(bytes: &[Word]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut address = 0;

    while address < bytes.len() {
        let rest = &bytes[address..];
        let (item, size) = match Instruction::decode(rest) {
            Ok(instruction) => (Item::Instruction(instruction), instruction.size()),
            Err(error) => {
                trace!(address, %error, "Not an instruction");
                (Item::Byte(rest[0]), 1)
            }
        };

        lines.push(Line { address, item });
        address += size;
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_program;
    use crate::runtime::Reg;
    use pretty_assertions::assert_eq;

    fn listing(bytes: &[Word]) -> String {
        disassemble(bytes)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn disassemble_test() {
        let program = parse_program(include_str!("../../programs/skip.ls8")).unwrap();

        insta::assert_snapshot!(listing(program.bytes()), @r"
        00: ldi  r0, 5
        03: ldi  r1, 5
        06: ldi  r2, 16
        09: cmp  r0, r1
        0c: jeq  r2
        0e: prn  r0
        10: prn  r1
        12: hlt
        ");
    }

    #[test]
    fn data_bytes_test() {
        // An unknown opcode, a truncated `ldi` with an invalid register
        let bytes = [0b1111_0000, 0b0100_0111, 1, 0b1000_0010, 9];
        let lines = disassemble(&bytes);

        assert_eq!(
            lines,
            [
                Line {
                    address: 0,
                    item: Item::Byte(0b1111_0000)
                },
                Line {
                    address: 1,
                    item: Item::Instruction(Instruction::Prn(Reg::R1))
                },
                Line {
                    address: 3,
                    item: Item::Byte(0b1000_0010)
                },
                Line {
                    address: 4,
                    item: Item::Byte(9)
                },
            ]
        );
        assert_eq!(lines[0].to_string(), "00: .byte 0b11110000");
    }

    #[test]
    fn empty_test() {
        assert!(disassemble(&[]).is_empty());
    }
}
