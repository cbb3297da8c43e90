use parse_display::Display;
use thiserror::Error;
use tracing::debug;

use crate::constants::Word;

use super::{
    alu::AluOp,
    dispatch::Opcode,
    registers::{Flags, Reg, RegisterError},
    Computer, Output, ProcessorError, Transition,
};

type Result<T> = std::result::Result<T, ProcessorError>;

/// Stop the machine
pub(super) fn hlt(_computer: &mut Computer, _output: &mut dyn Output) -> Result<Transition> {
    Ok(Transition::Halt)
}

/// `reg[op1] = op2`
pub(super) fn ldi(computer: &mut Computer, _output: &mut dyn Output) -> Result<Transition> {
    let reg = computer.register_operand(1)?;
    let value = computer.operand(2)?;
    debug!("{} <- {}", reg, value);
    computer.registers.set(reg, value);
    computer.advance(Opcode::Ldi)
}

/// Emit `reg[op1]`
pub(super) fn prn(computer: &mut Computer, output: &mut dyn Output) -> Result<Transition> {
    let reg = computer.register_operand(1)?;
    let value = computer.registers.get(reg);
    debug!("Printing {} = {}", reg, value);
    output.emit(value).map_err(ProcessorError::Output)?;
    computer.advance(Opcode::Prn)
}

/// Compare `reg[op1]` with `reg[op2]`
pub(super) fn cmp(computer: &mut Computer, _output: &mut dyn Output) -> Result<Transition> {
    let a = computer.register_operand(1)?;
    let b = computer.register_operand(2)?;
    computer.registers.alu(AluOp::Cmp, a, b);
    computer.advance(Opcode::Cmp)
}

/// Jump to the address held by `reg[op1]`
pub(super) fn jmp(computer: &mut Computer, _output: &mut dyn Output) -> Result<Transition> {
    let reg = computer.register_operand(1)?;
    Ok(computer.jump_to(reg))
}

pub(super) fn jeq(computer: &mut Computer, _output: &mut dyn Output) -> Result<Transition> {
    let reg = computer.register_operand(1)?;
    if computer.registers.fl.contains(Flags::EQUAL) {
        Ok(computer.jump_to(reg))
    } else {
        computer.advance(Opcode::Jeq)
    }
}

pub(super) fn jne(computer: &mut Computer, _output: &mut dyn Output) -> Result<Transition> {
    let reg = computer.register_operand(1)?;
    if computer.registers.fl.contains(Flags::EQUAL) {
        computer.advance(Opcode::Jne)
    } else {
        Ok(computer.jump_to(reg))
    }
}

/// A fully decoded instruction, with its operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Instruction {
    #[display("hlt")]
    Hlt,

    #[display("ldi  {0}, {1}")]
    Ldi(Reg, Word),

    #[display("prn  {0}")]
    Prn(Reg),

    #[display("cmp  {0}, {1}")]
    Cmp(Reg, Reg),

    #[display("jmp  {0}")]
    Jmp(Reg),

    #[display("jeq  {0}")]
    Jeq(Reg),

    #[display("jne  {0}")]
    Jne(Reg),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("nothing to decode")]
    Empty,

    #[error("unknown opcode {0:#010b}")]
    UnknownOpcode(Word),

    #[error("truncated {0} instruction")]
    Truncated(Opcode),

    #[error(transparent)]
    InvalidRegister(#[from] RegisterError),
}

impl Instruction {
    /// Decode the instruction at the beginning of `bytes`
    ///
    /// # Errors
    ///
    /// Fails if the opcode is unknown, if some operands are missing or if a
    /// register operand is out of range.
    pub fn decode(bytes: &[Word]) -> std::result::Result<Self, DecodeError> {
        let (&byte, rest) = bytes.split_first().ok_or(DecodeError::Empty)?;
        let opcode = Opcode::try_from(byte).map_err(DecodeError::UnknownOpcode)?;
        let operands = rest
            .get(..opcode.operand_count())
            .ok_or(DecodeError::Truncated(opcode))?;
        let reg = |index: usize| Reg::try_from(operands[index]);

        let instruction = match opcode {
            Opcode::Hlt => Self::Hlt,
            Opcode::Ldi => Self::Ldi(reg(0)?, operands[1]),
            Opcode::Prn => Self::Prn(reg(0)?),
            Opcode::Cmp => Self::Cmp(reg(0)?, reg(1)?),
            Opcode::Jmp => Self::Jmp(reg(0)?),
            Opcode::Jeq => Self::Jeq(reg(0)?),
            Opcode::Jne => Self::Jne(reg(0)?),
        };
        Ok(instruction)
    }

    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Hlt => Opcode::Hlt,
            Self::Ldi(..) => Opcode::Ldi,
            Self::Prn(_) => Opcode::Prn,
            Self::Cmp(..) => Opcode::Cmp,
            Self::Jmp(_) => Opcode::Jmp,
            Self::Jeq(_) => Opcode::Jeq,
            Self::Jne(_) => Opcode::Jne,
        }
    }

    /// Length of the instruction, in bytes
    #[must_use]
    pub const fn size(&self) -> usize {
        self.opcode().size()
    }

    /// Encode the instruction back to bytes
    #[must_use]
    pub fn encode(&self) -> Vec<Word> {
        let mut bytes = vec![self.opcode().byte()];
        match *self {
            Self::Hlt => {}
            Self::Ldi(reg, value) => bytes.extend([reg.into(), value]),
            Self::Cmp(a, b) => bytes.extend([Word::from(a), Word::from(b)]),
            Self::Prn(reg) | Self::Jmp(reg) | Self::Jeq(reg) | Self::Jne(reg) => {
                bytes.push(reg.into());
            }
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Captured;
    use pretty_assertions::assert_eq;

    /// Build a computer with the given program at address 0
    fn computer(program: &[Instruction]) -> Computer {
        let bytes: Vec<_> = program.iter().flat_map(Instruction::encode).collect();
        Computer::with_program(&bytes).unwrap()
    }

    #[test]
    fn ldi_test() {
        let mut computer = computer(&[Instruction::Ldi(Reg::R4, 0xAB)]);
        computer.step(&mut Captured::default()).unwrap();

        assert_eq!(computer.registers.get(Reg::R4), 0xAB);
        assert_eq!(computer.registers.pc, 3);
    }

    #[test]
    fn prn_test() {
        let mut output = Captured::default();
        let mut computer = computer(&[Instruction::Prn(Reg::R2)]);
        computer.registers.set(Reg::R2, 200);
        computer.step(&mut output).unwrap();

        assert_eq!(output.values(), &[200]);
        assert_eq!(computer.registers.pc, 2);
    }

    #[test]
    fn cmp_test() {
        let mut computer = computer(&[Instruction::Cmp(Reg::R0, Reg::R1)]);
        computer.registers.set(Reg::R0, 3);
        computer.registers.set(Reg::R1, 9);
        computer.step(&mut Captured::default()).unwrap();

        assert_eq!(computer.registers.fl, Flags::LESS);
        assert_eq!(computer.registers.pc, 3);
    }

    #[test]
    fn jmp_ignores_flags_test() {
        for flags in [Flags::empty(), Flags::EQUAL, Flags::LESS, Flags::GREATER] {
            let mut computer = computer(&[Instruction::Jmp(Reg::R5)]);
            computer.registers.set(Reg::R5, 0x80);
            computer.registers.fl = flags;
            computer.step(&mut Captured::default()).unwrap();

            assert_eq!(computer.registers.pc, 0x80);
        }
    }

    #[test]
    fn conditional_jumps_test() {
        let cases = [
            // (instruction, flags, expected pc)
            (Instruction::Jeq(Reg::R1), Flags::EQUAL, 0x40),
            (Instruction::Jeq(Reg::R1), Flags::LESS, 2),
            (Instruction::Jeq(Reg::R1), Flags::GREATER, 2),
            (Instruction::Jeq(Reg::R1), Flags::empty(), 2),
            (Instruction::Jne(Reg::R1), Flags::EQUAL, 2),
            (Instruction::Jne(Reg::R1), Flags::LESS, 0x40),
            (Instruction::Jne(Reg::R1), Flags::GREATER, 0x40),
            (Instruction::Jne(Reg::R1), Flags::empty(), 0x40),
        ];

        for (instruction, flags, pc) in cases {
            let mut computer = computer(&[instruction]);
            computer.registers.set(Reg::R1, 0x40);
            computer.registers.fl = flags;
            computer.step(&mut Captured::default()).unwrap();

            assert_eq!(computer.registers.pc, pc, "{instruction} with {flags:?}");
            // Jumps never touch the flags
            assert_eq!(computer.registers.fl, flags);
        }
    }

    #[test]
    fn hlt_resets_pc_test() {
        let mut computer = Computer::default();
        computer.registers.pc = 0x20;
        computer.memory.write(0x20, Opcode::Hlt.byte()).unwrap();
        computer.step(&mut Captured::default()).unwrap();

        assert_eq!(computer.registers.pc, 0);
        assert!(!computer.is_running());
    }

    #[test]
    fn invalid_register_operand_test() {
        let mut computer = Computer::with_program(&[Opcode::Prn.byte(), 8]).unwrap();
        let err = computer.step(&mut Captured::default()).unwrap_err();

        assert!(matches!(
            err,
            ProcessorError::InvalidRegister(RegisterError::InvalidRegister(8))
        ));
        assert_eq!(computer.registers.pc, 0);
    }

    #[test]
    fn decode_test() {
        assert_eq!(Instruction::decode(&[0b0000_0001]), Ok(Instruction::Hlt));
        assert_eq!(
            Instruction::decode(&[0b1000_0010, 3, 42, 0xFF]),
            Ok(Instruction::Ldi(Reg::R3, 42))
        );
        assert_eq!(
            Instruction::decode(&[0b1010_0111, 0, 7]),
            Ok(Instruction::Cmp(Reg::R0, Reg::R7))
        );
        assert_eq!(
            Instruction::decode(&[0b0101_0110, 2]),
            Ok(Instruction::Jne(Reg::R2))
        );
    }

    #[test]
    fn decode_errors_test() {
        assert_eq!(Instruction::decode(&[]), Err(DecodeError::Empty));
        assert_eq!(
            Instruction::decode(&[0xFF]),
            Err(DecodeError::UnknownOpcode(0xFF))
        );
        assert_eq!(
            Instruction::decode(&[0b1000_0010, 1]),
            Err(DecodeError::Truncated(Opcode::Ldi))
        );
        assert_eq!(
            Instruction::decode(&[0b0100_0111, 9]),
            Err(DecodeError::InvalidRegister(RegisterError::InvalidRegister(
                9
            )))
        );
    }

    #[test]
    fn encode_test() {
        let program = [
            Instruction::Ldi(Reg::R0, 5),
            Instruction::Prn(Reg::R0),
            Instruction::Cmp(Reg::R1, Reg::R2),
            Instruction::Hlt,
        ];
        let bytes: Vec<_> = program.iter().flat_map(Instruction::encode).collect();
        assert_eq!(
            bytes,
            [
                0b1000_0010,
                0,
                5,
                0b0100_0111,
                0,
                0b1010_0111,
                1,
                2,
                0b0000_0001,
            ]
        );

        for instruction in program {
            assert_eq!(instruction.encode().len(), instruction.size());
        }
    }

    #[test]
    fn display_test() {
        assert_eq!(Instruction::Hlt.to_string(), "hlt");
        assert_eq!(Instruction::Ldi(Reg::R1, 200).to_string(), "ldi  r1, 200");
        assert_eq!(
            Instruction::Cmp(Reg::R0, Reg::R1).to_string(),
            "cmp  r0, r1"
        );
        assert_eq!(Instruction::Jeq(Reg::R2).to_string(), "jeq  r2");
    }
}
