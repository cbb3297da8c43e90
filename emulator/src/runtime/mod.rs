use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{self as C, Address, Word};

mod alu;
mod dispatch;
mod instructions;
mod memory;
mod output;
mod registers;

pub use self::alu::{AluOp, UnsupportedOperation};
pub use self::dispatch::Opcode;
pub use self::instructions::{DecodeError, Instruction};
pub use self::memory::{Memory, MemoryError};
pub use self::output::{Captured, Output, WriteOutput};
pub use self::registers::{Flags, Reg, RegisterError, Registers};

use self::dispatch::DispatchTable;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("invalid memory access: {0}")]
    InvalidAddress(#[from] MemoryError),

    #[error(transparent)]
    InvalidRegister(#[from] RegisterError),

    #[error("unknown opcode {opcode:#010b} ({opcode}) at address {address:#04x}")]
    UnknownOpcode { opcode: Word, address: Address },

    #[error("could not write output")]
    Output(#[source] std::io::Error),

    #[error("program did not halt after {steps} steps")]
    StepLimitExceeded { steps: u64 },

    #[error("the computer is halted")]
    Halted,
}

type Result<T> = std::result::Result<T, ProcessorError>;

/// Where execution goes after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Continue at the given address
    Next(Address),

    /// Stop the computer. %pc is reset to the start of the program.
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Running,
    Halted,
}

#[derive(Default, Clone)]
pub struct Computer {
    pub registers: Registers,
    pub memory: Memory,
    pub cycles: u64,
    state: State,
    dispatch: DispatchTable,
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ registers: {:?}, state: {:?}, memory: [...] }}",
            self.registers, self.state
        )
    }
}

impl Computer {
    /// Build a computer with a program loaded at the start of the memory
    ///
    /// # Errors
    ///
    /// Fails if the program does not fit in memory.
    pub fn with_program(bytes: &[Word]) -> std::result::Result<Self, MemoryError> {
        let mut computer = Self::default();
        computer.memory.load(C::PROGRAM_START.into(), bytes)?;
        Ok(computer)
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Read the operand byte at `%pc + offset`
    fn operand(&self, offset: usize) -> Result<Word> {
        let address = usize::from(self.registers.pc) + offset;
        Ok(self.memory.read(address)?)
    }

    /// Read the operand byte at `%pc + offset` as a register index
    fn register_operand(&self, offset: usize) -> Result<Reg> {
        Ok(Reg::try_from(self.operand(offset)?)?)
    }

    /// Move on to the instruction following the current one
    fn advance(&self, opcode: Opcode) -> Result<Transition> {
        let next = usize::from(self.registers.pc) + opcode.size();
        Address::try_from(next)
            .map(Transition::Next)
            .map_err(|_| MemoryError::InvalidAddress(next).into())
    }

    fn jump_to(&self, reg: Reg) -> Transition {
        let address = self.registers.get(reg);
        debug!("Jumping to address {:#04x}", address);
        Transition::Next(address)
    }

    fn execute_next(&mut self, output: &mut dyn Output) -> Result<()> {
        let address = self.registers.pc;
        let opcode = self.memory.read(address.into())?;
        let entry = self
            .dispatch
            .lookup(opcode)
            .ok_or(ProcessorError::UnknownOpcode { opcode, address })?;

        debug!(pc = address, "Executing instruction \"{}\"", entry.opcode);
        match (entry.handler)(self, output)? {
            Transition::Next(pc) => self.registers.pc = pc,
            Transition::Halt => {
                info!(cycles = self.cycles + 1, "Halting");
                self.registers.pc = C::PROGRAM_START;
                self.state = State::Halted;
            }
        }

        self.cycles += 1;
        Ok(())
    }

    /// Execute one instruction.
    ///
    /// Any error is fatal: the computer stops and refuses to step again.
    ///
    /// # Errors
    ///
    /// Fails on invalid memory accesses, unknown opcodes, invalid register
    /// operands, if the output fails, or if the computer is already halted.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn step(&mut self, output: &mut dyn Output) -> Result<()> {
        if !self.is_running() {
            return Err(ProcessorError::Halted);
        }

        let res = self.execute_next(output);
        if res.is_err() {
            self.state = State::Halted;
        }
        debug!("Register state {:?}", self.registers);
        res
    }

    /// Run until the program halts, calling `inspect` before each
    /// instruction.
    ///
    /// # Errors
    ///
    /// Fails with [`ProcessorError::StepLimitExceeded`] if `max_steps`
    /// instructions ran without halting, or with any error from
    /// [`Computer::step`].
    #[tracing::instrument(skip(self, output, inspect))]
    pub fn run_with<F>(
        &mut self,
        output: &mut dyn Output,
        max_steps: Option<u64>,
        mut inspect: F,
    ) -> Result<()>
    where
        F: FnMut(&Self),
    {
        let mut steps = 0;
        while self.is_running() {
            if max_steps.is_some_and(|max| steps >= max) {
                self.state = State::Halted;
                return Err(ProcessorError::StepLimitExceeded { steps });
            }

            inspect(self);
            self.step(output)?;
            steps += 1;
        }
        Ok(())
    }

    /// Run until the program halts.
    ///
    /// There is no limit: a program that never halts runs forever.
    ///
    /// # Errors
    ///
    /// Fails with any error from [`Computer::step`].
    pub fn run(&mut self, output: &mut dyn Output) -> Result<()> {
        self.run_with(output, None, |_| {})
    }

    /// Run at most `max_steps` instructions.
    ///
    /// # Errors
    ///
    /// See [`Computer::run_with`].
    pub fn run_with_limit(&mut self, output: &mut dyn Output, max_steps: u64) -> Result<()> {
        self.run_with(output, Some(max_steps), |_| {})
    }

    /// One line summary of the computer state: the program counter, the
    /// next three bytes of memory and all the registers, in hexadecimal.
    #[must_use]
    pub fn trace(&self) -> String {
        let pc = usize::from(self.registers.pc);
        let cell = |offset: usize| {
            self.memory
                .read(pc + offset)
                .map_or_else(|_| "--".to_owned(), |byte| format!("{byte:02X}"))
        };
        let registers: String = self
            .registers
            .gp
            .iter()
            .map(|value| format!(" {value:02X}"))
            .collect();

        format!(
            "TRACE: {pc:02X} | {} {} {} |{registers}",
            cell(0),
            cell(1),
            cell(2)
        )
    }
}
