use std::io::Write;

use crate::constants::Word;

/// Receives the values printed by the running program
pub trait Output {
    /// Emit one value
    ///
    /// # Errors
    ///
    /// Fails if the value could not be delivered.
    fn emit(&mut self, value: Word) -> std::io::Result<()>;
}

/// Keeps every emitted value in memory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    values: Vec<Word>,
}

impl Captured {
    #[must_use]
    pub fn values(&self) -> &[Word] {
        &self.values
    }
}

impl Output for Captured {
    fn emit(&mut self, value: Word) -> std::io::Result<()> {
        self.values.push(value);
        Ok(())
    }
}

/// Writes each value in decimal on its own line
#[derive(Debug)]
pub struct WriteOutput<W> {
    inner: W,
}

impl<W: Write> WriteOutput<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Output for WriteOutput<W> {
    fn emit(&mut self, value: Word) -> std::io::Result<()> {
        writeln!(self.inner, "{value}")
    }
}
