use thiserror::Error;

use crate::constants::{Word, MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The given address was out of bounds
    #[error("invalid address {0:#04x}")]
    InvalidAddress(usize),

    /// A bulk load would overflow the memory
    #[error("{size} bytes do not fit at address {start:#04x} ({available} bytes available)")]
    ProgramTooLarge {
        start: usize,
        size: usize,
        available: usize,
    },
}

/// Holds the memory cells of the computer.
///
/// It has 256 byte cells, all zeroed on startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: [Word; MEMORY_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: [0; MEMORY_SIZE],
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.inner.iter().filter(|cell| **cell != 0).count();
        f.debug_struct("Memory")
            .field("non_zero_cells", &used)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

impl Memory {
    /// Read the cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn read(&self, address: usize) -> Result<Word, MemoryError> {
        self.inner
            .get(address)
            .copied()
            .ok_or(MemoryError::InvalidAddress(address))
    }

    /// Write a value in the cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn write(&mut self, address: usize, value: Word) -> Result<(), MemoryError> {
        let cell = self
            .inner
            .get_mut(address)
            .ok_or(MemoryError::InvalidAddress(address))?;
        *cell = value;
        Ok(())
    }

    /// Copy a contiguous block of bytes in memory, starting at `start`
    ///
    /// # Errors
    ///
    /// It fails if `start` is past the end of the memory, or if the block does
    /// not fit, in which case the memory is left untouched.
    pub fn load(&mut self, start: usize, bytes: &[Word]) -> Result<(), MemoryError> {
        if start > MEMORY_SIZE {
            return Err(MemoryError::InvalidAddress(start));
        }

        let available = MEMORY_SIZE.saturating_sub(start);
        if bytes.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                start,
                size: bytes.len(),
                available,
            });
        }

        self.inner[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Get a view of up to `count` cells starting at `start`.
    ///
    /// The view is cut at the end of the memory.
    #[must_use]
    pub fn dump(&self, start: usize, count: usize) -> &[Word] {
        let start = start.min(MEMORY_SIZE);
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        &self.inner[start..end]
    }
}
