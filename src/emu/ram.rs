use crate::plat::MEMORY_SIZE;

use super::{EmuError, EmuResult};

/// The main memory of LS-8: a flat array of bytes with no regions or protection.
pub struct Ram {
    memory: Box<[u8]>,
}

impl Ram {
    /// Creates a new [`Ram`] instance, allocating and initializing its memory to [0u8; 256].
    pub fn new() -> Self {
        Self {
            memory: vec![0u8; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Reads the byte at `addr`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `addr` is past the end of memory.
    pub fn read(&self, addr: usize) -> EmuResult<u8> {
        self.memory
            .get(addr)
            .copied()
            .ok_or(EmuError::OutOfRange(addr))
    }

    /// Stores `value` at `addr`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `addr` is past the end of memory.
    pub fn write(&mut self, addr: usize, value: u8) -> EmuResult<()> {
        let cell = self
            .memory
            .get_mut(addr)
            .ok_or(EmuError::OutOfRange(addr))?;
        *cell = value;
        Ok(())
    }

    /// Copies `image` into memory starting at `base`. Nothing is written unless the whole image fits.
    pub fn load(&mut self, base: usize, image: &[u8]) -> EmuResult<()> {
        let end = base.saturating_add(image.len());
        if end > self.memory.len() {
            return Err(EmuError::OutOfRange(base.max(self.memory.len())));
        }
        self.memory[base..end].copy_from_slice(image);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}
