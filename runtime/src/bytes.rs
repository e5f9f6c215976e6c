//! Aligned model buffers
//!
//! Vertex data inside a model must start on a 64-byte boundary. Alignment is
//! validated relative to the start of the file, so the buffer itself has to
//! start on at least that boundary for the in-file alignment to carry over to
//! memory. Buffers are backed by 64-byte blocks to guarantee this.

use std::ops::Deref;

use bytemuck::{Pod, Zeroable};

use crate::error::LoadError;

/// Strongest alignment a [`ModelBytes`] can honour.
pub const MAX_ALIGNMENT: usize = 64;

#[repr(C, align(64))]
#[derive(Clone, Copy)]
struct Block([u8; MAX_ALIGNMENT]);

// SAFETY: Block is #[repr(C)] around a byte array whose size equals its
// alignment, so it has no padding and every bit pattern is valid.
unsafe impl Zeroable for Block {}
unsafe impl Pod for Block {}

/// An immutable, 64-byte aligned model file image.
pub struct ModelBytes {
    blocks: Vec<Block>,
    len: usize,
    alignment: usize,
}

impl ModelBytes {
    /// Allocate `len` zeroed bytes aligned to `alignment`.
    ///
    /// `alignment` must be a power of two no larger than [`MAX_ALIGNMENT`].
    pub fn zeroed(len: usize, alignment: usize) -> Result<Self, LoadError> {
        let failure = || LoadError::AllocationFailure {
            bytes: len,
            alignment,
        };
        if !alignment.is_power_of_two() || alignment > MAX_ALIGNMENT {
            return Err(failure());
        }

        let block_count = len.div_ceil(MAX_ALIGNMENT);
        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(block_count)
            .map_err(|_| failure())?;
        blocks.resize(block_count, Block::zeroed());

        Ok(Self {
            blocks,
            len,
            alignment,
        })
    }

    /// Copy `bytes` into a fresh aligned buffer.
    pub fn copy_from(bytes: &[u8], alignment: usize) -> Result<Self, LoadError> {
        let mut buffer = Self::zeroed(bytes.len(), alignment)?;
        buffer.as_mut_slice().copy_from_slice(bytes);
        Ok(buffer)
    }

    pub fn as_slice(&self) -> &[u8] {
        &bytemuck::cast_slice::<Block, u8>(&self.blocks)[..self.len]
    }

    /// Writable view, used while the buffer is being filled.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.blocks)[..self.len]
    }

    /// Alignment that was requested for this buffer.
    pub fn alignment(&self) -> usize {
        self.alignment
    }
}

impl Deref for ModelBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::fmt::Debug for ModelBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBytes")
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .finish()
    }
}
