//! Arena configuration parameters.

use crate::error::HeapError;
use crate::header::HEADER_SIZE;

/// Configuration for a [`HeapArena`](crate::HeapArena).
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total size of the backing buffer in bytes, headers included.
    ///
    /// Default: 1 MiB. Must exceed one header and stay below `u32::MAX`,
    /// since blocks are addressed by `u32` offsets.
    pub capacity: usize,

    /// Smallest payload a split remainder may carry.
    ///
    /// A free block is only split when its payload exceeds
    /// `request + HEADER_SIZE + min_block_size`. Default: 32.
    pub min_block_size: usize,
}

impl ArenaConfig {
    /// Default arena capacity: 1 MiB.
    pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

    /// Default split remainder threshold in bytes.
    pub const DEFAULT_MIN_BLOCK_SIZE: usize = 32;

    /// Largest supported capacity.
    pub const MAX_CAPACITY: usize = u32::MAX as usize - 1;

    /// Create a config for the given capacity with the default split threshold.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            min_block_size: Self::DEFAULT_MIN_BLOCK_SIZE,
        }
    }

    /// Override the split remainder threshold.
    pub fn with_min_block_size(mut self, min_block_size: usize) -> Self {
        self.min_block_size = min_block_size;
        self
    }

    /// Check that the config describes a usable arena.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.capacity <= HEADER_SIZE {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "capacity {} must exceed the {HEADER_SIZE}-byte block header",
                    self.capacity
                ),
            });
        }
        if self.capacity > Self::MAX_CAPACITY {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "capacity {} exceeds the maximum of {}",
                    self.capacity,
                    Self::MAX_CAPACITY
                ),
            });
        }
        if self.min_block_size > Self::MAX_CAPACITY {
            return Err(HeapError::InvalidConfig {
                reason: format!("min_block_size {} is too large", self.min_block_size),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
