//! Heap usage statistics.

use std::fmt;

/// Point-in-time summary of a [`HeapArena`](crate::HeapArena).
///
/// Byte totals count headers: `used_bytes + free_bytes == capacity`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Size of the backing buffer in bytes.
    pub capacity: usize,
    /// Header plus payload bytes of allocated blocks.
    pub used_bytes: usize,
    /// Header plus payload bytes of free blocks.
    pub free_bytes: usize,
    /// Number of blocks in the list.
    pub total_blocks: usize,
    /// Number of allocated blocks.
    pub allocated_blocks: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Payload capacity of the largest free block.
    pub largest_free_block: usize,
    /// Successful allocations since creation or the last reset.
    pub allocation_count: u64,
    /// Successful releases since creation or the last reset.
    pub release_count: u64,
}

impl HeapStats {
    /// Share of free payload bytes that lie outside the largest free block.
    ///
    /// 0.0 means all free space is one block; values near 1.0 mean the free
    /// space is scattered across many small fragments.
    pub fn fragmentation(&self) -> f64 {
        let free_payload = self
            .free_bytes
            .saturating_sub(self.free_blocks * crate::HEADER_SIZE);
        if free_payload == 0 {
            return 0.0;
        }
        1.0 - self.largest_free_block as f64 / free_payload as f64
    }
}

impl fmt::Display for HeapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} used / {} free of {} bytes ({} blocks: {} allocated, {} free; largest free {})",
            self.used_bytes,
            self.free_bytes,
            self.capacity,
            self.total_blocks,
            self.allocated_blocks,
            self.free_blocks,
            self.largest_free_block
        )
    }
}
