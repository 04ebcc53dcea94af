//! C-compatible heap statistics.

use wheel_heap_arena::HeapStats;

/// C-compatible snapshot of heap usage, filled by `mem_get_stats`.
///
/// Fixed-width `u64` fields for ABI portability (not `usize`).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemStats {
    /// Size of the heap in bytes.
    pub capacity: u64,
    /// Header plus payload bytes of allocated blocks.
    pub used_bytes: u64,
    /// Header plus payload bytes of free blocks.
    pub free_bytes: u64,
    /// Number of blocks in the list.
    pub total_blocks: u64,
    /// Number of allocated blocks.
    pub allocated_blocks: u64,
    /// Number of free blocks.
    pub free_blocks: u64,
    /// Payload capacity of the largest free block.
    pub largest_free_block: u64,
    /// Successful allocations since the heap was created.
    pub allocation_count: u64,
    /// Successful releases since the heap was created.
    pub release_count: u64,
}

impl From<&HeapStats> for MemStats {
    fn from(s: &HeapStats) -> Self {
        Self {
            capacity: s.capacity as u64,
            used_bytes: s.used_bytes as u64,
            free_bytes: s.free_bytes as u64,
            total_blocks: s.total_blocks as u64,
            allocated_blocks: s.allocated_blocks as u64,
            free_blocks: s.free_blocks as u64,
            largest_free_block: s.largest_free_block as u64,
            allocation_count: s.allocation_count,
            release_count: s.release_count,
        }
    }
}
