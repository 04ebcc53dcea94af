//! The first-fit heap arena.
//!
//! A [`HeapArena`] owns one fixed-size byte buffer. Blocks are threaded
//! through that buffer as a singly linked, address-ordered list: each block
//! is a [`header`](crate::header) followed by its payload, and the header
//! records the offset of the next block.
//!
//! Allocation scans the list from the head and takes the first free block
//! that is large enough, splitting off the tail when the leftover would be
//! big enough to be useful. Release merges forward only: a freed block
//! absorbs its successor if that successor is free, never its predecessor.
//! [`HeapArena::coalesce`] is the separate full pass.

use tracing::{debug, trace};

use crate::config::ArenaConfig;
use crate::error::{HandleFault, HeapError};
use crate::handle::{ArenaId, BlockHandle};
use crate::header::{BlockHeader, HEADER_SIZE};
use crate::stats::HeapStats;

const HEADER: u32 = HEADER_SIZE as u32;

/// Read-only description of one block in the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block header.
    pub offset: usize,
    /// Payload capacity in bytes.
    pub size: usize,
    /// Whether the block is available for allocation.
    pub is_free: bool,
}

impl BlockInfo {
    /// Offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }

    /// Header plus payload bytes.
    pub fn span(&self) -> usize {
        HEADER_SIZE + self.size
    }

    /// Offset one past the last payload byte.
    pub fn end(&self) -> usize {
        self.offset + self.span()
    }
}

/// Address-ordered walk over the block list.
///
/// Stops early at a header that fails to decode or does not point strictly
/// forward; [`HeapArena::validate`] reports such damage.
pub struct Blocks<'a> {
    buf: &'a [u8],
    cursor: Option<u32>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let offset = self.cursor?;
        let Some(header) = BlockHeader::read(self.buf, offset) else {
            self.cursor = None;
            return None;
        };
        self.cursor = header.next.filter(|&next| next > offset);
        Some(BlockInfo {
            offset: offset as usize,
            size: header.size as usize,
            is_free: header.is_free,
        })
    }
}

/// Fixed-capacity heap with first-fit allocation, splitting, and forward
/// coalescing.
///
/// All mutation goes through `&mut self`; share an arena across threads by
/// wrapping the whole value in a lock.
pub struct HeapArena {
    id: ArenaId,
    generation: u32,
    config: ArenaConfig,
    min_block_size: u32,
    buf: Box<[u8]>,
    next_stamp: u32,
    allocation_count: u64,
    release_count: u64,
}

impl HeapArena {
    /// Create an arena and carve it into a single free block.
    pub fn new(config: ArenaConfig) -> Result<Self, HeapError> {
        config.validate()?;
        // validate() caps min_block_size below u32::MAX.
        let min_block_size = config.min_block_size as u32;
        let mut arena = Self {
            id: ArenaId::next(),
            generation: 0,
            buf: vec![0u8; config.capacity].into_boxed_slice(),
            min_block_size,
            config,
            next_stamp: 1,
            allocation_count: 0,
            release_count: 0,
        };
        arena.init_root();
        debug!(
            arena = %arena.id,
            capacity = arena.capacity(),
            min_block_size = arena.min_block_size,
            "heap arena initialised"
        );
        Ok(arena)
    }

    /// Create an arena of `capacity` bytes with the default split threshold.
    pub fn with_capacity(capacity: usize) -> Result<Self, HeapError> {
        Self::new(ArenaConfig::new(capacity))
    }

    fn init_root(&mut self) {
        let size = (self.buf.len() - HEADER_SIZE) as u32;
        BlockHeader::free(size, None).write(&mut self.buf, 0);
    }

    /// This arena's unique identity.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Number of resets since creation.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The configuration the arena was built from.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Size of the backing buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Allocate `size` payload bytes from the first free block that fits.
    ///
    /// The block is split when its payload exceeds
    /// `size + HEADER_SIZE + min_block_size`; otherwise it is handed out
    /// whole and [`block_size`](Self::block_size) may report more than
    /// `size`. On failure the arena is left untouched.
    pub fn allocate(&mut self, size: usize) -> Result<BlockHandle, HeapError> {
        if size == 0 {
            return Err(HeapError::ZeroSizeRequest);
        }

        let mut largest_free = 0usize;
        let mut cursor = Some(0u32);
        while let Some(offset) = cursor {
            let header = self.header_at(offset)?;
            if header.is_free {
                if header.size as usize >= size {
                    // size <= header.size, so it fits in a u32.
                    return Ok(self.claim(offset, header, size as u32));
                }
                largest_free = largest_free.max(header.size as usize);
            }
            cursor = header.next;
        }

        trace!(arena = %self.id, size, largest_free, "allocation failed");
        Err(HeapError::OutOfMemory {
            requested: size,
            largest_free,
        })
    }

    /// Allocate like [`allocate`](Self::allocate) and zero the whole payload.
    pub fn allocate_zeroed(&mut self, size: usize) -> Result<BlockHandle, HeapError> {
        let handle = self.allocate(size)?;
        self.payload_mut(handle)?.fill(0);
        Ok(handle)
    }

    fn claim(&mut self, offset: u32, mut header: BlockHeader, size: u32) -> BlockHandle {
        let threshold = size as u64 + HEADER_SIZE as u64 + self.min_block_size as u64;
        if header.size as u64 > threshold {
            let remainder_offset = offset + HEADER + size;
            let remainder = BlockHeader::free(header.size - size - HEADER, header.next);
            remainder.write(&mut self.buf, remainder_offset);
            trace!(
                arena = %self.id,
                offset,
                size,
                remainder = remainder.size,
                "split free block"
            );
            header.size = size;
            header.next = Some(remainder_offset);
        } else {
            trace!(
                arena = %self.id,
                offset,
                size,
                slack = header.size - size,
                "handed out whole block"
            );
        }

        let stamp = self.next_stamp;
        self.next_stamp = self.next_stamp.wrapping_add(1);
        header.claim(stamp);
        header.write(&mut self.buf, offset);
        self.allocation_count += 1;
        BlockHandle::new(self.id, self.generation, offset + HEADER, stamp)
    }

    /// Return an allocation to the arena.
    ///
    /// The block is marked free and absorbs its immediate successor if that
    /// successor is free. A free predecessor is left alone. Handles that do
    /// not name a live allocation of this arena are rejected with
    /// [`HeapError::InvalidRelease`] and change nothing.
    pub fn release(&mut self, handle: BlockHandle) -> Result<(), HeapError> {
        let (offset, mut header) =
            self.live_block(handle)
                .map_err(|reason| HeapError::InvalidRelease {
                    offset: handle.offset,
                    reason,
                })?;

        header.vacate();
        if let Some(next_offset) = header.next {
            let next = self.header_at(next_offset)?;
            if next.is_free {
                trace!(
                    arena = %self.id,
                    offset,
                    absorbed = next_offset,
                    "merged with free successor"
                );
                header.size += HEADER + next.size;
                header.next = next.next;
                BlockHeader::scrub(&mut self.buf, next_offset);
            }
        }
        header.write(&mut self.buf, offset);
        self.release_count += 1;
        Ok(())
    }

    /// Merge every run of adjacent free blocks into one block.
    ///
    /// Returns the number of merges performed. Used bytes are unchanged.
    pub fn coalesce(&mut self) -> Result<usize, HeapError> {
        let mut merges = 0usize;
        let mut cursor = Some(0u32);
        while let Some(offset) = cursor {
            let mut header = self.header_at(offset)?;
            if header.is_free {
                while let Some(next_offset) = header.next {
                    let next = self.header_at(next_offset)?;
                    if !next.is_free {
                        break;
                    }
                    header.size += HEADER + next.size;
                    header.next = next.next;
                    header.write(&mut self.buf, offset);
                    BlockHeader::scrub(&mut self.buf, next_offset);
                    merges += 1;
                }
            }
            cursor = header.next;
        }
        debug!(arena = %self.id, merges, "coalesce pass complete");
        Ok(merges)
    }

    /// Drop every allocation and return to a single free block.
    ///
    /// Outstanding handles become stale and are rejected afterwards.
    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.generation = self.generation.wrapping_add(1);
        self.allocation_count = 0;
        self.release_count = 0;
        self.init_root();
        debug!(arena = %self.id, generation = self.generation, "heap arena reset");
    }

    /// Header plus payload bytes held by allocated blocks.
    pub fn used_bytes(&self) -> usize {
        self.blocks()
            .filter(|b| !b.is_free)
            .map(|b| b.span())
            .sum()
    }

    /// Header plus payload bytes held by free blocks.
    pub fn free_bytes(&self) -> usize {
        self.blocks().filter(|b| b.is_free).map(|b| b.span()).sum()
    }

    /// Number of blocks in the list.
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// Walk the block list in address order.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            buf: &self.buf,
            cursor: Some(0),
        }
    }

    /// Summarise the current block list.
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            capacity: self.capacity(),
            allocation_count: self.allocation_count,
            release_count: self.release_count,
            ..HeapStats::default()
        };
        for block in self.blocks() {
            stats.total_blocks += 1;
            if block.is_free {
                stats.free_blocks += 1;
                stats.free_bytes += block.span();
                stats.largest_free_block = stats.largest_free_block.max(block.size);
            } else {
                stats.allocated_blocks += 1;
                stats.used_bytes += block.span();
            }
        }
        stats
    }

    /// Payload capacity of a live allocation.
    pub fn block_size(&self, handle: BlockHandle) -> Result<usize, HeapError> {
        let (_, header) = self.checked(handle)?;
        Ok(header.size as usize)
    }

    /// Shared view of an allocation's payload bytes.
    pub fn payload(&self, handle: BlockHandle) -> Result<&[u8], HeapError> {
        let (_, header) = self.checked(handle)?;
        let start = handle.offset as usize;
        Ok(&self.buf[start..start + header.size as usize])
    }

    /// Mutable view of an allocation's payload bytes.
    pub fn payload_mut(&mut self, handle: BlockHandle) -> Result<&mut [u8], HeapError> {
        let (_, header) = self.checked(handle)?;
        let start = handle.offset as usize;
        Ok(&mut self.buf[start..start + header.size as usize])
    }

    /// Build a handle for a payload offset in this arena's current generation.
    ///
    /// The handle adopts the stamp of whatever allocation currently sits at
    /// the offset, so it names that allocation and no earlier one. A raw
    /// offset cannot tell a freed-and-reallocated block from the original;
    /// keep the handles [`allocate`](Self::allocate) returns when that
    /// distinction matters. Nothing else is checked here; the handle is
    /// validated when it is used.
    pub fn handle_at(&self, payload_offset: usize) -> BlockHandle {
        let offset = u32::try_from(payload_offset).unwrap_or(u32::MAX);
        let stamp = offset
            .checked_sub(HEADER)
            .and_then(|header_offset| BlockHeader::read(&self.buf, header_offset))
            .map_or(0, |header| header.stamp);
        BlockHandle::new(self.id, self.generation, offset, stamp)
    }

    /// Base address of the backing buffer.
    ///
    /// The buffer never moves or resizes, so the address stays the same for
    /// the lifetime of the arena. Every later `&mut self` call reborrows the
    /// whole buffer, which invalidates the returned pointer for Rust-side
    /// access; it is meant for handing addresses across the C ABI.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buf.as_mut_ptr()
    }

    /// Check every header's tag, seal, bounds, and contiguity.
    pub fn validate(&self) -> Result<(), HeapError> {
        let capacity = self.buf.len() as u64;
        let mut offset = 0u32;
        loop {
            let header = self.header_at(offset)?;
            let end = header.end(offset);
            match header.next {
                Some(next) if next as u64 == end && end < capacity => offset = next,
                None if end == capacity => return Ok(()),
                _ => return Err(HeapError::CorruptHeader { offset }),
            }
        }
    }

    fn header_at(&self, offset: u32) -> Result<BlockHeader, HeapError> {
        BlockHeader::read(&self.buf, offset).ok_or(HeapError::CorruptHeader { offset })
    }

    fn checked(&self, handle: BlockHandle) -> Result<(u32, BlockHeader), HeapError> {
        self.live_block(handle)
            .map_err(|reason| HeapError::InvalidHandle {
                offset: handle.offset,
                reason,
            })
    }

    /// Resolve a handle to the header of a live allocated block.
    fn live_block(&self, handle: BlockHandle) -> Result<(u32, BlockHeader), HandleFault> {
        if handle.arena != self.id {
            return Err(HandleFault::ForeignArena);
        }
        if handle.generation != self.generation {
            return Err(HandleFault::StaleGeneration);
        }
        let payload = handle.offset as usize;
        if payload < HEADER_SIZE || payload >= self.buf.len() {
            return Err(HandleFault::OutOfBounds);
        }

        let offset = handle.offset - HEADER;
        let header = BlockHeader::read(&self.buf, offset).ok_or(HandleFault::NotABlock)?;
        let end = header.end(offset);
        let capacity = self.buf.len() as u64;
        let contiguous = match header.next {
            Some(next) => next as u64 == end && end < capacity,
            None => end == capacity,
        };
        if !contiguous {
            return Err(HandleFault::NotABlock);
        }
        // A stamp mismatch means the handle's allocation was released and the
        // block has since been handed out again.
        if header.is_free || header.stamp != handle.stamp {
            return Err(HandleFault::AlreadyFree);
        }
        Ok((offset, header))
    }
}

impl std::fmt::Debug for HeapArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapArena")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("capacity", &self.capacity())
            .field("blocks", &self.block_count())
            .finish()
    }
}
