//! Arena identity and allocation handles.
//!
//! A [`BlockHandle`] names an allocation by its payload offset. It also
//! records the arena that issued it and that arena's generation, so handles
//! from another arena or from before a [`reset`](crate::HeapArena::reset)
//! are rejected in O(1).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ArenaId`] allocation.
static ARENA_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a [`HeapArena`](crate::HeapArena).
///
/// Two arenas created in the same process never share an ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    /// Allocate a fresh, unique arena ID. Thread-safe.
    pub fn next() -> Self {
        Self(ARENA_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an allocation inside a [`HeapArena`](crate::HeapArena).
///
/// Handles are plain values: copying one does not duplicate the allocation.
/// Each allocation gets its own stamp, recorded in both the handle and the
/// block header, so releasing through a stale copy is rejected even after
/// the same offset has been handed out again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct BlockHandle {
    pub(crate) arena: ArenaId,
    pub(crate) generation: u32,
    pub(crate) offset: u32,
    pub(crate) stamp: u32,
}

impl BlockHandle {
    pub(crate) fn new(arena: ArenaId, generation: u32, offset: u32, stamp: u32) -> Self {
        Self {
            arena,
            generation,
            offset,
            stamp,
        }
    }

    /// Byte offset of the payload from the start of the arena buffer.
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    /// The arena that issued this handle.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    /// Arena generation at the time the handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Stamp of the allocation this handle names.
    pub fn stamp(&self) -> u32 {
        self.stamp
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlockHandle(arena={}, gen={}, off={}, stamp={})",
            self.arena, self.generation, self.offset, self.stamp
        )
    }
}
