//! Heap-specific error types.

use std::error::Error;
use std::fmt;

/// Why a [`BlockHandle`](crate::BlockHandle) was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleFault {
    /// The handle was issued by a different arena.
    ForeignArena,
    /// The handle predates the last [`reset`](crate::HeapArena::reset).
    StaleGeneration,
    /// The payload offset cannot belong to any block of this arena.
    OutOfBounds,
    /// No block header lives immediately before the payload offset.
    NotABlock,
    /// The block is already free (double release or use after release).
    AlreadyFree,
}

impl fmt::Display for HandleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignArena => write!(f, "handle belongs to another arena"),
            Self::StaleGeneration => write!(f, "handle predates the last reset"),
            Self::OutOfBounds => write!(f, "offset outside the arena"),
            Self::NotABlock => write!(f, "offset is not the start of a block payload"),
            Self::AlreadyFree => write!(f, "block is already free"),
        }
    }
}

/// Errors that can occur during heap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// `allocate(0)` was requested. Zero-length allocations are not handed out.
    ZeroSizeRequest,
    /// No free block is large enough for the request.
    OutOfMemory {
        /// Number of payload bytes requested.
        requested: usize,
        /// Payload capacity of the largest free block at the time of the call.
        largest_free: usize,
    },
    /// A release named something other than a live allocated block.
    InvalidRelease {
        /// Payload offset carried by the rejected handle.
        offset: u32,
        /// What the validation found.
        reason: HandleFault,
    },
    /// A payload access named something other than a live allocated block.
    InvalidHandle {
        /// Payload offset carried by the rejected handle.
        offset: u32,
        /// What the validation found.
        reason: HandleFault,
    },
    /// A block header failed its magic, seal, or contiguity check.
    CorruptHeader {
        /// Offset of the damaged header.
        offset: u32,
    },
    /// The arena configuration was rejected.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSizeRequest => write!(f, "zero-size allocation request"),
            Self::OutOfMemory {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, largest free block {largest_free} bytes"
                )
            }
            Self::InvalidRelease { offset, reason } => {
                write!(f, "invalid release at offset {offset}: {reason}")
            }
            Self::InvalidHandle { offset, reason } => {
                write!(f, "invalid handle at offset {offset}: {reason}")
            }
            Self::CorruptHeader { offset } => {
                write!(f, "corrupt block header at offset {offset}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for HeapError {}
