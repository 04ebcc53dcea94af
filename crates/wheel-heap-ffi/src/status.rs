//! C-compatible status codes.
//!
//! [`MemStatus`] is a `repr(i32)` enum covering every error the heap can
//! report. Conversions from [`HeapError`] are provided.

use wheel_heap_arena::{HandleFault, HeapError};

/// C-compatible status code returned by status-reporting FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemStatus {
    /// Success.
    Ok = 0,
    /// No free block is large enough.
    OutOfMemory = -1,
    /// A zero-byte allocation was requested.
    ZeroSize = -2,
    /// The pointer does not name an allocation of the heap.
    InvalidPointer = -3,
    /// The pointer names a block that is already free.
    DoubleFree = -4,
    /// A block header failed its integrity check.
    CorruptHeap = -5,
    /// The requested heap configuration is invalid.
    ConfigError = -6,
    /// The heap was already initialised; configuration can no longer change.
    AlreadyInitialized = -7,
    /// An argument is null or otherwise invalid.
    InvalidArgument = -8,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -20,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&HeapError> for MemStatus {
    fn from(e: &HeapError) -> Self {
        match e {
            HeapError::ZeroSizeRequest => MemStatus::ZeroSize,
            HeapError::OutOfMemory { .. } => MemStatus::OutOfMemory,
            HeapError::InvalidRelease { reason, .. } | HeapError::InvalidHandle { reason, .. } => {
                match reason {
                    HandleFault::AlreadyFree => MemStatus::DoubleFree,
                    _ => MemStatus::InvalidPointer,
                }
            }
            HeapError::CorruptHeader { .. } => MemStatus::CorruptHeap,
            HeapError::InvalidConfig { .. } => MemStatus::ConfigError,
        }
    }
}
