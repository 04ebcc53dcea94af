//! C ABI for the Wheel runtime heap.
//!
//! Exposes the `mem_*` functions that compiled Wheel programs link against.
//! All of them act on one process-wide [`HeapArena`](wheel_heap_arena::HeapArena)
//! that is created lazily on first use and lives until the process exits.
//! The arena sits behind a mutex; every entry point holds the lock for its
//! whole scan/split/splice sequence.
//!
//! Pointers handed to C are the arena's base address plus a payload offset.
//! Pointers coming back are translated to offsets and validated, so a bad
//! `mem_free` is reported instead of corrupting the block list.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run `$body`, converting a panic into `MemStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        ffi_guard_or!($crate::status::MemStatus::Panicked as i32, $body)
    };
}

/// Run `$body`, converting a panic into `$fallback`.
macro_rules! ffi_guard_or {
    ($fallback:expr, $body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(v) => v,
            Err(_) => {
                tracing::error!("panic caught at the C ABI boundary");
                $fallback
            }
        }
    };
}

pub mod heap;
pub mod slot;
pub mod stats;
pub mod status;

pub use stats::MemStats;
pub use status::MemStatus;
