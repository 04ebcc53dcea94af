//! Wheel heap: a first-fit allocator over a fixed-size byte arena.
//!
//! This is the top-level facade crate. It re-exports the arena crate and a
//! [`prelude`] with the types most callers need.
//!
//! # Quick start
//!
//! ```rust
//! use wheel_heap::prelude::*;
//!
//! let mut heap = HeapArena::new(ArenaConfig::new(1024)).unwrap();
//! let a = heap.allocate(100).unwrap();
//! let b = heap.allocate(50).unwrap();
//! heap.payload_mut(b).unwrap().fill(7);
//!
//! heap.release(a).unwrap();
//! let c = heap.allocate(90).unwrap();
//! assert_eq!(c.offset(), a.offset());
//!
//! let stats = heap.stats();
//! assert_eq!(stats.used_bytes + stats.free_bytes, 1024);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `wheel-heap-arena` | `HeapArena`, handles, headers, stats, errors |
//!
//! The C ABI lives in the separate `wheel-heap-ffi` crate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Heap arena, block handles and statistics (`wheel-heap-arena`).
pub use wheel_heap_arena as arena;

/// Common imports for typical heap usage.
///
/// ```rust
/// use wheel_heap::prelude::*;
/// ```
pub mod prelude {
    pub use wheel_heap_arena::{
        ArenaConfig, BlockHandle, BlockInfo, HeapArena, HeapError, HeapStats, HEADER_SIZE,
    };
}
