//! Fixed-capacity first-fit heap arena for the Wheel runtime.
//!
//! A [`HeapArena`] manages one byte buffer as an address-ordered list of
//! blocks. Each block is a 16-byte header stored inside the buffer followed
//! by its payload.
//!
//! # Architecture
//!
//! ```text
//! HeapArena
//! ├── Box<[u8]>             backing buffer, never resized
//! │   └── [header|payload][header|payload]...   singly linked by offset
//! ├── ArenaId + generation  stamped into every BlockHandle
//! └── ArenaConfig           capacity and split threshold
//! ```
//!
//! # Allocation policy
//!
//! - **First fit:** the scan starts at offset 0 and takes the first free
//!   block whose payload is large enough.
//! - **Split:** a block is split only when the leftover payload would exceed
//!   `HEADER_SIZE + min_block_size`; smaller leftovers stay inside the
//!   allocation as slack.
//! - **Forward merge:** [`HeapArena::release`] absorbs the next block if it
//!   is free. Free predecessors are only merged by [`HeapArena::coalesce`].
//!
//! # Release validation
//!
//! Releases are checked against the issuing arena, its generation, the
//! header seal, block contiguity, and the per-allocation stamp carried by
//! every [`BlockHandle`]. Invalid and double releases, including a stale
//! copy of a handle whose block was reallocated, return
//! [`HeapError::InvalidRelease`] instead of corrupting the list.
//!
//! # Example
//!
//! ```rust
//! use wheel_heap_arena::{ArenaConfig, HeapArena};
//!
//! let mut heap = HeapArena::new(ArenaConfig::new(1024)).unwrap();
//! let a = heap.allocate(100).unwrap();
//! heap.payload_mut(a).unwrap()[0] = 7;
//! assert_eq!(heap.used_bytes() + heap.free_bytes(), heap.capacity());
//! heap.release(a).unwrap();
//! assert!(heap.release(a).is_err());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod handle;
pub mod header;
pub mod heap;
pub mod stats;

// Public re-exports for the primary API surface.
pub use config::ArenaConfig;
pub use error::{HandleFault, HeapError};
pub use handle::{ArenaId, BlockHandle};
pub use header::HEADER_SIZE;
pub use heap::{BlockInfo, Blocks, HeapArena};
pub use stats::HeapStats;
