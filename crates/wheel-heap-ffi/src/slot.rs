//! Lazily initialised, lock-protected home for a heap arena.
//!
//! The C ABI keeps exactly one [`HeapSlot`] in a `static`. Tests build their
//! own slots so they never share state with each other or with the global.
//!
//! # Pointer validity
//!
//! Pointers handed to C are `HeapArena::as_mut_ptr` plus a payload offset.
//! The backing buffer is a `Box<[u8]>` that never moves or resizes, so the
//! address stays correct for the life of the arena. The arena still writes
//! headers and payloads through fresh `&mut` borrows of the whole buffer.
//! Under Rust's aliasing model those borrows invalidate the provenance of
//! every pointer already given out, so a Rust-side read or write through a
//! stored `mem_alloc` pointer is undefined behaviour once another `mem_*`
//! call has run (Miri flags it). C callers are outside the model and are
//! unaffected. Rust code should go through `HeapArena` handles instead.

use std::ffi::c_void;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};
use wheel_heap_arena::{ArenaConfig, HeapArena, HeapError};

use crate::stats::MemStats;
use crate::status::MemStatus;

/// A heap arena that is created on first use.
pub struct HeapSlot {
    inner: Mutex<Option<HeapArena>>,
}

impl HeapSlot {
    /// An empty slot. No memory is reserved until first use.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<HeapArena>>, MemStatus> {
        self.inner.lock().map_err(|_| MemStatus::InternalError)
    }

    /// Create the arena with `config` unless it already exists.
    pub fn init_with(&self, config: ArenaConfig) -> Result<(), MemStatus> {
        let mut guard = self.lock()?;
        if guard.is_some() {
            return Err(MemStatus::AlreadyInitialized);
        }
        let arena = HeapArena::new(config).map_err(|e| MemStatus::from(&e))?;
        debug!(capacity = arena.capacity(), "heap slot initialised");
        *guard = Some(arena);
        Ok(())
    }

    /// Whether the arena has been created.
    pub fn is_initialized(&self) -> bool {
        self.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Run `f` on the arena, creating it with the default config first if
    /// needed. The lock is held for the whole call.
    pub fn with<R>(&self, f: impl FnOnce(&mut HeapArena) -> R) -> Result<R, MemStatus> {
        let mut guard = self.lock()?;
        let arena = match guard.as_mut() {
            Some(arena) => arena,
            None => {
                let arena =
                    HeapArena::new(ArenaConfig::default()).map_err(|e| MemStatus::from(&e))?;
                debug!(capacity = arena.capacity(), "heap slot lazily initialised");
                guard.insert(arena)
            }
        };
        Ok(f(arena))
    }

    /// Allocate `size` bytes and return a pointer into the arena.
    pub fn alloc(&self, size: usize, zeroed: bool) -> Result<*mut c_void, MemStatus> {
        self.with(|arena| {
            let result = if zeroed {
                arena.allocate_zeroed(size)
            } else {
                arena.allocate(size)
            };
            let handle = result.map_err(|e| MemStatus::from(&e))?;
            Ok(arena
                .as_mut_ptr()
                .wrapping_add(handle.offset())
                .cast::<c_void>())
        })?
    }

    /// Release the allocation `ptr` points at. Null is a no-op.
    pub fn free(&self, ptr: *mut c_void) -> Result<(), MemStatus> {
        if ptr.is_null() {
            return Ok(());
        }
        self.with(|arena| {
            let base = arena.as_mut_ptr() as usize;
            let offset = (ptr as usize)
                .checked_sub(base)
                .ok_or(MemStatus::InvalidPointer)?;
            let handle = arena.handle_at(offset);
            arena.release(handle).map_err(|e: HeapError| {
                warn!(offset, error = %e, "rejected release");
                MemStatus::from(&e)
            })
        })?
    }

    /// Header plus payload bytes held by allocations.
    pub fn used_bytes(&self) -> Result<usize, MemStatus> {
        self.with(|arena| arena.used_bytes())
    }

    /// Header plus payload bytes available for allocation.
    pub fn free_bytes(&self) -> Result<usize, MemStatus> {
        self.with(|arena| arena.free_bytes())
    }

    /// Snapshot of the arena's statistics.
    pub fn stats(&self) -> Result<MemStats, MemStatus> {
        self.with(|arena| MemStats::from(&arena.stats()))
    }

    /// Run a full coalescing pass; returns the number of merges.
    pub fn coalesce(&self) -> Result<usize, MemStatus> {
        self.with(|arena| arena.coalesce().map_err(|e| MemStatus::from(&e)))?
    }
}

impl Default for HeapSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheel_heap_arena::HEADER_SIZE;

    fn small_slot() -> HeapSlot {
        let slot = HeapSlot::new();
        slot.init_with(ArenaConfig::new(1024)).unwrap();
        slot
    }

    #[test]
    fn first_use_initialises_default_heap() {
        let slot = HeapSlot::new();
        assert!(!slot.is_initialized());
        assert_eq!(slot.free_bytes(), Ok(ArenaConfig::DEFAULT_CAPACITY));
        assert!(slot.is_initialized());
    }

    #[test]
    fn init_is_rejected_after_first_use() {
        let slot = HeapSlot::new();
        slot.used_bytes().unwrap();
        assert_eq!(
            slot.init_with(ArenaConfig::new(4096)),
            Err(MemStatus::AlreadyInitialized)
        );
    }

    #[test]
    fn invalid_config_is_reported() {
        let slot = HeapSlot::new();
        assert_eq!(
            slot.init_with(ArenaConfig::new(4)),
            Err(MemStatus::ConfigError)
        );
        assert!(!slot.is_initialized());
    }

    #[test]
    fn alloc_and_free_roundtrip() {
        let slot = small_slot();
        let ptr = slot.alloc(100, false).unwrap();
        assert!(!ptr.is_null());
        assert_eq!(slot.used_bytes(), Ok(HEADER_SIZE + 100));
        slot.free(ptr).unwrap();
        assert_eq!(slot.used_bytes(), Ok(0));
        assert_eq!(slot.free_bytes(), Ok(1024));
    }

    #[test]
    fn pointers_are_payload_addresses() {
        let slot = small_slot();
        let a = slot.alloc(100, false).unwrap() as usize;
        let b = slot.alloc(50, false).unwrap() as usize;
        assert_eq!(b - a, 100 + HEADER_SIZE);
    }

    #[test]
    fn freed_slot_is_reused_first_fit() {
        let slot = small_slot();
        let a = slot.alloc(100, false).unwrap();
        let _b = slot.alloc(50, false).unwrap();
        slot.free(a).unwrap();
        let c = slot.alloc(90, false).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn zero_size_and_exhaustion_are_errors() {
        let slot = small_slot();
        assert_eq!(slot.alloc(0, false), Err(MemStatus::ZeroSize));
        assert_eq!(slot.alloc(4096, false), Err(MemStatus::OutOfMemory));
        assert_eq!(slot.used_bytes(), Ok(0));
    }

    #[test]
    fn null_free_is_noop() {
        let slot = small_slot();
        assert_eq!(slot.free(std::ptr::null_mut()), Ok(()));
        assert!(slot.is_initialized());
    }

    // Exercises the C-side contract: an address stays usable across later
    // calls. Rust-side access through such a pointer is not sound under the
    // aliasing model, hence the Miri exclusion.
    #[cfg(not(miri))]
    #[test]
    #[allow(unsafe_code)]
    fn pointers_stay_at_their_address_across_calls() {
        let slot = small_slot();
        let a = slot.alloc(16, true).unwrap();
        let b = slot.alloc(16, false).unwrap();
        // SAFETY: a points at a live 16-byte allocation.
        unsafe { a.cast::<u8>().write_bytes(0x5A, 16) };

        slot.free(b).unwrap();
        let c = slot.alloc(200, false).unwrap();
        slot.coalesce().unwrap();

        let a_offset = slot
            .with(|arena| a as usize - arena.as_mut_ptr() as usize)
            .unwrap();
        assert_eq!(a_offset, HEADER_SIZE);
        let bytes = slot
            .with(|arena| arena.payload(arena.handle_at(a_offset)).unwrap().to_vec())
            .unwrap();
        assert_eq!(bytes, vec![0x5A; 16]);
        slot.free(c).unwrap();
        slot.free(a).unwrap();
    }

    #[test]
    fn stale_pointer_after_reuse_names_the_new_allocation() {
        let slot = small_slot();
        let a = slot.alloc(64, false).unwrap();
        let _guard = slot.alloc(64, false).unwrap();
        slot.free(a).unwrap();
        let b = slot.alloc(64, false).unwrap();
        assert_eq!(a, b);
        // A raw address cannot distinguish the two owners; the pointer
        // releases whatever allocation lives there now, exactly once.
        assert_eq!(slot.free(a), Ok(()));
        assert_eq!(slot.free(b), Err(MemStatus::DoubleFree));
    }

    #[test]
    fn double_free_is_detected() {
        let slot = small_slot();
        let a = slot.alloc(64, false).unwrap();
        let _b = slot.alloc(64, false).unwrap();
        slot.free(a).unwrap();
        assert_eq!(slot.free(a), Err(MemStatus::DoubleFree));
    }

    #[test]
    fn foreign_pointers_are_rejected() {
        let slot = small_slot();
        let a = slot.alloc(64, false).unwrap();
        let mut local = 0u64;
        let stack_ptr = (&mut local as *mut u64).cast::<c_void>();
        assert_eq!(slot.free(stack_ptr), Err(MemStatus::InvalidPointer));
        let interior = (a as *mut u8).wrapping_add(3).cast::<c_void>();
        assert_eq!(slot.free(interior), Err(MemStatus::InvalidPointer));
        assert_eq!(slot.used_bytes(), Ok(HEADER_SIZE + 64));
    }

    #[test]
    fn stats_and_coalesce() {
        let slot = small_slot();
        let a = slot.alloc(64, false).unwrap();
        let b = slot.alloc(64, false).unwrap();
        let _c = slot.alloc(64, false).unwrap();
        slot.free(a).unwrap();
        slot.free(b).unwrap();

        let stats = slot.stats().unwrap();
        assert_eq!(stats.free_blocks, 3);
        assert_eq!(stats.allocated_blocks, 1);
        assert_eq!(stats.used_bytes + stats.free_bytes, 1024);

        assert_eq!(slot.coalesce(), Ok(1));
        assert_eq!(slot.stats().unwrap().free_blocks, 2);
    }

    #[test]
    fn zeroed_alloc_clears_reused_memory() {
        let slot = small_slot();
        let a = slot.alloc(32, false).unwrap();
        let _guard = slot.alloc(32, false).unwrap();
        slot.with(|arena| {
            let handle = arena.handle_at(HEADER_SIZE);
            arena.payload_mut(handle).unwrap().fill(0xCD);
        })
        .unwrap();
        slot.free(a).unwrap();

        let z = slot.alloc(32, true).unwrap();
        assert_eq!(z, a);
        let all_zero = slot
            .with(|arena| {
                let handle = arena.handle_at(HEADER_SIZE);
                arena.payload(handle).unwrap().iter().all(|&b| b == 0)
            })
            .unwrap();
        assert!(all_zero);
    }
}
