//! Heap lifecycle FFI: init, alloc, free, usage queries.
//!
//! Every function lazily creates the global heap with the default config
//! (1 MiB) if nothing has been set up yet, so callers never observe an
//! uninitialised heap. `mem_init_with_capacity` is the only way to choose a
//! different size and must run before any other call.

use std::ffi::c_void;

use tracing::warn;
use wheel_heap_arena::ArenaConfig;

use crate::slot::HeapSlot;
use crate::stats::MemStats;
use crate::status::MemStatus;

static HEAP: HeapSlot = HeapSlot::new();

fn status_of(result: Result<(), MemStatus>) -> i32 {
    match result {
        Ok(()) => MemStatus::Ok as i32,
        Err(status) => status as i32,
    }
}

/// Initialise the heap with the default capacity. Idempotent.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_init() {
    ffi_guard_or!((), {
        if let Err(status) = HEAP.with(|_| ()) {
            warn!(?status, "heap initialisation failed");
        }
    })
}

/// Initialise the heap with `capacity` bytes.
///
/// Returns `AlreadyInitialized` if the heap exists (including implicit
/// creation by an earlier call), `ConfigError` if the capacity is unusable.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_init_with_capacity(capacity: usize) -> i32 {
    ffi_guard!({ status_of(HEAP.init_with(ArenaConfig::new(capacity))) })
}

/// Allocate `size` bytes. Returns null for a zero size or when no free block
/// is large enough.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_alloc(size: usize) -> *mut c_void {
    ffi_guard_or!(std::ptr::null_mut(), {
        HEAP.alloc(size, false).unwrap_or(std::ptr::null_mut())
    })
}

/// Allocate `size` zeroed bytes. Returns null on failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_calloc(size: usize) -> *mut c_void {
    ffi_guard_or!(std::ptr::null_mut(), {
        HEAP.alloc(size, true).unwrap_or(std::ptr::null_mut())
    })
}

/// Release a pointer returned by `mem_alloc`/`mem_calloc`.
///
/// Null is a no-op. Pointers that do not name a live allocation are logged
/// and ignored; use `mem_free_checked` to observe the failure.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_free(ptr: *mut c_void) {
    ffi_guard_or!((), {
        if let Err(status) = HEAP.free(ptr) {
            warn!(?status, "mem_free ignored an invalid pointer");
        }
    })
}

/// Release a pointer and report the outcome as a status code.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_free_checked(ptr: *mut c_void) -> i32 {
    ffi_guard!({ status_of(HEAP.free(ptr)) })
}

/// Header plus payload bytes currently allocated. 0 on internal error.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_get_used() -> usize {
    ffi_guard_or!(0, { HEAP.used_bytes().unwrap_or(0) })
}

/// Header plus payload bytes currently free. 0 on internal error.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_get_free() -> usize {
    ffi_guard_or!(0, { HEAP.free_bytes().unwrap_or(0) })
}

/// Write a statistics snapshot to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_get_stats(out: *mut MemStats) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return MemStatus::InvalidArgument as i32;
        }
        match HEAP.stats() {
            Ok(stats) => {
                // SAFETY: out is non-null and valid for writes per caller contract.
                unsafe { out.write(stats) };
                MemStatus::Ok as i32
            }
            Err(status) => status as i32,
        }
    })
}

/// Merge every run of adjacent free blocks. Returns the number of merges,
/// or 0 on error.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn mem_coalesce() -> usize {
    ffi_guard_or!(0, { HEAP.coalesce().unwrap_or(0) })
}
