//! Scripted heap workloads.
//!
//! A script is a slice of [`HeapOp`]s that name allocations by slot number,
//! so the same script can be replayed against any arena and the outcome
//! compared.

use indexmap::IndexMap;
use wheel_heap_arena::{BlockHandle, HeapArena};

use crate::assert_heap_consistent;

/// One step of a scripted workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapOp {
    /// Allocate `size` bytes and remember the handle under `slot`.
    ///
    /// If the slot already holds an allocation, that allocation is released
    /// first.
    Alloc { slot: u32, size: usize },
    /// Release the allocation remembered under `slot`, if any.
    Free { slot: u32 },
    /// Run a full coalescing pass.
    Coalesce,
}

/// Outcome of replaying a script.
#[derive(Debug, Default)]
pub struct Replay {
    /// Live allocations by slot, in the order they were made.
    pub live: IndexMap<u32, BlockHandle>,
    /// Allocations that failed (zero size or out of memory).
    pub failed_allocs: usize,
    /// `Free` steps naming an empty slot.
    pub empty_frees: usize,
    /// Merges performed by `Coalesce` steps.
    pub merges: usize,
}

/// Replay `ops` against `arena`.
///
/// # Panics
///
/// Panics if the arena rejects the release of a handle it issued, which
/// would mean the allocator lost track of a live block.
pub fn replay(arena: &mut HeapArena, ops: &[HeapOp]) -> Replay {
    run(arena, ops, |_| {})
}

/// Like [`replay`], but asserts heap consistency after every step.
pub fn replay_checked(arena: &mut HeapArena, ops: &[HeapOp]) -> Replay {
    run(arena, ops, assert_heap_consistent)
}

fn run(arena: &mut HeapArena, ops: &[HeapOp], check: impl Fn(&HeapArena)) -> Replay {
    let mut out = Replay::default();
    for (step, op) in ops.iter().enumerate() {
        match *op {
            HeapOp::Alloc { slot, size } => {
                if let Some(old) = out.live.shift_remove(&slot) {
                    release(arena, old, step);
                }
                match arena.allocate(size) {
                    Ok(handle) => {
                        out.live.insert(slot, handle);
                    }
                    Err(_) => out.failed_allocs += 1,
                }
            }
            HeapOp::Free { slot } => match out.live.shift_remove(&slot) {
                Some(handle) => release(arena, handle, step),
                None => out.empty_frees += 1,
            },
            HeapOp::Coalesce => {
                out.merges += arena
                    .coalesce()
                    .unwrap_or_else(|e| panic!("step {step}: coalesce failed: {e}"));
            }
        }
        check(arena);
    }
    out
}

fn release(arena: &mut HeapArena, handle: BlockHandle, step: usize) {
    arena
        .release(handle)
        .unwrap_or_else(|e| panic!("step {step}: release of {handle} failed: {e}"));
}
