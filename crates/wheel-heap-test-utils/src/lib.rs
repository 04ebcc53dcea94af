//! Test utilities for wheel-heap development.
//!
//! Provides a scripted operation replayer ([`HeapOp`], [`replay`]), a
//! structural invariant checker ([`check_heap_consistent`] and its panicking
//! twin [`assert_heap_consistent`]), and a [`checkerboard`] fixture that
//! leaves a heap with alternating free and allocated blocks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod script;

pub use script::{replay, replay_checked, HeapOp, Replay};

use wheel_heap_arena::{BlockHandle, HeapArena};

/// Verify every structural invariant of `arena`.
///
/// Checks header integrity, that the blocks tile `[0, capacity)` exactly
/// once in address order, and that used plus free bytes equal the capacity.
pub fn check_heap_consistent(arena: &HeapArena) -> Result<(), String> {
    arena.validate().map_err(|e| e.to_string())?;

    let mut expected = 0usize;
    for block in arena.blocks() {
        if block.offset != expected {
            return Err(format!(
                "block at {} does not start where the previous one ended ({expected})",
                block.offset
            ));
        }
        expected = block.end();
    }
    if expected != arena.capacity() {
        return Err(format!(
            "blocks end at {expected}, capacity is {}",
            arena.capacity()
        ));
    }

    let used = arena.used_bytes();
    let free = arena.free_bytes();
    if used + free != arena.capacity() {
        return Err(format!(
            "used {used} + free {free} != capacity {}",
            arena.capacity()
        ));
    }

    let stats = arena.stats();
    if stats.allocated_blocks + stats.free_blocks != stats.total_blocks {
        return Err(format!("inconsistent block counts: {stats}"));
    }
    Ok(())
}

/// Panic with a descriptive message if `arena` violates an invariant.
#[track_caller]
pub fn assert_heap_consistent(arena: &HeapArena) {
    if let Err(msg) = check_heap_consistent(arena) {
        panic!("heap invariant violated: {msg}");
    }
}

/// Allocate `count` blocks of `size` bytes and release every other one.
///
/// Returns the handles still allocated (the odd-indexed ones). Because
/// release only merges forward and each freed block is followed by a live
/// one, the heap is left with `count / 2` separate free holes of `size`
/// bytes followed by the free tail.
///
/// # Panics
///
/// Panics if the arena cannot hold `count` blocks of `size` bytes.
pub fn checkerboard(arena: &mut HeapArena, size: usize, count: usize) -> Vec<BlockHandle> {
    let handles: Vec<BlockHandle> = (0..count)
        .map(|i| {
            arena
                .allocate(size)
                .unwrap_or_else(|e| panic!("checkerboard allocation {i} failed: {e}"))
        })
        .collect();
    let mut kept = Vec::with_capacity(count / 2);
    for (i, handle) in handles.into_iter().enumerate() {
        if i % 2 == 0 {
            arena
                .release(handle)
                .unwrap_or_else(|e| panic!("checkerboard release {i} failed: {e}"));
        } else {
            kept.push(handle);
        }
    }
    kept
}
