//! Benchmark workloads for the wheel-heap allocator.
//!
//! - [`churn_profile`]: seeded alloc/free mix over a bounded live set
//! - [`fragmented_heap`]: arena pre-shaped into a checkerboard of holes

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use indexmap::IndexSet;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wheel_heap_arena::{BlockHandle, HeapArena, HeapError};
use wheel_heap_test_utils::{checkerboard, HeapOp};

/// Smallest request size produced by [`churn_profile`].
pub const MIN_REQUEST: usize = 8;
/// Largest request size produced by [`churn_profile`].
pub const MAX_REQUEST: usize = 512;
/// Number of slots a churn script cycles through.
pub const CHURN_SLOTS: u32 = 64;

/// Build a deterministic churn script of `ops` steps.
///
/// Roughly 60% of steps allocate a size in `MIN_REQUEST..=MAX_REQUEST`, the
/// rest free a random live slot. Every 256th step is a `Coalesce`.
pub fn churn_profile(seed: u64, ops: usize) -> Vec<HeapOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut live: IndexSet<u32> = IndexSet::new();
    let mut script = Vec::with_capacity(ops);
    let span = (MAX_REQUEST - MIN_REQUEST + 1) as u64;

    for step in 0..ops {
        if step % 256 == 255 {
            script.push(HeapOp::Coalesce);
            continue;
        }
        let roll = rng.next_u32() % 10;
        if roll < 6 || live.is_empty() {
            let slot = rng.next_u32() % CHURN_SLOTS;
            let size = MIN_REQUEST + (rng.next_u64() % span) as usize;
            live.insert(slot);
            script.push(HeapOp::Alloc { slot, size });
        } else {
            let idx = (rng.next_u64() % live.len() as u64) as usize;
            if let Some(slot) = live.swap_remove_index(idx) {
                script.push(HeapOp::Free { slot });
            }
        }
    }
    script
}

/// Build an arena of `capacity` bytes whose front is a checkerboard of
/// `count` blocks of `size` bytes, every other one freed.
///
/// Returns the arena and the handles still live.
pub fn fragmented_heap(
    capacity: usize,
    size: usize,
    count: usize,
) -> Result<(HeapArena, Vec<BlockHandle>), HeapError> {
    let mut arena = HeapArena::with_capacity(capacity)?;
    let live = checkerboard(&mut arena, size, count);
    Ok((arena, live))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheel_heap_test_utils::{assert_heap_consistent, replay_checked};

    #[test]
    fn churn_profile_is_deterministic() {
        assert_eq!(churn_profile(42, 500), churn_profile(42, 500));
        assert_ne!(churn_profile(42, 500), churn_profile(43, 500));
    }

    #[test]
    fn churn_profile_respects_bounds() {
        let script = churn_profile(7, 1000);
        assert_eq!(script.len(), 1000);
        for op in &script {
            match *op {
                HeapOp::Alloc { slot, size } => {
                    assert!(slot < CHURN_SLOTS);
                    assert!((MIN_REQUEST..=MAX_REQUEST).contains(&size));
                }
                HeapOp::Free { slot } => assert!(slot < CHURN_SLOTS),
                HeapOp::Coalesce => {}
            }
        }
        assert!(script.contains(&HeapOp::Coalesce));
    }

    #[test]
    fn churn_profile_replays_cleanly() {
        let mut arena = HeapArena::with_capacity(256 * 1024).unwrap();
        let out = replay_checked(&mut arena, &churn_profile(1, 2000));
        assert_eq!(out.empty_frees, 0);
        assert_heap_consistent(&arena);
    }

    #[test]
    fn fragmented_heap_has_holes() {
        let (arena, live) = fragmented_heap(8192, 64, 32).unwrap();
        assert_eq!(live.len(), 16);
        assert!(arena.stats().free_blocks > 16);
        assert_heap_consistent(&arena);
    }
}
