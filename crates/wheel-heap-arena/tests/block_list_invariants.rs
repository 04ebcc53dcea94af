use proptest::prelude::*;
use wheel_heap_arena::{ArenaConfig, HandleFault, HeapArena, HeapError, HEADER_SIZE};
use wheel_heap_test_utils::{
    assert_heap_consistent, check_heap_consistent, checkerboard, replay, replay_checked, HeapOp,
};

fn layout(arena: &HeapArena) -> Vec<(usize, usize, bool)> {
    arena
        .blocks()
        .map(|b| (b.offset, b.size, b.is_free))
        .collect()
}

#[test]
fn reference_scenario_reuses_lowest_slot() {
    let mut heap = HeapArena::new(ArenaConfig::new(1024)).unwrap();

    let a = heap.allocate(100).unwrap();
    assert_eq!(
        layout(&heap),
        vec![(0, 100, false), (116, 1024 - 16 - 100 - 16, true)]
    );

    let b = heap.allocate(50).unwrap();
    assert!(b.offset() > a.offset());

    heap.release(a).unwrap();
    let c = heap.allocate(90).unwrap();
    assert_eq!(c.offset(), a.offset());
    assert_heap_consistent(&heap);
}

#[test]
fn checkerboard_fragmentation_blocks_large_request() {
    let mut heap = HeapArena::with_capacity(2048).unwrap();
    let kept = checkerboard(&mut heap, 100, 16);

    // Free space is ample in total but scattered into 100-byte holes
    // plus whatever tail remains.
    let tail = layout(&heap).last().copied().unwrap();
    assert!(tail.2);
    let request = tail.1 + 1;
    assert!(request > 100);
    assert!(matches!(
        heap.allocate(request),
        Err(HeapError::OutOfMemory { .. })
    ));

    // Freeing the live blocks back to front lets each merge forward into the
    // hole after it, but the holes before them stay separate.
    for handle in kept.iter().rev() {
        heap.release(*handle).unwrap();
    }
    assert!(heap.block_count() > 1);
    assert!(heap.stats().fragmentation() > 0.0);

    heap.coalesce().unwrap();
    assert_eq!(heap.block_count(), 1);
    assert!(heap.allocate(request).is_ok());
    assert_heap_consistent(&heap);
}

#[test]
fn forward_merge_shrinks_block_count() {
    let mut heap = HeapArena::with_capacity(1024).unwrap();
    let a = heap.allocate(200).unwrap();
    let b = heap.allocate(300).unwrap();
    let _c = heap.allocate(100).unwrap();

    heap.release(b).unwrap();
    let before = heap.block_count();
    heap.release(a).unwrap();
    assert_eq!(heap.block_count(), before - 1);
    assert_eq!(layout(&heap)[0], (0, 200 + HEADER_SIZE + 300, true));
}

#[test]
fn backward_neighbour_is_not_merged_until_touched() {
    let mut heap = HeapArena::with_capacity(1024).unwrap();
    let a = heap.allocate(64).unwrap();
    let b = heap.allocate(64).unwrap();
    let c = heap.allocate(64).unwrap();

    heap.release(a).unwrap();
    heap.release(b).unwrap();
    let free_holes = heap.blocks().filter(|blk| blk.is_free).count();
    assert_eq!(free_holes, 3);

    // Reallocating a and releasing it again merges it with b's hole.
    let a2 = heap.allocate(64).unwrap();
    assert_eq!(a2.offset(), a.offset());
    heap.release(a2).unwrap();
    assert_eq!(layout(&heap)[0], (0, 64 + HEADER_SIZE + 64, true));

    heap.release(c).unwrap();
    assert_heap_consistent(&heap);
}

#[test]
fn invalid_releases_leave_heap_untouched() {
    let mut heap = HeapArena::with_capacity(1024).unwrap();
    let other = HeapArena::with_capacity(1024).unwrap();
    let a = heap.allocate(64).unwrap();
    let _b = heap.allocate(64).unwrap();
    heap.release(a).unwrap();
    let before = layout(&heap);

    let attempts = [
        (a, HandleFault::AlreadyFree),
        (heap.handle_at(a.offset() + 1), HandleFault::NotABlock),
        (heap.handle_at(0), HandleFault::OutOfBounds),
        (other.handle_at(a.offset()), HandleFault::ForeignArena),
    ];
    for (handle, reason) in attempts {
        assert_eq!(
            heap.release(handle),
            Err(HeapError::InvalidRelease {
                offset: handle.offset() as u32,
                reason,
            })
        );
        assert_eq!(layout(&heap), before);
    }
}

#[test]
fn scripted_workload_replays_consistently() {
    let ops = [
        HeapOp::Alloc { slot: 0, size: 40 },
        HeapOp::Alloc { slot: 1, size: 400 },
        HeapOp::Alloc { slot: 2, size: 4 },
        HeapOp::Free { slot: 1 },
        HeapOp::Alloc { slot: 3, size: 120 },
        HeapOp::Alloc { slot: 4, size: 120 },
        HeapOp::Free { slot: 0 },
        HeapOp::Free { slot: 3 },
        HeapOp::Coalesce,
        HeapOp::Alloc { slot: 5, size: 300 },
    ];
    let mut first = HeapArena::with_capacity(2048).unwrap();
    let mut second = HeapArena::with_capacity(2048).unwrap();
    let out_a = replay_checked(&mut first, &ops);
    let out_b = replay(&mut second, &ops);

    assert_eq!(layout(&first), layout(&second));
    assert_eq!(out_a.failed_allocs, out_b.failed_allocs);
    let offsets_a: Vec<_> = out_a.live.values().map(|h| h.offset()).collect();
    let offsets_b: Vec<_> = out_b.live.values().map(|h| h.offset()).collect();
    assert_eq!(offsets_a, offsets_b);
}

fn heap_op() -> impl Strategy<Value = HeapOp> {
    prop_oneof![
        6 => (0u32..32, 0usize..512).prop_map(|(slot, size)| HeapOp::Alloc { slot, size }),
        4 => (0u32..32).prop_map(|slot| HeapOp::Free { slot }),
        1 => Just(HeapOp::Coalesce),
    ]
}

proptest! {
    #[test]
    fn conservation_and_partition_hold_for_any_script(
        ops in proptest::collection::vec(heap_op(), 1..150),
        capacity in 256usize..8192,
    ) {
        let mut heap = HeapArena::with_capacity(capacity).unwrap();
        let out = replay(&mut heap, &ops);
        prop_assert!(check_heap_consistent(&heap).is_ok());
        prop_assert_eq!(heap.used_bytes() + heap.free_bytes(), capacity);
        prop_assert_eq!(heap.stats().allocated_blocks, out.live.len());
    }

    #[test]
    fn releasing_everything_then_coalescing_restores_one_block(
        ops in proptest::collection::vec(heap_op(), 1..100),
    ) {
        let mut heap = HeapArena::with_capacity(4096).unwrap();
        let out = replay(&mut heap, &ops);
        for handle in out.live.values() {
            heap.release(*handle).unwrap();
        }
        heap.coalesce().unwrap();
        prop_assert_eq!(heap.block_count(), 1);
        prop_assert_eq!(heap.free_bytes(), 4096);
    }
}
