//! Property tests for the allocator contract

mod common;

use common::{check_allocations, overlaps};
use nebula_alloc::allocator::{
    AffixAllocator, BestFit, Fallback, FreeListAllocator, HeapAllocator, PrefixedSizeAllocator,
    Segregator, SlabAllocator, SlabConfig, StackAllocator,
};
use nebula_alloc::{Allocator, MemoryBlock};
use proptest::prelude::*;

fn sizes() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=256, 1..24)
}

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    Release(usize),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (1usize..=128).prop_map(Op::Allocate),
            any::<usize>().prop_map(Op::Release),
        ],
        1..64,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stack_contract(sizes in sizes()) {
        check_allocations(&mut StackAllocator::<0x4000, 16>::new(), &sizes);
    }

    #[test]
    fn heap_contract(sizes in sizes()) {
        check_allocations(&mut HeapAllocator, &sizes);
    }

    #[test]
    fn free_list_contract(sizes in sizes()) {
        let mut alloc = FreeListAllocator::new(HeapAllocator, BestFit);
        check_allocations(&mut alloc, &sizes);
        // Everything released was cached, so a second round is served
        // from the list.
        prop_assert_eq!(alloc.len(), sizes.len());
        check_allocations(&mut alloc, &sizes);
    }

    #[test]
    fn fallback_contract(sizes in sizes()) {
        let mut alloc = Fallback::new(StackAllocator::<0x400, 8>::new(), HeapAllocator);
        check_allocations(&mut alloc, &sizes);
    }

    #[test]
    fn segregator_contract(sizes in sizes()) {
        let mut alloc = Segregator::<StackAllocator<0x1000, 8>, HeapAllocator, 64>::default();
        check_allocations(&mut alloc, &sizes);
    }

    #[test]
    fn affix_contract(sizes in sizes()) {
        check_allocations(&mut AffixAllocator::<HeapAllocator, u64, u32>::default(), &sizes);
    }

    #[test]
    fn prefixed_size_contract(sizes in sizes()) {
        check_allocations(&mut PrefixedSizeAllocator::new(HeapAllocator), &sizes);
    }

    #[test]
    fn slab_contract(sizes in sizes()) {
        let backing = StackAllocator::<0x10000, 8>::new();
        let mut slab = SlabAllocator::new(backing, SlabConfig::standard())
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        check_allocations(&mut slab, &sizes);
    }

    #[test]
    fn free_list_blocks_never_overlap(ops in ops()) {
        let mut alloc = FreeListAllocator::new(StackAllocator::<0x10000, 8>::new(), BestFit);
        let mut live: Vec<MemoryBlock> = Vec::new();

        for op in ops {
            match op {
                Op::Allocate(size) => {
                    let block = alloc.allocate(size);
                    prop_assert!(!block.is_null());
                    prop_assert_eq!(block.size(), size);
                    prop_assert!(live.iter().all(|other| !overlaps(&block, other)));
                    live.push(block);
                },
                Op::Release(index) if !live.is_empty() => {
                    let mut block = live.swap_remove(index % live.len());
                    unsafe { alloc.deallocate(&mut block) };
                },
                Op::Release(_) => {},
            }
        }
    }
}
