//! Integration tests for composed allocators

mod common;

use std::any::type_name;
use std::cell::RefCell;

use common::{Counting, RecordingInitializer, init_tracing};
use nebula_alloc::allocator::{
    DynProxyAllocator, Fallback, FirstFit, FreeListAllocator, HeapAllocator, ProxyAllocator,
    Segregator, SlabAllocator, SlabConfig, StackAllocator,
};
use nebula_alloc::{Allocator, MemoryBlock};
use pretty_assertions::assert_eq;

type Small = StackAllocator<0x100, 8>;
type Large = StackAllocator<0x1000, 8>;

#[test]
fn test_fallback_serves_oversized_from_secondary() {
    let mut alloc = Fallback::new(Small::new(), Large::new());
    let block = alloc.allocate(0x200);

    assert_eq!(block.size(), 0x200);
    assert!(!alloc.primary().owns(&block));
    assert!(alloc.secondary().owns(&block));
    assert!(alloc.owns(&block));
    assert_eq!(alloc.primary().used(), 0);
}

#[test]
fn test_fallback_overflow_then_release() {
    init_tracing();
    let mut alloc = Fallback::new(Small::new(), Large::new());
    let mut first = alloc.allocate(0x100);
    let mut second = alloc.allocate(0x10);
    assert!(alloc.primary().owns(&first));
    assert!(alloc.secondary().owns(&second));

    unsafe {
        alloc.deallocate(&mut second);
        alloc.deallocate(&mut first);
    }
    assert_eq!(alloc.primary().used(), 0);
    assert_eq!(alloc.secondary().used(), 0);
}

#[test]
fn test_segregator_routes_by_threshold() {
    init_tracing();
    let mut alloc = Segregator::<Large, Large, 32>::default();

    let mut small = alloc.allocate(32);
    let large = alloc.allocate(33);
    assert!(alloc.small().owns(&small));
    assert!(alloc.large().owns(&large));
    assert_eq!(alloc.small().used(), 32);

    unsafe {
        small.as_mut_slice().copy_from_slice(&[0x5A; 32]);
        assert!(alloc.reallocate(&mut small, 40));
    }
    assert_eq!(small.size(), 40);
    assert!(alloc.large().owns(&small));
    assert_eq!(unsafe { &small.as_slice()[..32] }, &[0x5A; 32]);
    // The original block was released from the small side.
    assert_eq!(alloc.small().used(), 0);
}

#[test]
fn test_slab_size_class_backing() {
    let backing = Counting::new(StackAllocator::<0x3000, 8>::new());
    let mut slab =
        SlabAllocator::new(backing, SlabConfig::new(0x1000, [32, 64, 128])).expect("slab config");

    let block = slab.allocate(40);
    assert_eq!(block.size(), 40);
    assert_eq!(slab.index_for_size(block.size()), Some(1));
    assert_eq!(slab.free_slots(1), 0x1000 / 64 - 1);
    assert_eq!(slab.inner().allocations, 1);
}

#[test]
fn test_slab_reuses_slots_released_out_of_order() {
    let backing = Counting::new(StackAllocator::<0x3000, 8>::new());
    let mut slab =
        SlabAllocator::new(backing, SlabConfig::new(0x1000, [32, 64, 128])).expect("slab config");

    let mut blocks: Vec<MemoryBlock> = (0..10).map(|_| slab.allocate(32)).collect();
    assert!(blocks.iter().all(|block| !block.is_null()));

    for index in [3, 8, 2, 9, 4, 5, 0, 7, 1, 6] {
        unsafe { slab.deallocate(&mut blocks[index]) };
    }
    assert!(blocks.iter().all(MemoryBlock::is_null));

    for block in &mut blocks {
        *block = slab.allocate(32);
        assert!(!block.is_null());
    }
    for block in &mut blocks {
        assert!(unsafe { slab.reallocate(block, 24) });
    }

    assert_eq!(slab.inner().allocations, 1);
    assert_eq!(slab.inner().inner.used(), 0x1000);
}

#[test]
fn test_free_list_over_fallback() {
    let backing = Fallback::new(Small::new(), HeapAllocator);
    let mut alloc = FreeListAllocator::new(backing, FirstFit);
    let mut block = alloc.allocate(0x180);
    assert!(!alloc.inner().primary().owns(&block));

    let address = block.addr();
    unsafe { alloc.deallocate(&mut block) };
    assert_eq!(alloc.len(), 1);

    let mut again = alloc.allocate(0x100);
    assert_eq!(again.addr(), address);
    assert_eq!(again.size(), 0x100);
    assert!(alloc.is_empty());
    unsafe { alloc.deallocate(&mut again) };
}

#[test]
fn test_free_list_deallocate_all_returns_cache_to_heap() {
    let mut alloc = FreeListAllocator::new(Counting::new(HeapAllocator), FirstFit);
    let mut blocks = [alloc.allocate(24), alloc.allocate(64), alloc.allocate(200)];
    for block in &mut blocks {
        unsafe { alloc.deallocate(block) };
    }
    assert_eq!(alloc.len(), 3);
    assert_eq!(alloc.inner().deallocations, 0);

    unsafe { alloc.deallocate_all() };
    assert!(alloc.is_empty());
    assert_eq!(alloc.inner().allocations, 3);
    assert_eq!(alloc.inner().deallocations, 3);

    drop(alloc);
}

#[test]
fn test_init_visits_children_first() {
    let mut alloc = Fallback::new(Small::new(), Large::new());
    let mut recorder = RecordingInitializer::default();
    alloc.init(&mut recorder);
    assert_eq!(
        recorder.visited,
        vec![
            type_name::<Small>(),
            type_name::<Large>(),
            type_name::<Fallback<Small, Large>>(),
        ]
    );

    let mut nested = Segregator::<Fallback<Small, Large>, HeapAllocator, 64>::default();
    let mut recorder = RecordingInitializer::default();
    nested.init(&mut recorder);
    assert_eq!(
        recorder.visited,
        vec![
            type_name::<Small>(),
            type_name::<Large>(),
            type_name::<Fallback<Small, Large>>(),
            type_name::<HeapAllocator>(),
            type_name::<Segregator<Fallback<Small, Large>, HeapAllocator, 64>>(),
        ]
    );
}

#[test]
fn test_init_visits_proxy_before_target() {
    let target = RefCell::new(Small::new());
    let mut proxy = ProxyAllocator::with_target(&target);
    let mut recorder = RecordingInitializer::default();
    proxy.init(&mut recorder);
    assert_eq!(
        recorder.visited,
        vec![type_name::<ProxyAllocator<'static, Small>>(), type_name::<Small>()]
    );

    let mut erased = DynProxyAllocator::with_target(&target);
    let mut recorder = RecordingInitializer::default();
    erased.init(&mut recorder);
    assert_eq!(recorder.visited, vec![type_name::<DynProxyAllocator<'static>>()]);
}
