//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::any::type_name;

use nebula_alloc::{
    Allocator, Capabilities, DeallocateAll, Expand, Initializer, MemoryBlock, Owns,
};

/// Counts the calls that reach a wrapped allocator
#[derive(Debug, Default)]
pub struct Counting<A> {
    pub inner: A,
    pub allocations: usize,
    pub reallocations: usize,
    pub deallocations: usize,
    pub bytes_requested: usize,
}

impl<A> Counting<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            allocations: 0,
            reallocations: 0,
            deallocations: 0,
            bytes_requested: 0,
        }
    }
}

unsafe impl<A: Allocator> Allocator for Counting<A> {
    const ALIGNMENT: usize = A::ALIGNMENT;
    const CAPABILITIES: Capabilities = A::CAPABILITIES;

    fn init<I: Initializer>(&mut self, initializer: &mut I) {
        self.inner.init(initializer);
        initializer.init(self);
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        self.allocations += 1;
        self.bytes_requested += size;
        self.inner.allocate(size)
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        self.inner.owns(block)
    }

    unsafe fn expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool {
        unsafe { self.inner.expand(block, delta) }
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        self.reallocations += 1;
        unsafe { self.inner.reallocate(block, new_size) }
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        self.deallocations += 1;
        unsafe { self.inner.deallocate(block) }
    }

    unsafe fn deallocate_all(&mut self) {
        unsafe { self.inner.deallocate_all() }
    }
}

impl<A: Owns> Owns for Counting<A> {}
impl<A: Expand> Expand for Counting<A> {}
impl<A: DeallocateAll> DeallocateAll for Counting<A> {}

/// Records the type of every allocator it visits, in order
#[derive(Debug, Default)]
pub struct RecordingInitializer {
    pub visited: Vec<&'static str>,
}

impl Initializer for RecordingInitializer {
    fn init<A: Allocator>(&mut self, _allocator: &mut A) {
        self.visited.push(type_name::<A>());
    }
}

/// Allocates every size, checks the contract on each block, then frees them
/// newest first
pub fn check_allocations<A: Allocator>(allocator: &mut A, sizes: &[usize]) {
    assert!(allocator.allocate(0).is_null());

    let mut blocks = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let mut block = allocator.allocate(size);
        assert!(!block.is_null(), "allocate({size}) failed");
        assert_eq!(block.size(), size);
        assert_eq!(block.addr() % allocator.alignment(), 0);
        for live in &blocks {
            assert!(!overlaps(&block, live), "{block:?} overlaps {live:?}");
        }
        // SAFETY: fresh block of `size` bytes
        unsafe { block.as_mut_slice().fill(size as u8) };
        blocks.push(block);
    }

    while let Some(mut block) = blocks.pop() {
        // SAFETY: nothing else wrote to the block
        unsafe {
            assert!(block.as_slice().iter().all(|&b| b == block.size() as u8));
            allocator.deallocate(&mut block);
        }
        assert!(block.is_null());
    }
}

/// Routes `tracing` output to the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn overlaps(a: &MemoryBlock, b: &MemoryBlock) -> bool {
    a.addr() < b.end().addr() && b.addr() < a.end().addr()
}
