//! Main slab allocator implementation
//!
//! # Safety
//!
//! Each size class keeps an intrusive free list threaded through its free
//! slots: the first pointer-sized bytes of a free slot hold the address of the
//! next free slot. Links are read and written unaligned, so slots only need
//! the backing allocator's alignment.
//!
//! ## Invariants
//!
//! - every slot on list `i` is `size_classes[i]` bytes inside a slab chunk
//!   obtained from the backing allocator
//! - a slot is either on exactly one free list or handed out, never both
//! - handed-out blocks carry the requested size; their class is recovered by
//!   `index_for_size(block.size)`
//! - slab chunks are never returned one by one; only `deallocate_all`
//!   hands them back to the backing allocator

use core::ptr;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

use super::SlabConfig;
use crate::block::MemoryBlock;
use crate::error::AllocResult;
use crate::realloc::try_default_reallocate;
use crate::traits::{Allocator, Capabilities, DeallocateAll, Expand, Initializer, Owns};

/// Size-class pool over a backing allocator
pub struct SlabAllocator<A: Allocator, const N: usize> {
    inner: A,
    config: SlabConfig<N>,
    free_lists: [*mut u8; N],
}

impl<A: Allocator, const N: usize> SlabAllocator<A, N> {
    /// Creates a slab allocator after validating `config` against `A`
    pub fn new(inner: A, config: SlabConfig<N>) -> AllocResult<Self> {
        config.validate(A::ALIGNMENT)?;
        Ok(Self {
            inner,
            config,
            free_lists: [ptr::null_mut(); N],
        })
    }

    pub fn config(&self) -> &SlabConfig<N> {
        &self.config
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    /// Index of the smallest size class that holds `size` bytes
    #[inline]
    pub fn index_for_size(&self, size: usize) -> Option<usize> {
        self.config
            .size_classes
            .iter()
            .position(|&class| class >= size)
    }

    /// Free slots currently on the list of class `index`, 0 for an unknown class
    pub fn free_slots(&self, index: usize) -> usize {
        let Some(&head) = self.free_lists.get(index) else {
            return 0;
        };
        let mut count = 0;
        let mut slot = head;
        while !slot.is_null() {
            count += 1;
            // SAFETY: free slots hold a valid link per the list invariants.
            slot = unsafe { read_link(slot) };
        }
        count
    }

    /// Carves one slab chunk into slots of class `index`
    fn refill(&mut self, index: usize) -> bool {
        let class = self.config.size_classes[index];
        let chunk = self.inner.allocate(self.config.slab_capacity);
        if chunk.is_null() {
            #[cfg(feature = "logging")]
            warn!(
                class,
                capacity = self.config.slab_capacity,
                "slab refill refused by backing allocator"
            );
            return false;
        }

        let slots = chunk.size / class;
        // Thread back to front so slots are handed out in address order.
        for slot in (0..slots).rev() {
            // SAFETY: slot * class + class <= chunk.size, so the slot lies in the chunk.
            unsafe { self.push(index, chunk.ptr.add(slot * class)) };
        }
        #[cfg(feature = "logging")]
        debug!(class, slots, "slab refilled");
        true
    }

    /// # Safety
    ///
    /// `slot` is a free slot of class `index` that is on no list.
    #[inline]
    unsafe fn push(&mut self, index: usize, slot: *mut u8) {
        // SAFETY: caller guarantees the slot is free and pointer-sized or larger.
        unsafe { write_link(slot, self.free_lists[index]) };
        self.free_lists[index] = slot;
    }

    #[inline]
    fn pop(&mut self, index: usize) -> Option<*mut u8> {
        let slot = self.free_lists[index];
        if slot.is_null() {
            return None;
        }
        // SAFETY: slot is the head of a free list.
        self.free_lists[index] = unsafe { read_link(slot) };
        Some(slot)
    }
}

/// # Safety
///
/// `slot` points to at least pointer-sized readable bytes holding a link.
#[inline]
unsafe fn read_link(slot: *mut u8) -> *mut u8 {
    // SAFETY: forwarded caller contract
    unsafe { slot.cast::<*mut u8>().read_unaligned() }
}

/// # Safety
///
/// `slot` points to at least pointer-sized writable bytes.
#[inline]
unsafe fn write_link(slot: *mut u8, next: *mut u8) {
    // SAFETY: forwarded caller contract
    unsafe { slot.cast::<*mut u8>().write_unaligned(next) };
}

// SAFETY: slots are disjoint sub-ranges of backing chunks, aligned because
// chunks are aligned and every class is a multiple of A::ALIGNMENT.
unsafe impl<A: Allocator, const N: usize> Allocator for SlabAllocator<A, N> {
    const ALIGNMENT: usize = A::ALIGNMENT;
    const CAPABILITIES: Capabilities = Capabilities::EXPAND.union(
        A::CAPABILITIES.intersection(Capabilities::OWNS.union(Capabilities::DEALLOCATE_ALL)),
    );

    fn init<I: Initializer>(&mut self, initializer: &mut I) {
        self.inner.init(initializer);
        initializer.init(self);
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        if size == 0 {
            return MemoryBlock::NULL;
        }
        let Some(index) = self.index_for_size(size) else {
            return MemoryBlock::NULL;
        };
        if self.free_lists[index].is_null() && !self.refill(index) {
            return MemoryBlock::NULL;
        }
        match self.pop(index) {
            Some(ptr) => MemoryBlock { ptr, size },
            None => MemoryBlock::NULL,
        }
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        !block.is_null() && block.size <= self.config.max_size() && self.inner.owns(block)
    }

    unsafe fn expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool {
        if delta == 0 {
            return true;
        }
        if block.is_null() {
            *block = self.allocate(delta);
            return !block.is_null();
        }
        let Some(new_size) = block.size.checked_add(delta) else {
            return false;
        };
        let current = self.index_for_size(block.size);
        if current.is_some() && current == self.index_for_size(new_size) {
            block.size = new_size;
            return true;
        }
        false
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        if let Some(done) = unsafe { try_default_reallocate(self, block, new_size) } {
            return done;
        }
        let current = self.index_for_size(block.size);
        let target = self.index_for_size(new_size);
        if target.is_none() {
            return false;
        }
        if current == target {
            block.size = new_size;
            return true;
        }

        let new_block = self.allocate(new_size);
        if new_block.is_null() {
            return false;
        }
        // SAFETY: the slots belong to different classes, so they are disjoint.
        unsafe {
            ptr::copy_nonoverlapping(block.ptr, new_block.ptr, block.size.min(new_size));
            self.deallocate(block);
        }
        *block = new_block;
        true
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        if block.is_null() {
            return;
        }
        if let Some(index) = self.index_for_size(block.size) {
            // SAFETY: the caller hands back a slot of this class.
            unsafe { self.push(index, block.ptr) };
        }
        *block = MemoryBlock::NULL;
    }

    unsafe fn deallocate_all(&mut self) {
        self.free_lists = [ptr::null_mut(); N];
        // SAFETY: forwarded caller contract
        unsafe { self.inner.deallocate_all() };
    }
}

impl<A: Allocator, const N: usize> Expand for SlabAllocator<A, N> {}
impl<A: Owns, const N: usize> Owns for SlabAllocator<A, N> {}
impl<A: DeallocateAll, const N: usize> DeallocateAll for SlabAllocator<A, N> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{NullAllocator, StackAllocator};

    type Stack = StackAllocator<0x3000, 8>;

    fn slab() -> SlabAllocator<Stack, 3> {
        SlabAllocator::new(Stack::new(), SlabConfig::new(0x1000, [32, 64, 128]))
            .expect("valid config")
    }

    #[test]
    fn test_size_class_lookup() {
        let slab = slab();
        assert_eq!(slab.index_for_size(1), Some(0));
        assert_eq!(slab.index_for_size(32), Some(0));
        assert_eq!(slab.index_for_size(33), Some(1));
        assert_eq!(slab.index_for_size(128), Some(2));
        assert_eq!(slab.index_for_size(129), None);
    }

    #[test]
    fn test_allocate_refills_one_slab() {
        let mut slab = slab();
        let block = slab.allocate(40);
        assert_eq!(block.size(), 40);
        assert_eq!(slab.inner().used(), 0x1000);
        assert_eq!(slab.free_slots(1), 0x1000 / 64 - 1);
        assert_eq!(slab.free_slots(0), 0);

        let next = slab.allocate(64);
        assert_eq!(next.addr(), block.addr() + 64);
    }

    #[test]
    fn test_free_slots_of_unknown_class() {
        let mut slab = slab();
        let _block = slab.allocate(16);
        assert_eq!(slab.free_slots(3), 0);
        assert_eq!(slab.free_slots(usize::MAX), 0);
    }

    #[test]
    fn test_oversized_and_zero_fail() {
        let mut slab = slab();
        assert!(slab.allocate(0).is_null());
        assert!(slab.allocate(129).is_null());
        assert_eq!(slab.inner().used(), 0);
    }

    #[test]
    fn test_failed_refill_returns_null() {
        let mut slab = SlabAllocator::new(NullAllocator, SlabConfig::new(0x10000, [0x10000]))
            .expect("valid config");
        assert!(slab.allocate(8).is_null());
    }

    #[test]
    fn test_expand_within_class_only() {
        let mut slab = slab();
        let mut block = slab.allocate(40);
        // SAFETY: block comes from this allocator
        unsafe {
            assert!(slab.expand(&mut block, 24));
            assert_eq!(block.size(), 64);
            assert!(!slab.expand(&mut block, 1));
            assert_eq!(block.size(), 64);
        }
    }

    #[test]
    fn test_reallocate_between_classes() {
        let mut slab = slab();
        let mut block = slab.allocate(16);
        // SAFETY: block comes from this allocator
        unsafe {
            block.as_mut_slice().fill(9);
            assert!(slab.reallocate(&mut block, 100));
            assert_eq!(block.size(), 100);
            assert_eq!(&block.as_slice()[..16], &[9; 16]);
            assert!(!slab.reallocate(&mut block, 200));
            assert_eq!(block.size(), 100);
        }
        assert_eq!(slab.free_slots(0), 0x1000 / 32);
    }

    #[test]
    fn test_deallocate_all_resets_lists() {
        let mut slab = slab();
        let _ = slab.allocate(32);
        let _ = slab.allocate(128);
        // SAFETY: outstanding blocks are dropped
        unsafe { slab.deallocate_all() };
        assert_eq!(slab.free_slots(0), 0);
        assert_eq!(slab.inner().used(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = SlabAllocator::new(Stack::new(), SlabConfig::new(0x1000, [12, 64]));
        assert!(result.is_err());
    }
}
