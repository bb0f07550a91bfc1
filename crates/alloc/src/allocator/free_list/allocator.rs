//! Free-list allocator implementation
//!
//! # Safety
//!
//! Released blocks are kept in an intrusive [`FreeList`] instead of being
//! handed back to the backing allocator. A cached block's first bytes hold its
//! list node, so every block is given a footprint of at least
//! [`FreeListNode::SIZE`] bytes.
//!
//! ## Invariants
//!
//! - `footprint(n) = align_up(max(n, FreeListNode::SIZE), ALIGNMENT)` is what
//!   the backing allocator sees for a block of logical size `n`
//! - cached blocks are never visible to callers
//! - blocks handed to callers carry the requested size, not the cached one
//! - a block released past the cache goes back to the backing allocator at its
//!   start address with `footprint(size)`, never more than the extent issued

use core::ptr;

#[cfg(feature = "logging")]
use tracing::trace;

use super::list::{FreeList, FreeListNode};
use super::strategy::{FirstFit, FitStrategy};
use crate::block::MemoryBlock;
use crate::realloc::try_default_reallocate;
use crate::traits::{Allocator, Capabilities, DeallocateAll, Expand, Initializer, Owns};
use crate::utils::{align_up, checked_align_up};

/// Caches released blocks of a backing allocator
///
/// A block served from a larger cached node keeps only its requested size, so
/// when it is later released past the cache (a full `LimitedSize`, `drop`, or
/// `deallocate_all` over a backing allocator without bulk release) the backing
/// allocator sees `footprint(size)`, which may be smaller than the extent it
/// issued. Backing allocators must therefore not depend on the exact size
/// passed to `deallocate`. The heap ignores it, and a stack treats such a block
/// as non-top and leaves it for `deallocate_all`.
pub struct FreeListAllocator<A: Allocator, S: FitStrategy = FirstFit> {
    inner: A,
    strategy: S,
    list: FreeList,
}

impl<A: Allocator, S: FitStrategy> FreeListAllocator<A, S> {
    pub fn new(inner: A, strategy: S) -> Self {
        const {
            assert!(
                A::ALIGNMENT >= FreeListNode::ALIGN,
                "backing alignment too small for free-list nodes"
            );
        }
        Self {
            inner,
            strategy,
            list: FreeList::new(),
        }
    }

    /// Bytes reserved from the backing allocator for `size` logical bytes
    #[inline]
    fn footprint(size: usize) -> Option<usize> {
        checked_align_up(size.max(FreeListNode::SIZE), A::ALIGNMENT)
    }

    /// Number of cached blocks
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Hands every cached block back to the backing allocator
    fn release_cached(&mut self) {
        while let Some(mut block) = self.list.pop() {
            // SAFETY: cached blocks start where `inner` issued them and do not
            // exceed the issued extent.
            unsafe { self.inner.deallocate(&mut block) };
        }
        self.strategy.clear();
    }
}

impl<A: Allocator + Default, S: FitStrategy + Default> Default for FreeListAllocator<A, S> {
    fn default() -> Self {
        Self::new(A::default(), S::default())
    }
}

impl<A: Allocator, S: FitStrategy> Drop for FreeListAllocator<A, S> {
    fn drop(&mut self) {
        self.release_cached();
    }
}

// SAFETY: every block comes from `inner` (fresh or cached) and cached blocks
// are removed from the list before they are handed out again.
unsafe impl<A: Allocator, S: FitStrategy> Allocator for FreeListAllocator<A, S> {
    const ALIGNMENT: usize = A::ALIGNMENT;
    const CAPABILITIES: Capabilities = A::CAPABILITIES;

    fn init<I: Initializer>(&mut self, initializer: &mut I) {
        self.inner.init(initializer);
        initializer.init(self);
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        if size == 0 {
            return MemoryBlock::NULL;
        }
        let Some(footprint) = Self::footprint(size) else {
            return MemoryBlock::NULL;
        };

        if !self.list.is_empty()
            && let Some(cached) = self.strategy.take(&mut self.list, footprint)
        {
            return MemoryBlock {
                ptr: cached.ptr,
                size,
            };
        }

        let block = self.inner.allocate(footprint);
        if block.is_null() {
            return block;
        }
        MemoryBlock {
            ptr: block.ptr,
            size,
        }
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        self.inner.owns(block)
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
        let (Some(old_footprint), Some(new_footprint)) =
            (Self::footprint(block.size), Self::footprint(new_size))
        else {
            return false;
        };
        if new_footprint > old_footprint {
            let mut outer = MemoryBlock {
                ptr: block.ptr,
                size: old_footprint,
            };
            // SAFETY: `outer` is the extent `inner` issued for this block.
            if !unsafe { self.inner.expand(&mut outer, new_footprint - old_footprint) } {
                return false;
            }
        }
        block.size = new_size;
        true
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        if let Some(done) = unsafe { try_default_reallocate(self, block, new_size) } {
            return done;
        }

        let current = align_up(block.size.max(FreeListNode::SIZE), A::ALIGNMENT);
        let fits_in_place = Self::footprint(new_size).is_some_and(|needed| needed <= current);
        if fits_in_place {
            block.size = new_size;
            return true;
        }

        let new_block = self.allocate(new_size);
        if new_block.is_null() {
            return false;
        }
        // SAFETY: `new_block` was just taken from the cache or `inner` and is
        // disjoint from the live `block`.
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
        let outer = MemoryBlock {
            ptr: block.ptr,
            size: align_up(block.size.max(FreeListNode::SIZE), A::ALIGNMENT),
        };
        // SAFETY: the block's footprint is node-sized and aligned, and the
        // caller no longer uses it.
        if !unsafe { self.strategy.put(&mut self.list, outer) } {
            #[cfg(feature = "logging")]
            trace!(size = outer.size, "free list full, releasing to backing allocator");
            let mut outer = outer;
            // SAFETY: `outer` starts where `inner` issued the block and does
            // not exceed the issued extent.
            unsafe { self.inner.deallocate(&mut outer) };
        }
        *block = MemoryBlock::NULL;
    }

    unsafe fn deallocate_all(&mut self) {
        if !A::CAPABILITIES.contains(Capabilities::DEALLOCATE_ALL) {
            // Outstanding blocks stay live; only the cache can be released.
            self.release_cached();
            return;
        }
        // SAFETY: forwarded caller contract
        unsafe { self.inner.deallocate_all() };
        self.list.clear();
        self.strategy.clear();
    }
}

impl<A: Owns, S: FitStrategy> Owns for FreeListAllocator<A, S> {}
impl<A: Expand, S: FitStrategy> Expand for FreeListAllocator<A, S> {}
impl<A: DeallocateAll, S: FitStrategy> DeallocateAll for FreeListAllocator<A, S> {}
