//! Size-prefixed allocator
//!
//! An [`AffixAllocator`] whose prefix is the block's logical size. Because the
//! size travels with the memory, `owns`, `expand`, `reallocate` and
//! `deallocate` only need the block's pointer; the size in the caller's block
//! is ignored.

use super::AffixAllocator;
use crate::block::MemoryBlock;
use crate::traits::{Allocator, Capabilities, Expand, Initializer, Owns};

/// Affix allocator that records every block's size in front of it
pub struct PrefixedSizeAllocator<A: Allocator> {
    affix: AffixAllocator<A, usize, ()>,
}

impl<A: Allocator> PrefixedSizeAllocator<A> {
    const PREFIX_SIZE: usize = AffixAllocator::<A, usize, ()>::PREFIX_SIZE;

    pub fn new(inner: A) -> Self {
        Self {
            affix: AffixAllocator::new(inner),
        }
    }

    pub fn inner(&self) -> &A {
        self.affix.inner()
    }

    pub fn inner_mut(&mut self) -> &mut A {
        self.affix.inner_mut()
    }

    /// Size recorded for the block starting at `block.ptr()`
    ///
    /// # Safety
    ///
    /// `block` must be a live, non-null block from this allocator.
    pub unsafe fn stored_size(&self, block: &MemoryBlock) -> usize {
        // SAFETY: live blocks carry an initialized usize prefix.
        unsafe { block.ptr.sub(Self::PREFIX_SIZE).cast::<usize>().read() }
    }

    /// `block` with its size replaced by the recorded one
    unsafe fn sized(&self, block: &MemoryBlock) -> MemoryBlock {
        if block.is_null() {
            return MemoryBlock::NULL;
        }
        MemoryBlock {
            ptr: block.ptr,
            // SAFETY: forwarded caller contract
            size: unsafe { self.stored_size(block) },
        }
    }

    fn record_size(&self, block: &MemoryBlock) {
        if let Some(prefix) = self.affix.prefix(block) {
            // SAFETY: the prefix slot holds a live usize.
            unsafe { prefix.as_ptr().write(block.size) };
        }
    }
}

impl<A: Allocator + Default> Default for PrefixedSizeAllocator<A> {
    fn default() -> Self {
        Self::new(A::default())
    }
}

// SAFETY: delegates to the affix allocator, which upholds the contract.
unsafe impl<A: Allocator> Allocator for PrefixedSizeAllocator<A> {
    const ALIGNMENT: usize = A::ALIGNMENT;
    const CAPABILITIES: Capabilities = <AffixAllocator<A, usize, ()> as Allocator>::CAPABILITIES;

    fn init<I: Initializer>(&mut self, initializer: &mut I) {
        self.affix.inner_mut().init(initializer);
        initializer.init(self);
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        let block = self.affix.allocate(size);
        if !block.is_null() {
            self.record_size(&block);
        }
        block
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        if block.is_null() {
            return false;
        }
        // The prefix may only be read once the backing allocator vouches for it.
        let prefix = MemoryBlock {
            ptr: block.ptr.wrapping_sub(Self::PREFIX_SIZE),
            size: Self::PREFIX_SIZE,
        };
        if !self.affix.inner().owns(&prefix) {
            return false;
        }
        // SAFETY: the prefix bytes belong to a live block of the backing allocator.
        self.affix.owns(&unsafe { self.sized(block) })
    }

    unsafe fn expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool {
        // SAFETY: forwarded caller contract
        unsafe {
            let mut sized = self.sized(block);
            if !self.affix.expand(&mut sized, delta) {
                return false;
            }
            if !sized.is_null() {
                self.record_size(&sized);
            }
            *block = sized;
        }
        true
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        unsafe {
            let mut sized = self.sized(block);
            if !self.affix.reallocate(&mut sized, new_size) {
                return false;
            }
            if !sized.is_null() {
                self.record_size(&sized);
            }
            *block = sized;
        }
        true
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        // SAFETY: forwarded caller contract
        unsafe {
            let mut sized = self.sized(block);
            self.affix.deallocate(&mut sized);
        }
        *block = MemoryBlock::NULL;
    }
}

impl<A: Owns> Owns for PrefixedSizeAllocator<A> {}
impl<A: Expand> Expand for PrefixedSizeAllocator<A> {}
