//! Fallback allocator implementation
//!
//! Serves from a primary allocator and turns to a secondary one when the
//! primary fails. Routing of existing blocks relies on the primary's `owns`,
//! so the primary must implement [`Owns`].
//!
//! A block may come from either child, so the guaranteed alignment is the
//! smaller of the two.

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use crate::block::MemoryBlock;
use crate::realloc::{reallocate_with_new_allocator, try_default_reallocate};
use crate::traits::{Allocator, Capabilities, DeallocateAll, Expand, Initializer, Owns};
use crate::utils::min_alignment;

/// Primary allocator with a secondary to fall back on
#[derive(Debug, Default)]
pub struct Fallback<P: Owns, S: Allocator> {
    primary: P,
    secondary: S,
}

impl<P: Owns, S: Allocator> Fallback<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut P {
        &mut self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    pub fn secondary_mut(&mut self) -> &mut S {
        &mut self.secondary
    }
}

// SAFETY: every block comes from exactly one child, and `primary.owns`
// decides which one releases it.
unsafe impl<P: Owns, S: Allocator> Allocator for Fallback<P, S> {
    const ALIGNMENT: usize = min_alignment(P::ALIGNMENT, S::ALIGNMENT);
    const CAPABILITIES: Capabilities = Capabilities::routed(P::CAPABILITIES, S::CAPABILITIES);

    fn init<I: Initializer>(&mut self, initializer: &mut I) {
        self.primary.init(initializer);
        self.secondary.init(initializer);
        initializer.init(self);
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        if size == 0 {
            return MemoryBlock::NULL;
        }
        let block = self.primary.allocate(size);
        if !block.is_null() {
            return block;
        }
        #[cfg(feature = "logging")]
        trace!(size, "primary allocator failed, trying secondary");
        self.secondary.allocate(size)
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        self.primary.owns(block) || self.secondary.owns(block)
    }

    unsafe fn expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool {
        if delta == 0 {
            return true;
        }
        if block.is_null() {
            *block = self.allocate(delta);
            return !block.is_null();
        }
        // SAFETY: the block is routed to the child that issued it.
        unsafe {
            if self.primary.owns(block) {
                P::CAPABILITIES.contains(Capabilities::EXPAND)
                    && self.primary.expand(block, delta)
            } else {
                S::CAPABILITIES.contains(Capabilities::EXPAND)
                    && self.secondary.expand(block, delta)
            }
        }
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        if let Some(done) = unsafe { try_default_reallocate(self, block, new_size) } {
            return done;
        }

        // SAFETY: the block is resized by the child that issued it, or moved
        // from that child to the other one.
        unsafe {
            if self.primary.owns(block) {
                if self.primary.reallocate(block, new_size) {
                    return true;
                }
                #[cfg(feature = "logging")]
                debug!(size = block.size, new_size, "migrating block to secondary allocator");
                reallocate_with_new_allocator(
                    &mut self.primary,
                    &mut self.secondary,
                    block,
                    new_size,
                )
            } else {
                if self.secondary.reallocate(block, new_size) {
                    return true;
                }
                #[cfg(feature = "logging")]
                debug!(size = block.size, new_size, "migrating block to primary allocator");
                reallocate_with_new_allocator(
                    &mut self.secondary,
                    &mut self.primary,
                    block,
                    new_size,
                )
            }
        }
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        if block.is_null() {
            return;
        }
        // SAFETY: the block is released by the child that issued it.
        unsafe {
            if self.primary.owns(block) {
                self.primary.deallocate(block);
            } else {
                self.secondary.deallocate(block);
            }
        }
    }

    unsafe fn deallocate_all(&mut self) {
        // SAFETY: forwarded caller contract
        unsafe {
            self.primary.deallocate_all();
            self.secondary.deallocate_all();
        }
    }
}

impl<P: Owns, S: Owns> Owns for Fallback<P, S> {}
impl<P: Owns + Expand, S: Expand> Expand for Fallback<P, S> {}
impl<P: Owns + DeallocateAll, S: DeallocateAll> DeallocateAll for Fallback<P, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{HeapAllocator, NullAllocator, StackAllocator};

    type Small = StackAllocator<0x100, 8>;
    type Large = StackAllocator<0x1000, 8>;

    #[test]
    fn test_secondary_serves_oversized_requests() {
        let mut fallback = Fallback::new(Small::new(), Large::new());
        let small = fallback.allocate(0x10);
        let large = fallback.allocate(0x200);

        assert!(fallback.primary().owns(&small));
        assert!(!fallback.primary().owns(&large));
        assert!(fallback.secondary().owns(&large));
        assert!(fallback.owns(&large));
        assert_eq!(large.size(), 0x200);
    }

    #[test]
    fn test_reallocate_migrates_to_secondary() {
        let mut fallback = Fallback::new(Small::new(), Large::new());
        let mut block = fallback.allocate(0x80);
        // SAFETY: block comes from this allocator
        unsafe {
            block.as_mut_slice().fill(0x42);
            assert!(fallback.reallocate(&mut block, 0x180));
            assert!(fallback.secondary().owns(&block));
            assert_eq!(&block.as_slice()[..0x80], &[0x42; 0x80]);
        }
        assert_eq!(fallback.primary().used(), 0);
    }

    #[test]
    fn test_deallocate_routes_by_owner() {
        let mut fallback = Fallback::new(Small::new(), Large::new());
        let mut a = fallback.allocate(0x20);
        let mut b = fallback.allocate(0x400);
        // SAFETY: blocks come from this allocator
        unsafe {
            fallback.deallocate(&mut b);
            fallback.deallocate(&mut a);
        }
        assert_eq!(fallback.primary().used(), 0);
        assert_eq!(fallback.secondary().used(), 0);
    }

    #[test]
    fn test_null_secondary_never_serves() {
        let mut fallback = Fallback::new(Small::new(), NullAllocator);
        assert!(fallback.allocate(0x200).is_null());
        assert!(fallback.allocate(0).is_null());
        assert_eq!(Fallback::<Small, NullAllocator>::ALIGNMENT, 8);
    }

    #[test]
    fn test_capabilities() {
        assert_eq!(Fallback::<Small, Large>::CAPABILITIES, Capabilities::all());
        assert_eq!(
            Fallback::<Small, HeapAllocator>::CAPABILITIES,
            Capabilities::EXPAND
        );
    }
}
