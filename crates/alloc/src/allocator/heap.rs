//! Heap allocator implementation
//!
//! Thin pass-through to the platform `malloc` family. The platform allocator
//! keeps its own bookkeeping, so blocks can be resized and released without
//! knowing the size they were allocated with.

use core::ffi::c_void;

#[cfg(feature = "logging")]
use tracing::trace;

use crate::block::MemoryBlock;
use crate::realloc::try_default_reallocate;
use crate::traits::Allocator;
use crate::utils::DEFAULT_ALIGNMENT;

/// Wrapper for the platform's `malloc`/`realloc`/`free`
///
/// Stateless and without `owns`: the platform heap offers no membership
/// query, so a `HeapAllocator` may only be the secondary of a fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl HeapAllocator {
    /// Creates a new HeapAllocator
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

// SAFETY: malloc returns memory aligned for any fundamental type, which is at
// least DEFAULT_ALIGNMENT on supported platforms, and never hands out live
// memory twice.
unsafe impl Allocator for HeapAllocator {
    const ALIGNMENT: usize = DEFAULT_ALIGNMENT;

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        if size == 0 {
            return MemoryBlock::NULL;
        }
        // SAFETY: malloc accepts any non-zero size.
        let ptr = unsafe { libc::malloc(size) }.cast::<u8>();
        if ptr.is_null() {
            #[cfg(feature = "logging")]
            trace!(size, "heap allocation failed");
            return MemoryBlock::NULL;
        }
        MemoryBlock { ptr, size }
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        if let Some(done) = unsafe { try_default_reallocate(self, block, new_size) } {
            return done;
        }
        // SAFETY: block.ptr came from malloc/realloc and is still live.
        let ptr = unsafe { libc::realloc(block.ptr.cast::<c_void>(), new_size) }.cast::<u8>();
        if ptr.is_null() {
            return false;
        }
        *block = MemoryBlock {
            ptr,
            size: new_size,
        };
        true
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        if block.is_null() {
            return;
        }
        // SAFETY: block.ptr came from malloc/realloc and is still live.
        unsafe { libc::free(block.ptr.cast::<c_void>()) };
        *block = MemoryBlock::NULL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::is_aligned_ptr;

    #[test]
    fn test_allocate_and_free() {
        let mut heap = HeapAllocator::new();
        assert!(heap.allocate(0).is_null());

        let mut block = heap.allocate(100);
        assert_eq!(block.size(), 100);
        assert!(is_aligned_ptr(block.ptr(), HeapAllocator::ALIGNMENT));
        // SAFETY: block comes from this allocator
        unsafe { heap.deallocate(&mut block) };
        assert!(block.is_null());
    }

    #[test]
    fn test_reallocate_preserves_contents() {
        let mut heap = HeapAllocator::new();
        let mut block = heap.allocate(16);
        // SAFETY: block is live and exclusively ours
        unsafe {
            block.as_mut_slice().copy_from_slice(&[7u8; 16]);
            assert!(heap.reallocate(&mut block, 4096));
            assert_eq!(block.size(), 4096);
            assert_eq!(&block.as_slice()[..16], &[7u8; 16]);
            assert!(heap.reallocate(&mut block, 0));
        }
        assert!(block.is_null());
        assert!(!heap.owns(&block));
    }
}
