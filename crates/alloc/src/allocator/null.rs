//! Null allocator implementation
//!
//! Always fails. Useful as the terminator of a composition, or as the
//! secondary half of a fallback when only the primary should ever serve.

use crate::block::MemoryBlock;
use crate::traits::{Allocator, Capabilities, DeallocateAll, Expand, Owns};

/// Allocator that never allocates
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAllocator;

impl NullAllocator {
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

// SAFETY: never returns a non-null block.
unsafe impl Allocator for NullAllocator {
    const ALIGNMENT: usize = 64 * 1024;
    const CAPABILITIES: Capabilities = Capabilities::all();

    #[inline]
    fn allocate(&mut self, _size: usize) -> MemoryBlock {
        MemoryBlock::NULL
    }

    #[inline]
    fn owns(&self, block: &MemoryBlock) -> bool {
        block.is_null()
    }

    unsafe fn expand(&mut self, block: &mut MemoryBlock, _delta: usize) -> bool {
        debug_assert!(block.is_null(), "null allocator handed a live block");
        false
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, _new_size: usize) -> bool {
        debug_assert!(block.is_null(), "null allocator handed a live block");
        false
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        debug_assert!(block.is_null(), "null allocator handed a live block");
    }

    unsafe fn deallocate_all(&mut self) {}
}

impl Owns for NullAllocator {}
impl Expand for NullAllocator {}
impl DeallocateAll for NullAllocator {}
