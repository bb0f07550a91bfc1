//! Reallocation paths shared by the composites

use core::ptr;

use crate::block::MemoryBlock;
use crate::traits::Allocator;

/// Handles the reallocate cases every allocator treats the same way
///
/// - same size: nothing to do
/// - `new_size == 0`: deallocate
/// - null block: allocate
///
/// Returns `Some(result)` when one of them applied.
///
/// # Safety
///
/// `block` must be null or a live block from `allocator`.
#[inline]
pub(crate) unsafe fn try_default_reallocate<A: Allocator + ?Sized>(
    allocator: &mut A,
    block: &mut MemoryBlock,
    new_size: usize,
) -> Option<bool> {
    if block.size == new_size {
        return Some(true);
    }
    if new_size == 0 {
        // SAFETY: forwarded caller contract
        unsafe { allocator.deallocate(block) };
        return Some(true);
    }
    if block.is_null() {
        *block = allocator.allocate(new_size);
        return Some(!block.is_null());
    }
    None
}

/// Moves `block` from `original` into a fresh allocation from `target`
///
/// Copies `min(old, new)` bytes and releases the old block. On failure
/// `block` still belongs to `original` and is unchanged.
///
/// # Safety
///
/// `block` must be a live, non-null block from `original`.
pub(crate) unsafe fn reallocate_with_new_allocator<O, T>(
    original: &mut O,
    target: &mut T,
    block: &mut MemoryBlock,
    new_size: usize,
) -> bool
where
    O: Allocator + ?Sized,
    T: Allocator + ?Sized,
{
    let new_block = target.allocate(new_size);
    if new_block.is_null() {
        return false;
    }

    // SAFETY: both blocks are live and were issued by different allocators,
    // so they cannot overlap; the copy stays within the smaller of the two.
    unsafe {
        ptr::copy_nonoverlapping(block.ptr, new_block.ptr, block.size.min(new_size));
        original.deallocate(block);
    }
    *block = new_block;
    true
}
