//! The memory block exchanged by every allocator operation
//!
//! A [`MemoryBlock`] is a plain `{ptr, size}` pair. It does not own memory:
//! the allocator that produced a block is the only one allowed to resize or
//! release it.
//!
//! ## Invariants
//!
//! - `ptr` is null iff `size` is zero
//! - [`MemoryBlock::NULL`] is the canonical empty value and the failure
//!   sentinel of `allocate`
//! - two blocks are equal iff both pointer and size match

use core::ptr;
use core::slice;

/// A pointer and the logical byte length behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryBlock {
    pub(crate) ptr: *mut u8,
    pub(crate) size: usize,
}

impl MemoryBlock {
    /// The empty block: null pointer, zero size
    pub const NULL: Self = Self {
        ptr: ptr::null_mut(),
        size: 0,
    };

    /// Creates a block from a raw pointer and size
    ///
    /// Null pointers pair only with zero size.
    #[inline]
    pub fn new(ptr: *mut u8, size: usize) -> Self {
        debug_assert_eq!(
            ptr.is_null(),
            size == 0,
            "memory block pointer must be null iff size is zero"
        );
        Self { ptr, size }
    }

    /// Start of the block
    #[inline]
    pub fn ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Logical size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Address of the first byte
    #[inline]
    pub fn addr(&self) -> usize {
        self.ptr.addr()
    }

    /// One past the last byte of the block
    #[inline]
    pub fn end(&self) -> *mut u8 {
        self.ptr.wrapping_add(self.size)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Block start as a typed pointer
    #[inline]
    pub fn cast<T>(&self) -> *mut T {
        self.ptr.cast()
    }

    /// Returns the block and leaves [`MemoryBlock::NULL`] in its place
    #[inline]
    pub fn take(&mut self) -> Self {
        core::mem::replace(self, Self::NULL)
    }

    /// Views the block as bytes
    ///
    /// # Safety
    ///
    /// The block must be live and its bytes initialized.
    #[inline]
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.is_null() {
            return &[];
        }
        // SAFETY: caller guarantees the block is live and initialized.
        unsafe { slice::from_raw_parts(self.ptr, self.size) }
    }

    /// Views the block as mutable bytes
    ///
    /// # Safety
    ///
    /// The block must be live, its bytes initialized, and no other reference
    /// to them may exist.
    #[inline]
    pub unsafe fn as_mut_slice<'a>(&mut self) -> &'a mut [u8] {
        if self.is_null() {
            return &mut [];
        }
        // SAFETY: caller guarantees exclusive access to a live block.
        unsafe { slice::from_raw_parts_mut(self.ptr, self.size) }
    }
}

impl Default for MemoryBlock {
    fn default() -> Self {
        Self::NULL
    }
}
