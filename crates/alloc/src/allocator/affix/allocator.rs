//! Affix allocator implementation
//!
//! # Safety
//!
//! Every block handed out is the middle of a larger block from the backing
//! allocator, with a prefix value in front and a suffix value behind:
//!
//! ```text
//! [prefix: P, padded][user bytes, padded to ALIGNMENT][suffix: S, padded]
//! ^ outer.ptr        ^ block.ptr
//! ```
//!
//! ## Invariants
//!
//! - `PREFIX_SIZE` and `SUFFIX_SIZE` are the affix sizes rounded up to
//!   `A::ALIGNMENT`, or zero for zero-sized affixes
//! - the outer block of a user block of size `n` is
//!   `align_up(n) + PREFIX_SIZE + SUFFIX_SIZE` bytes starting at
//!   `block.ptr - PREFIX_SIZE`
//! - each affix value is constructed once on allocate, moved (never copied)
//!   when the outer block changes, and dropped once on deallocate

use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::block::MemoryBlock;
use crate::realloc::try_default_reallocate;
use crate::traits::{Allocator, Capabilities, Expand, Initializer, Owns};
use crate::utils::{align_up, checked_align_up};

/// Bytes reserved for an affix of type `T`
const fn affix_size<T>(alignment: usize) -> usize {
    if size_of::<T>() == 0 {
        0
    } else {
        align_up(size_of::<T>(), alignment)
    }
}

/// Attaches a prefix and a suffix value to every block
///
/// Use `()` for an affix that is not needed.
pub struct AffixAllocator<A: Allocator, P: Default = (), S: Default = ()> {
    inner: A,
    _affixes: PhantomData<(P, S)>,
}

impl<A: Allocator, P: Default, S: Default> AffixAllocator<A, P, S> {
    /// Bytes reserved in front of every block
    pub const PREFIX_SIZE: usize = affix_size::<P>(A::ALIGNMENT);
    /// Bytes reserved behind every block
    pub const SUFFIX_SIZE: usize = affix_size::<S>(A::ALIGNMENT);

    pub fn new(inner: A) -> Self {
        const {
            assert!(
                align_of::<P>() <= A::ALIGNMENT && align_of::<S>() <= A::ALIGNMENT,
                "affix alignment exceeds the backing allocator's alignment"
            );
        }
        Self {
            inner,
            _affixes: PhantomData,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    /// Size of the backing block for `size` user bytes
    #[inline]
    fn outer_size(size: usize) -> Option<usize> {
        checked_align_up(size, A::ALIGNMENT)?.checked_add(Self::PREFIX_SIZE + Self::SUFFIX_SIZE)
    }

    #[inline]
    fn outer_block(block: &MemoryBlock) -> MemoryBlock {
        MemoryBlock {
            ptr: block.ptr.wrapping_sub(Self::PREFIX_SIZE),
            size: align_up(block.size, A::ALIGNMENT) + Self::PREFIX_SIZE + Self::SUFFIX_SIZE,
        }
    }

    #[inline]
    fn inner_block(outer: &MemoryBlock, size: usize) -> MemoryBlock {
        MemoryBlock {
            ptr: outer.ptr.wrapping_add(Self::PREFIX_SIZE),
            size,
        }
    }

    #[inline]
    fn prefix_ptr(outer: &MemoryBlock) -> *mut P {
        outer.cast()
    }

    #[inline]
    fn suffix_ptr(outer: &MemoryBlock) -> *mut S {
        outer.ptr.wrapping_add(outer.size - Self::SUFFIX_SIZE).cast()
    }

    /// Prefix value in front of `block`
    ///
    /// Returns `None` for the null block and when `P` is zero-sized.
    pub fn prefix(&self, block: &MemoryBlock) -> Option<NonNull<P>> {
        self.debug_assert_owned(block);
        if block.is_null() || Self::PREFIX_SIZE == 0 {
            return None;
        }
        NonNull::new(Self::prefix_ptr(&Self::outer_block(block)))
    }

    /// Suffix value behind `block`
    ///
    /// Returns `None` for the null block and when `S` is zero-sized.
    pub fn suffix(&self, block: &MemoryBlock) -> Option<NonNull<S>> {
        self.debug_assert_owned(block);
        if block.is_null() || Self::SUFFIX_SIZE == 0 {
            return None;
        }
        NonNull::new(Self::suffix_ptr(&Self::outer_block(block)))
    }

    #[inline]
    fn debug_assert_owned(&self, block: &MemoryBlock) {
        debug_assert!(
            block.is_null() || !A::CAPABILITIES.contains(Capabilities::OWNS) || self.owns(block),
            "block was not issued by this affix allocator"
        );
    }
}

impl<A: Allocator + Default, P: Default, S: Default> Default for AffixAllocator<A, P, S> {
    fn default() -> Self {
        Self::new(A::default())
    }
}

// SAFETY: user blocks are disjoint sub-ranges of disjoint backing blocks,
// aligned because both the backing block and PREFIX_SIZE are multiples of
// A::ALIGNMENT.
unsafe impl<A: Allocator, P: Default, S: Default> Allocator for AffixAllocator<A, P, S> {
    const ALIGNMENT: usize = A::ALIGNMENT;
    const CAPABILITIES: Capabilities =
        A::CAPABILITIES.intersection(Capabilities::OWNS.union(Capabilities::EXPAND));

    fn init<I: Initializer>(&mut self, initializer: &mut I) {
        self.inner.init(initializer);
        initializer.init(self);
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        if size == 0 {
            return MemoryBlock::NULL;
        }
        let Some(outer_size) = Self::outer_size(size) else {
            return MemoryBlock::NULL;
        };
        let outer = self.inner.allocate(outer_size);
        if outer.is_null() {
            return outer;
        }
        // SAFETY: both affix slots lie inside the fresh outer block and are
        // aligned for their types.
        unsafe {
            Self::prefix_ptr(&outer).write(P::default());
            Self::suffix_ptr(&outer).write(S::default());
        }
        Self::inner_block(&outer, size)
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        !block.is_null() && self.inner.owns(&Self::outer_block(block))
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
        let Some(aligned_new) = checked_align_up(new_size, A::ALIGNMENT) else {
            return false;
        };
        let required = aligned_new - align_up(block.size, A::ALIGNMENT);
        if required == 0 {
            block.size = new_size;
            return true;
        }

        let mut outer = Self::outer_block(block);
        let old_suffix = Self::suffix_ptr(&outer);
        // SAFETY: `outer` is the backing block; growing in place keeps the old
        // suffix bytes intact so the value can be moved to the new end.
        unsafe {
            if !self.inner.expand(&mut outer, required) {
                return false;
            }
            let suffix = old_suffix.read();
            Self::suffix_ptr(&outer).write(suffix);
        }
        *block = Self::inner_block(&outer, new_size);
        true
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        if let Some(done) = unsafe { try_default_reallocate(self, block, new_size) } {
            return done;
        }
        let Some(outer_size) = Self::outer_size(new_size) else {
            return false;
        };

        let mut outer = Self::outer_block(block);
        // SAFETY: the affix values are moved out before the backing allocator
        // may copy, truncate or free the old block, and moved back into
        // whichever block holds the data afterwards.
        unsafe {
            let prefix = Self::prefix_ptr(&outer).read();
            let suffix = Self::suffix_ptr(&outer).read();
            let moved = self.inner.reallocate(&mut outer, outer_size);
            Self::prefix_ptr(&outer).write(prefix);
            Self::suffix_ptr(&outer).write(suffix);
            if !moved {
                return false;
            }
        }
        *block = Self::inner_block(&outer, new_size);
        true
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        if block.is_null() {
            return;
        }
        let mut outer = Self::outer_block(block);
        // SAFETY: both affix values were constructed on allocate and are
        // dropped exactly once here.
        unsafe {
            Self::prefix_ptr(&outer).drop_in_place();
            Self::suffix_ptr(&outer).drop_in_place();
            self.inner.deallocate(&mut outer);
        }
        *block = MemoryBlock::NULL;
    }
}

impl<A: Owns, P: Default, S: Default> Owns for AffixAllocator<A, P, S> {}
impl<A: Expand, P: Default, S: Default> Expand for AffixAllocator<A, P, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::StackAllocator;

    type Stack = StackAllocator<1024, 8>;

    #[test]
    fn test_affix_sizes() {
        assert_eq!(AffixAllocator::<Stack, u32, u64>::PREFIX_SIZE, 8);
        assert_eq!(AffixAllocator::<Stack, u32, u64>::SUFFIX_SIZE, 8);
        assert_eq!(AffixAllocator::<Stack>::PREFIX_SIZE, 0);
        assert_eq!(AffixAllocator::<Stack, [u8; 12], ()>::PREFIX_SIZE, 16);
    }

    #[test]
    fn test_layout_around_block() {
        let mut affix = AffixAllocator::<Stack, u32, u32>::default();
        let block = affix.allocate(10);
        assert_eq!(block.size(), 10);
        assert_eq!(block.ptr().cast_const(), affix.inner().base().wrapping_add(8));
        assert_eq!(affix.inner().used(), 32);

        let prefix = affix.prefix(&block).expect("prefix");
        let suffix = affix.suffix(&block).expect("suffix");
        assert_eq!(prefix.as_ptr().addr(), block.addr() - 8);
        assert_eq!(suffix.as_ptr().addr(), block.addr() + 16);
        // SAFETY: affix values were default-constructed on allocate
        unsafe {
            assert_eq!(*prefix.as_ptr(), 0);
            assert_eq!(*suffix.as_ptr(), 0);
        }
    }

    #[test]
    fn test_no_affix_is_transparent() {
        let mut affix = AffixAllocator::<Stack>::default();
        let block = affix.allocate(16);
        assert_eq!(block.ptr().cast_const(), affix.inner().base());
        assert!(affix.prefix(&block).is_none());
        assert!(affix.suffix(&block).is_none());
    }

    #[test]
    fn test_expand_moves_suffix() {
        let mut affix = AffixAllocator::<Stack, u32, u32>::default();
        let mut block = affix.allocate(8);
        // SAFETY: block comes from this allocator
        unsafe {
            *affix.suffix(&block).expect("suffix").as_ptr() = 0xF00D_BAAD;
            assert!(affix.expand(&mut block, 4));
            assert_eq!(block.size(), 12);
            assert_eq!(*affix.suffix(&block).expect("suffix").as_ptr(), 0xF00D_BAAD);
            assert_eq!(affix.inner().used(), 32);
        }
    }

    #[test]
    fn test_owns_and_deallocate() {
        let mut affix = AffixAllocator::<Stack, u64, u64>::default();
        let mut block = affix.allocate(24);
        assert!(affix.owns(&block));
        assert!(!affix.owns(&MemoryBlock::NULL));
        // SAFETY: block comes from this allocator
        unsafe { affix.deallocate(&mut block) };
        assert!(block.is_null());
        assert_eq!(affix.inner().used(), 0);
    }
}
