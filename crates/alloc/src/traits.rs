//! The allocator contract and its optional capabilities
//!
//! Every allocator in this crate implements [`Allocator`]. `allocate`,
//! `reallocate` and `deallocate` are mandatory; `owns`, `expand` and
//! `deallocate_all` are optional and come with conservative defaults.
//!
//! Optional support is declared twice:
//! - as a [`Capabilities`] constant that composites combine in `const`
//!   context and that callers can inspect at run time;
//! - as the marker traits [`Owns`], [`Expand`] and [`DeallocateAll`], which
//!   let composites require a capability through an ordinary trait bound and
//!   re-export it only when their children allow it.
//!
//! # Safety
//!
//! `Allocator` is an `unsafe trait`. Implementors promise that:
//! - a non-null block returned by `allocate`, `expand` or `reallocate` is
//!   valid for reads and writes of exactly `block.size()` bytes
//! - its pointer is aligned to [`Allocator::ALIGNMENT`]
//! - live blocks never overlap
//! - a failed `expand` or `reallocate` leaves the block unchanged
//!
//! The mutating operations are `unsafe fn`: callers promise that the block
//! they pass was produced by this allocator (or is the null block) and has not
//! been released since.

use bitflags::bitflags;

use crate::block::MemoryBlock;

bitflags! {
    /// Optional operations an allocator supports
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// `owns` answers membership queries
        const OWNS = 1;
        /// `expand` can grow a block in place
        const EXPAND = 1 << 1;
        /// `deallocate_all` releases everything at once
        const DEALLOCATE_ALL = 1 << 2;
    }
}

impl Capabilities {
    /// Capabilities of a composite that routes each block to one of two
    /// children: membership and bulk release need both, expansion needs either.
    pub const fn routed(a: Self, b: Self) -> Self {
        a.intersection(b)
            .union(a.union(b).intersection(Self::EXPAND))
    }
}

/// The uniform allocator contract
pub unsafe trait Allocator {
    /// Alignment of every block this allocator hands out, a power of two
    const ALIGNMENT: usize;

    /// Optional operations this allocator implements
    const CAPABILITIES: Capabilities = Capabilities::empty();

    /// Alignment of every block this allocator hands out
    #[inline]
    fn alignment(&self) -> usize {
        Self::ALIGNMENT
    }

    /// Visits this allocator with an initializer
    ///
    /// Composites visit their children first, then themselves.
    fn init<I: Initializer>(&mut self, initializer: &mut I)
    where
        Self: Sized,
    {
        initializer.init(self);
    }

    /// Allocates `size` bytes
    ///
    /// Returns the null block when `size` is zero or memory is exhausted. On
    /// success the block's size is exactly `size`.
    fn allocate(&mut self, size: usize) -> MemoryBlock;

    /// Whether `block` was issued by this allocator
    fn owns(&self, block: &MemoryBlock) -> bool {
        let _ = block;
        false
    }

    /// Grows `block` in place by `delta` bytes
    ///
    /// `delta == 0` succeeds without change. A null block with a positive
    /// delta behaves like `allocate(delta)`.
    ///
    /// # Safety
    ///
    /// `block` must be null or a live block from this allocator.
    unsafe fn expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool {
        let _ = (block, delta);
        false
    }

    /// Resizes `block` to `new_size`, moving it if needed
    ///
    /// `new_size == 0` deallocates and succeeds. A null block is allocated.
    /// On failure `block` is left untouched.
    ///
    /// # Safety
    ///
    /// `block` must be null or a live block from this allocator.
    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool;

    /// Releases `block` and resets it to null
    ///
    /// # Safety
    ///
    /// `block` must be null or a live block from this allocator.
    unsafe fn deallocate(&mut self, block: &mut MemoryBlock);

    /// Releases everything this allocator has issued
    ///
    /// # Safety
    ///
    /// Every outstanding block becomes dangling.
    unsafe fn deallocate_all(&mut self) {}
}

/// Marker for allocators that implement [`Allocator::owns`]
pub trait Owns: Allocator {}

/// Marker for allocators that implement [`Allocator::expand`]
pub trait Expand: Allocator {}

/// Marker for allocators that implement [`Allocator::deallocate_all`]
pub trait DeallocateAll: Allocator {}

/// Visitor passed through an allocator tree by [`Allocator::init`]
pub trait Initializer {
    fn init<A: Allocator>(&mut self, allocator: &mut A);
}

/// Initializer that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInitializer;

impl Initializer for NoopInitializer {
    #[inline]
    fn init<A: Allocator>(&mut self, _allocator: &mut A) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routed_capabilities() {
        let all = Capabilities::all();
        let none = Capabilities::empty();
        assert_eq!(Capabilities::routed(all, all), all);
        assert_eq!(Capabilities::routed(all, none), Capabilities::EXPAND);
        assert_eq!(Capabilities::routed(none, none), none);
        assert_eq!(
            Capabilities::routed(Capabilities::OWNS, Capabilities::OWNS | Capabilities::EXPAND),
            Capabilities::OWNS | Capabilities::EXPAND
        );
    }
}
