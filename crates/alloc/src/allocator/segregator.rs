//! Size-segregating allocator implementation
//!
//! Requests of at most `THRESHOLD` bytes go to the small allocator, larger
//! ones to the large allocator. Existing blocks are routed the same way by
//! their current size, so a block never needs an ownership query to find its
//! way home.
//!
//! ## Invariants
//!
//! - a block of size `<= THRESHOLD` lives in the small allocator, any other
//!   block lives in the large one
//! - `reallocate` across the threshold migrates the block; `expand` across it
//!   fails

#[cfg(feature = "logging")]
use tracing::debug;

use crate::block::MemoryBlock;
use crate::realloc::{reallocate_with_new_allocator, try_default_reallocate};
use crate::traits::{Allocator, Capabilities, DeallocateAll, Expand, Initializer, Owns};
use crate::utils::{max_alignment, min_alignment};

/// Routes requests to one of two allocators by size
pub struct Segregator<Small: Allocator, Large: Allocator, const THRESHOLD: usize> {
    small: Small,
    large: Large,
}

impl<Small, Large, const THRESHOLD: usize> Segregator<Small, Large, THRESHOLD>
where
    Small: Allocator,
    Large: Allocator,
{
    pub fn new(small: Small, large: Large) -> Self {
        const {
            assert!(THRESHOLD > 0, "segregator threshold must be positive");
            assert!(
                THRESHOLD % max_alignment(Small::ALIGNMENT, Large::ALIGNMENT) == 0,
                "segregator threshold must be a multiple of both alignments"
            );
        }
        Self { small, large }
    }

    #[inline]
    pub const fn is_small(size: usize) -> bool {
        size <= THRESHOLD
    }

    pub fn small(&self) -> &Small {
        &self.small
    }

    pub fn small_mut(&mut self) -> &mut Small {
        &mut self.small
    }

    pub fn large(&self) -> &Large {
        &self.large
    }

    pub fn large_mut(&mut self) -> &mut Large {
        &mut self.large
    }
}

impl<Small, Large, const THRESHOLD: usize> Default for Segregator<Small, Large, THRESHOLD>
where
    Small: Allocator + Default,
    Large: Allocator + Default,
{
    fn default() -> Self {
        Self::new(Small::default(), Large::default())
    }
}

// SAFETY: every block is issued by exactly one child, and its size tells
// which one.
unsafe impl<Small, Large, const THRESHOLD: usize> Allocator for Segregator<Small, Large, THRESHOLD>
where
    Small: Allocator,
    Large: Allocator,
{
    const ALIGNMENT: usize = min_alignment(Small::ALIGNMENT, Large::ALIGNMENT);
    const CAPABILITIES: Capabilities =
        Capabilities::routed(Small::CAPABILITIES, Large::CAPABILITIES);

    fn init<I: Initializer>(&mut self, initializer: &mut I) {
        self.small.init(initializer);
        self.large.init(initializer);
        initializer.init(self);
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        if size == 0 {
            return MemoryBlock::NULL;
        }
        if Self::is_small(size) {
            self.small.allocate(size)
        } else {
            self.large.allocate(size)
        }
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        if Self::is_small(block.size) {
            self.small.owns(block)
        } else {
            self.large.owns(block)
        }
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
        // SAFETY: the block is routed to the child that issued it.
        unsafe {
            match (Self::is_small(block.size), Self::is_small(new_size)) {
                (true, true) => self.small.expand(block, delta),
                (false, false) => self.large.expand(block, delta),
                _ => false,
            }
        }
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        if let Some(done) = unsafe { try_default_reallocate(self, block, new_size) } {
            return done;
        }

        // SAFETY: the block is resized by the child that issued it, or moved
        // between children when it crosses the threshold.
        unsafe {
            match (Self::is_small(block.size), Self::is_small(new_size)) {
                (true, true) => self.small.reallocate(block, new_size),
                (false, false) => self.large.reallocate(block, new_size),
                (true, false) => {
                    #[cfg(feature = "logging")]
                    debug!(size = block.size, new_size, "migrating block to large allocator");
                    reallocate_with_new_allocator(&mut self.small, &mut self.large, block, new_size)
                },
                (false, true) => {
                    #[cfg(feature = "logging")]
                    debug!(size = block.size, new_size, "migrating block to small allocator");
                    reallocate_with_new_allocator(&mut self.large, &mut self.small, block, new_size)
                },
            }
        }
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        // SAFETY: the block is released by the child that issued it.
        unsafe {
            if Self::is_small(block.size) {
                self.small.deallocate(block);
            } else {
                self.large.deallocate(block);
            }
        }
    }

    unsafe fn deallocate_all(&mut self) {
        // SAFETY: forwarded caller contract
        unsafe {
            self.small.deallocate_all();
            self.large.deallocate_all();
        }
    }
}

impl<Small: Owns, Large: Owns, const THRESHOLD: usize> Owns
    for Segregator<Small, Large, THRESHOLD>
{
}
impl<Small: Expand, Large: Expand, const THRESHOLD: usize> Expand
    for Segregator<Small, Large, THRESHOLD>
{
}
impl<Small: DeallocateAll, Large: DeallocateAll, const THRESHOLD: usize> DeallocateAll
    for Segregator<Small, Large, THRESHOLD>
{
}
