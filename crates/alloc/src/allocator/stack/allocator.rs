//! Main stack allocator implementation
//!
//! # Safety
//!
//! This module implements a single-threaded LIFO bump allocator:
//! - The buffer is obtained once from the global allocator and never moves,
//!   so moving the `StackAllocator` itself keeps issued blocks valid
//! - Only the most recent allocation can be released or grown
//!
//! ## Invariants
//!
//! - `cursor <= CAPACITY`
//! - every issued block starts at an `ALIGN`-aligned offset below `cursor`
//! - block footprints are `align_up(size, ALIGN)`, so the top block always
//!   ends exactly at `cursor`

use core::alloc::Layout;
use core::ptr::{self, NonNull};
use std::alloc;

#[cfg(feature = "logging")]
use tracing::trace;

use super::{StackConfig, StackMarker};
use crate::block::MemoryBlock;
use crate::error::{AllocError, AllocResult};
use crate::realloc::try_default_reallocate;
use crate::traits::{Allocator, Capabilities, DeallocateAll, Expand, Owns};
use crate::utils::{DEFAULT_ALIGNMENT, align_up, checked_align_up};

/// Stack allocator over a fixed buffer of `CAPACITY` bytes
///
/// # Memory Layout
/// ```text
/// [base]----[block1]----[block2]----[cursor]----[free]----[base + CAPACITY]
///            <------ allocated ----->            <-- available -->
/// ```
///
/// Deallocations only reclaim space in reverse order: block2, then block1.
/// Releasing any other block is a no-op.
pub struct StackAllocator<const CAPACITY: usize, const ALIGN: usize = DEFAULT_ALIGNMENT> {
    base: NonNull<u8>,
    cursor: usize,
    config: StackConfig,
}

impl<const CAPACITY: usize, const ALIGN: usize> StackAllocator<CAPACITY, ALIGN> {
    /// Creates a new stack allocator with custom configuration
    pub fn with_config(config: StackConfig) -> AllocResult<Self> {
        const {
            assert!(CAPACITY > 0, "stack capacity must be non-zero");
            assert!(ALIGN.is_power_of_two(), "stack alignment must be a power of two");
        }

        let layout = Self::layout()?;
        // SAFETY: layout has a non-zero size (checked at compile time above).
        let ptr = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(ptr)
            .ok_or_else(|| AllocError::buffer_allocation_failed(CAPACITY, ALIGN))?;

        Ok(Self {
            base,
            cursor: 0,
            config,
        })
    }

    /// Creates a stack allocator with default configuration
    pub fn try_new() -> AllocResult<Self> {
        Self::with_config(StackConfig::default())
    }

    /// Creates a stack allocator with default configuration
    ///
    /// Aborts through [`alloc::handle_alloc_error`] when the buffer cannot be
    /// obtained.
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(stack) => stack,
            Err(_) => alloc::handle_alloc_error(
                Layout::from_size_align(CAPACITY, ALIGN).unwrap_or(Layout::new::<u8>()),
            ),
        }
    }

    /// Creates a production-optimized stack allocator
    pub fn production() -> AllocResult<Self> {
        Self::with_config(StackConfig::production())
    }

    /// Creates a debug-optimized stack allocator
    pub fn debug() -> AllocResult<Self> {
        Self::with_config(StackConfig::debug())
    }

    fn layout() -> AllocResult<Layout> {
        Layout::from_size_align(CAPACITY, ALIGN)
            .map_err(|_| AllocError::size_overflow("stack buffer layout"))
    }

    /// Returns the total capacity of the allocator
    pub fn capacity(&self) -> usize {
        CAPACITY
    }

    /// Returns the amount of memory currently allocated
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Returns the amount of memory available for allocation
    pub fn available(&self) -> usize {
        CAPACITY - self.cursor
    }

    /// Start of the buffer
    pub fn base(&self) -> *const u8 {
        self.base.as_ptr()
    }

    /// Creates a marker at the current stack position
    pub fn mark(&self) -> StackMarker {
        StackMarker {
            offset: self.cursor,
        }
    }

    /// Restores the stack to a previous marker position
    ///
    /// Markers from the future (above the current cursor) are ignored.
    ///
    /// # Safety
    ///
    /// Every block allocated after the marker becomes dangling.
    pub unsafe fn rewind(&mut self, marker: StackMarker) {
        if marker.offset > self.cursor {
            return;
        }
        self.release_to(marker.offset);
    }

    #[inline]
    fn offset_of(&self, block: &MemoryBlock) -> usize {
        block.addr().wrapping_sub(self.base.as_ptr().addr())
    }

    #[inline]
    fn is_top(&self, block: &MemoryBlock) -> bool {
        self.offset_of(block).wrapping_add(align_up(block.size, ALIGN)) == self.cursor
    }

    fn release_to(&mut self, offset: usize) {
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: [offset, cursor) lies inside the buffer.
            unsafe {
                ptr::write_bytes(self.base.as_ptr().add(offset), pattern, self.cursor - offset);
            }
        }
        self.cursor = offset;
    }

    /// Moves the cursor so that the top block ends at `offset + footprint`
    fn resize_top(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        let offset = self.offset_of(block);
        let Some(footprint) = checked_align_up(new_size, ALIGN) else {
            return false;
        };
        if footprint > CAPACITY - offset {
            #[cfg(feature = "logging")]
            trace!(
                requested = new_size,
                available = CAPACITY - offset,
                "stack allocator exhausted"
            );
            return false;
        }

        let new_cursor = offset + footprint;
        if new_cursor < self.cursor {
            self.release_to(new_cursor);
        } else if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: [cursor, new_cursor) lies inside the buffer.
            unsafe {
                ptr::write_bytes(
                    self.base.as_ptr().add(self.cursor),
                    pattern,
                    new_cursor - self.cursor,
                );
            }
        }
        self.cursor = new_cursor;
        block.size = new_size;
        true
    }
}

impl<const CAPACITY: usize, const ALIGN: usize> Default for StackAllocator<CAPACITY, ALIGN> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: the buffer is exclusively owned; nothing else holds `base`.
unsafe impl<const CAPACITY: usize, const ALIGN: usize> Send for StackAllocator<CAPACITY, ALIGN> {}

impl<const CAPACITY: usize, const ALIGN: usize> Drop for StackAllocator<CAPACITY, ALIGN> {
    fn drop(&mut self) {
        if let Ok(layout) = Self::layout() {
            // SAFETY: the buffer was allocated with this exact layout.
            unsafe { alloc::dealloc(self.base.as_ptr(), layout) };
        }
    }
}

// SAFETY: blocks are carved from the owned buffer at ALIGN-aligned offsets of
// an ALIGN-aligned base, and the cursor only hands out each byte once.
unsafe impl<const CAPACITY: usize, const ALIGN: usize> Allocator
    for StackAllocator<CAPACITY, ALIGN>
{
    const ALIGNMENT: usize = ALIGN;
    const CAPABILITIES: Capabilities = Capabilities::all();

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        if size == 0 {
            return MemoryBlock::NULL;
        }
        let mut block = MemoryBlock {
            // SAFETY: cursor <= CAPACITY, so this stays within or one past the buffer.
            ptr: unsafe { self.base.as_ptr().add(self.cursor) },
            size: 0,
        };
        if self.resize_top(&mut block, size) {
            block
        } else {
            MemoryBlock::NULL
        }
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        !block.is_null() && self.offset_of(block) < CAPACITY
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
        if self.is_top(block) {
            return self.resize_top(block, new_size);
        }
        // Only the top block can grow.
        false
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        if let Some(done) = unsafe { try_default_reallocate(self, block, new_size) } {
            return done;
        }
        if self.is_top(block) {
            return self.resize_top(block, new_size);
        }
        if checked_align_up(new_size, ALIGN).is_some_and(|n| n <= align_up(block.size, ALIGN)) {
            block.size = new_size;
            return true;
        }
        false
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        if block.is_null() {
            return;
        }
        debug_assert!(self.owns(block), "block was not issued by this stack allocator");
        if self.is_top(block) {
            let offset = self.offset_of(block);
            self.release_to(offset);
        }
        *block = MemoryBlock::NULL;
    }

    unsafe fn deallocate_all(&mut self) {
        self.release_to(0);
    }
}

impl<const CAPACITY: usize, const ALIGN: usize> Owns for StackAllocator<CAPACITY, ALIGN> {}
impl<const CAPACITY: usize, const ALIGN: usize> Expand for StackAllocator<CAPACITY, ALIGN> {}
impl<const CAPACITY: usize, const ALIGN: usize> DeallocateAll for StackAllocator<CAPACITY, ALIGN> {}
