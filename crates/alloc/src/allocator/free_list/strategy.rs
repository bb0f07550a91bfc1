//! Fit strategies for the free-list allocator

use super::list::FreeList;
use crate::block::MemoryBlock;

/// Picks which cached block serves a request and whether to cache a release
pub trait FitStrategy {
    /// Removes a cached block able to hold `size` bytes
    fn take(&mut self, list: &mut FreeList, size: usize) -> Option<MemoryBlock>;

    /// Caches `block`, or returns `false` to refuse it
    ///
    /// # Safety
    ///
    /// Same contract as [`FreeList::push`].
    unsafe fn put(&mut self, list: &mut FreeList, block: MemoryBlock) -> bool {
        // SAFETY: forwarded caller contract
        unsafe { list.push(block) };
        true
    }

    /// Called after the list has been emptied wholesale
    fn clear(&mut self) {}
}

/// Serves only cached blocks of exactly the requested size
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactFit;

impl FitStrategy for ExactFit {
    fn take(&mut self, list: &mut FreeList, size: usize) -> Option<MemoryBlock> {
        list.take_first(|cached| cached == size)
    }
}

/// Serves the first cached block that is large enough
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstFit;

impl FitStrategy for FirstFit {
    fn take(&mut self, list: &mut FreeList, size: usize) -> Option<MemoryBlock> {
        list.take_first(|cached| cached >= size)
    }
}

/// Serves the smallest cached block that is large enough
///
/// Scans the whole list unless an exact match turns up first.
#[derive(Debug, Default, Clone, Copy)]
pub struct BestFit;

impl FitStrategy for BestFit {
    fn take(&mut self, list: &mut FreeList, size: usize) -> Option<MemoryBlock> {
        list.take_best(size)
    }
}

/// Caps another strategy at `MAX` cached blocks
#[derive(Debug, Default, Clone, Copy)]
pub struct LimitedSize<S, const MAX: usize> {
    strategy: S,
    cached: usize,
}

impl<S, const MAX: usize> LimitedSize<S, MAX> {
    pub fn new(strategy: S) -> Self {
        Self { strategy, cached: 0 }
    }

    /// Blocks currently counted against the cap
    pub fn cached(&self) -> usize {
        self.cached
    }
}

impl<S: FitStrategy, const MAX: usize> FitStrategy for LimitedSize<S, MAX> {
    fn take(&mut self, list: &mut FreeList, size: usize) -> Option<MemoryBlock> {
        if self.cached == 0 {
            return None;
        }
        let block = self.strategy.take(list, size)?;
        self.cached -= 1;
        Some(block)
    }

    unsafe fn put(&mut self, list: &mut FreeList, block: MemoryBlock) -> bool {
        if self.cached >= MAX {
            return false;
        }
        // SAFETY: forwarded caller contract
        if !unsafe { self.strategy.put(list, block) } {
            return false;
        }
        self.cached += 1;
        true
    }

    fn clear(&mut self) {
        self.cached = 0;
        self.strategy.clear();
    }
}
