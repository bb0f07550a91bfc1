//! Proxy allocator implementation

use core::cell::RefCell;

use crate::block::MemoryBlock;
use crate::traits::{Allocator, Capabilities, DeallocateAll, Expand, Initializer, Owns};

/// Forwards to a shared allocator of type `A`
///
/// The target is borrowed, not owned, and must outlive the proxy. Using a
/// proxy without a target fails a debug assertion; release builds answer
/// with the null block or `false`.
pub struct ProxyAllocator<'a, A: Allocator> {
    target: Option<&'a RefCell<A>>,
}

impl<'a, A: Allocator> ProxyAllocator<'a, A> {
    /// Creates a proxy without a target
    pub const fn new() -> Self {
        Self { target: None }
    }

    pub const fn with_target(target: &'a RefCell<A>) -> Self {
        Self {
            target: Some(target),
        }
    }

    pub fn set_target(&mut self, target: Option<&'a RefCell<A>>) {
        self.target = target;
    }

    pub fn target(&self) -> Option<&'a RefCell<A>> {
        self.target
    }

    pub fn is_set(&self) -> bool {
        self.target.is_some()
    }

    #[inline]
    fn forward<R>(&self, unset: R, f: impl FnOnce(&mut A) -> R) -> R {
        match self.target {
            Some(target) => f(&mut target.borrow_mut()),
            None => {
                debug_assert!(false, "proxy allocator used without a target");
                unset
            },
        }
    }
}

impl<A: Allocator> Default for ProxyAllocator<'_, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator> Clone for ProxyAllocator<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: Allocator> Copy for ProxyAllocator<'_, A> {}

// SAFETY: every call is forwarded unchanged to the target allocator.
unsafe impl<A: Allocator> Allocator for ProxyAllocator<'_, A> {
    const ALIGNMENT: usize = A::ALIGNMENT;
    const CAPABILITIES: Capabilities = A::CAPABILITIES;

    fn init<I: Initializer>(&mut self, initializer: &mut I) {
        initializer.init(self);
        if let Some(target) = self.target {
            target.borrow_mut().init(initializer);
        }
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        self.forward(MemoryBlock::NULL, |target| target.allocate(size))
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        match self.target {
            Some(target) => target.borrow().owns(block),
            None => {
                debug_assert!(false, "proxy allocator used without a target");
                false
            },
        }
    }

    unsafe fn expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool {
        // SAFETY: forwarded caller contract
        self.forward(false, |target| unsafe { target.expand(block, delta) })
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        self.forward(false, |target| unsafe { target.reallocate(block, new_size) })
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        // SAFETY: forwarded caller contract
        self.forward((), |target| unsafe { target.deallocate(block) });
    }

    unsafe fn deallocate_all(&mut self) {
        // SAFETY: forwarded caller contract
        self.forward((), |target| unsafe { target.deallocate_all() });
    }
}

impl<A: Owns> Owns for ProxyAllocator<'_, A> {}
impl<A: Expand> Expand for ProxyAllocator<'_, A> {}
impl<A: DeallocateAll> DeallocateAll for ProxyAllocator<'_, A> {}
