//! Type-erased proxy allocator
//!
//! [`DynAllocator`] is the object-safe face of [`Allocator`]: every allocator
//! implements it, so any of them can sit behind a `dyn DynAllocator` and be
//! swapped at run time without changing the proxy's type.
//!
//! ## Invariants
//!
//! - targets are aligned to at least [`DEFAULT_ALIGNMENT`], checked when the
//!   target is set
//! - operations the target does not support answer `false` or do nothing

use core::cell::RefCell;

use crate::block::MemoryBlock;
use crate::traits::{Allocator, Capabilities, DeallocateAll, Expand, Owns};
use crate::utils::DEFAULT_ALIGNMENT;

/// Object-safe allocator interface, implemented for every [`Allocator`]
pub trait DynAllocator {
    fn dyn_alignment(&self) -> usize;
    fn dyn_capabilities(&self) -> Capabilities;
    fn dyn_allocate(&mut self, size: usize) -> MemoryBlock;
    fn dyn_owns(&self, block: &MemoryBlock) -> bool;

    /// # Safety
    ///
    /// Same contract as [`Allocator::expand`].
    unsafe fn dyn_expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool;

    /// # Safety
    ///
    /// Same contract as [`Allocator::reallocate`].
    unsafe fn dyn_reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool;

    /// # Safety
    ///
    /// Same contract as [`Allocator::deallocate`].
    unsafe fn dyn_deallocate(&mut self, block: &mut MemoryBlock);

    /// # Safety
    ///
    /// Same contract as [`Allocator::deallocate_all`].
    unsafe fn dyn_deallocate_all(&mut self);
}

impl<A: Allocator> DynAllocator for A {
    #[inline]
    fn dyn_alignment(&self) -> usize {
        self.alignment()
    }

    #[inline]
    fn dyn_capabilities(&self) -> Capabilities {
        A::CAPABILITIES
    }

    #[inline]
    fn dyn_allocate(&mut self, size: usize) -> MemoryBlock {
        self.allocate(size)
    }

    #[inline]
    fn dyn_owns(&self, block: &MemoryBlock) -> bool {
        A::CAPABILITIES.contains(Capabilities::OWNS) && self.owns(block)
    }

    #[inline]
    unsafe fn dyn_expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool {
        // SAFETY: forwarded caller contract
        A::CAPABILITIES.contains(Capabilities::EXPAND) && unsafe { self.expand(block, delta) }
    }

    #[inline]
    unsafe fn dyn_reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        unsafe { self.reallocate(block, new_size) }
    }

    #[inline]
    unsafe fn dyn_deallocate(&mut self, block: &mut MemoryBlock) {
        // SAFETY: forwarded caller contract
        unsafe { self.deallocate(block) };
    }

    #[inline]
    unsafe fn dyn_deallocate_all(&mut self) {
        if A::CAPABILITIES.contains(Capabilities::DEALLOCATE_ALL) {
            // SAFETY: forwarded caller contract
            unsafe { self.deallocate_all() };
        }
    }
}

/// Forwards to a shared allocator of any type
///
/// Unlike [`ProxyAllocator`](super::ProxyAllocator) the target's type is
/// erased, so `init` visits only the proxy itself. The proxy advertises every
/// capability and answers `false` where its current target lacks one.
pub struct DynProxyAllocator<'a> {
    target: Option<&'a RefCell<dyn DynAllocator + 'a>>,
}

impl<'a> DynProxyAllocator<'a> {
    /// Creates a proxy without a target
    pub const fn new() -> Self {
        Self { target: None }
    }

    pub fn with_target<A: Allocator + 'a>(target: &'a RefCell<A>) -> Self {
        let mut proxy = Self::new();
        proxy.set_target(target);
        proxy
    }

    /// Points the proxy at `target`
    pub fn set_target<A: Allocator + 'a>(&mut self, target: &'a RefCell<A>) {
        const {
            assert!(
                A::ALIGNMENT >= DEFAULT_ALIGNMENT,
                "proxy targets must align to at least DEFAULT_ALIGNMENT"
            );
        }
        let target: &'a RefCell<dyn DynAllocator + 'a> = target;
        self.target = Some(target);
    }

    /// Points the proxy at an already erased target
    pub fn set_dyn_target(&mut self, target: &'a RefCell<dyn DynAllocator + 'a>) {
        debug_assert!(target.borrow().dyn_alignment() >= DEFAULT_ALIGNMENT);
        self.target = Some(target);
    }

    /// Detaches the proxy from its target
    pub fn clear(&mut self) {
        self.target = None;
    }

    pub fn target(&self) -> Option<&'a RefCell<dyn DynAllocator + 'a>> {
        self.target
    }

    pub fn is_set(&self) -> bool {
        self.target.is_some()
    }

    /// Capabilities of the current target, empty when unset
    pub fn target_capabilities(&self) -> Capabilities {
        self.target
            .map_or(Capabilities::empty(), |target| target.borrow().dyn_capabilities())
    }

    #[inline]
    fn forward<R>(&self, unset: R, f: impl FnOnce(&mut (dyn DynAllocator + 'a)) -> R) -> R {
        match self.target {
            Some(target) => f(&mut *target.borrow_mut()),
            None => {
                debug_assert!(false, "proxy allocator used without a target");
                unset
            },
        }
    }
}

impl Default for DynProxyAllocator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DynProxyAllocator<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for DynProxyAllocator<'_> {}

// SAFETY: every call is forwarded to the target, whose alignment is at least
// DEFAULT_ALIGNMENT.
unsafe impl Allocator for DynProxyAllocator<'_> {
    const ALIGNMENT: usize = DEFAULT_ALIGNMENT;
    const CAPABILITIES: Capabilities = Capabilities::all();

    fn alignment(&self) -> usize {
        self.target
            .map_or(Self::ALIGNMENT, |target| target.borrow().dyn_alignment())
    }

    fn allocate(&mut self, size: usize) -> MemoryBlock {
        self.forward(MemoryBlock::NULL, |target| target.dyn_allocate(size))
    }

    fn owns(&self, block: &MemoryBlock) -> bool {
        match self.target {
            Some(target) => target.borrow().dyn_owns(block),
            None => {
                debug_assert!(false, "proxy allocator used without a target");
                false
            },
        }
    }

    unsafe fn expand(&mut self, block: &mut MemoryBlock, delta: usize) -> bool {
        // SAFETY: forwarded caller contract
        self.forward(false, |target| unsafe { target.dyn_expand(block, delta) })
    }

    unsafe fn reallocate(&mut self, block: &mut MemoryBlock, new_size: usize) -> bool {
        // SAFETY: forwarded caller contract
        self.forward(false, |target| unsafe { target.dyn_reallocate(block, new_size) })
    }

    unsafe fn deallocate(&mut self, block: &mut MemoryBlock) {
        // SAFETY: forwarded caller contract
        self.forward((), |target| unsafe { target.dyn_deallocate(block) });
    }

    unsafe fn deallocate_all(&mut self) {
        // SAFETY: forwarded caller contract
        self.forward((), |target| unsafe { target.dyn_deallocate_all() });
    }
}

impl Owns for DynProxyAllocator<'_> {}
impl Expand for DynProxyAllocator<'_> {}
impl DeallocateAll for DynProxyAllocator<'_> {}
