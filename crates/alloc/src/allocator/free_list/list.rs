//! Intrusive free list stored inside released blocks
//!
//! # Safety
//!
//! Nodes live in memory the list does not own: each one is written into the
//! first bytes of a block the free-list allocator took back from its caller.
//!
//! ## Invariants
//!
//! - every node pointer is non-null, aligned for [`FreeListNode`], and points
//!   into a cached block of at least `size_of::<FreeListNode>()` bytes
//! - `node.size` is the full cached extent of that block
//! - the chain is acyclic and ends in null

use core::ptr;

use crate::block::MemoryBlock;

/// Node written at the start of every cached block
#[repr(C)]
#[derive(Debug)]
pub struct FreeListNode {
    next: *mut FreeListNode,
    size: usize,
}

impl FreeListNode {
    /// Smallest block that can hold a node
    pub const SIZE: usize = size_of::<Self>();
    /// Alignment a cached block must have
    pub const ALIGN: usize = align_of::<Self>();
}

/// Singly linked chain of cached blocks, newest first
#[derive(Debug)]
pub struct FreeList {
    head: *mut FreeListNode,
}

impl FreeList {
    pub const fn new() -> Self {
        Self {
            head: ptr::null_mut(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    /// Number of cached blocks
    pub fn len(&self) -> usize {
        self.sizes().count()
    }

    /// Sizes of the cached blocks, from the head
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        let mut node = self.head;
        core::iter::from_fn(move || {
            if node.is_null() {
                return None;
            }
            // SAFETY: non-null nodes are valid per the list invariants.
            let current = unsafe { &*node };
            node = current.next;
            Some(current.size)
        })
    }

    /// Pushes `block` at the head
    ///
    /// # Safety
    ///
    /// `block` must be released memory of at least [`FreeListNode::SIZE`]
    /// bytes, aligned to [`FreeListNode::ALIGN`], that nothing else uses
    /// until it is taken back out.
    pub unsafe fn push(&mut self, block: MemoryBlock) {
        debug_assert!(block.size >= FreeListNode::SIZE);
        let node = block.cast::<FreeListNode>();
        // SAFETY: caller guarantees the block can hold an aligned node.
        unsafe {
            node.write(FreeListNode {
                next: self.head,
                size: block.size,
            });
        }
        self.head = node;
    }

    /// Unlinks and returns the first block whose size satisfies `fits`
    pub fn take_first(&mut self, mut fits: impl FnMut(usize) -> bool) -> Option<MemoryBlock> {
        let mut prev: *mut FreeListNode = ptr::null_mut();
        let mut node = self.head;
        while !node.is_null() {
            // SAFETY: non-null nodes are valid per the list invariants.
            let size = unsafe { (*node).size };
            if fits(size) {
                // SAFETY: prev precedes node in the chain (or is null for the head).
                return Some(unsafe { self.unlink(prev, node) });
            }
            prev = node;
            // SAFETY: as above.
            node = unsafe { (*node).next };
        }
        None
    }

    /// Unlinks the smallest block of at least `size` bytes
    ///
    /// An exact match stops the scan. Among equally small candidates the one
    /// closest to the head wins.
    pub fn take_best(&mut self, size: usize) -> Option<MemoryBlock> {
        let mut best: Option<(*mut FreeListNode, *mut FreeListNode, usize)> = None;
        let mut prev: *mut FreeListNode = ptr::null_mut();
        let mut node = self.head;
        while !node.is_null() {
            // SAFETY: non-null nodes are valid per the list invariants.
            let node_size = unsafe { (*node).size };
            if node_size == size {
                // SAFETY: prev precedes node.
                return Some(unsafe { self.unlink(prev, node) });
            }
            if node_size > size && best.is_none_or(|(_, _, best_size)| node_size < best_size) {
                best = Some((prev, node, node_size));
            }
            prev = node;
            // SAFETY: as above.
            node = unsafe { (*node).next };
        }
        // SAFETY: best.0 precedes best.1, and nothing was unlinked since.
        best.map(|(prev, node, _)| unsafe { self.unlink(prev, node) })
    }

    /// Forgets every cached block
    pub fn clear(&mut self) {
        self.head = ptr::null_mut();
    }

    /// Pops the head block
    pub fn pop(&mut self) -> Option<MemoryBlock> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: head is non-null and has no predecessor.
        Some(unsafe { self.unlink(ptr::null_mut(), self.head) })
    }

    /// # Safety
    ///
    /// `node` is in the list and `prev` is its predecessor, or null when
    /// `node` is the head.
    unsafe fn unlink(&mut self, prev: *mut FreeListNode, node: *mut FreeListNode) -> MemoryBlock {
        // SAFETY: caller guarantees both pointers are valid nodes of this list.
        unsafe {
            let FreeListNode { next, size } = node.read();
            if prev.is_null() {
                self.head = next;
            } else {
                (*prev).next = next;
            }
            MemoryBlock {
                ptr: node.cast(),
                size,
            }
        }
    }
}

impl Default for FreeList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Aligned scratch memory split into node-sized cells
    #[repr(C, align(16))]
    pub(crate) struct Arena(pub [u8; 512]);

    impl Arena {
        pub(crate) fn new() -> Self {
            Self([0; 512])
        }

        pub(crate) fn block(&mut self, index: usize, size: usize) -> MemoryBlock {
            MemoryBlock::new(self.0[index * 64..].as_mut_ptr(), size)
        }
    }

    fn filled(arena: &mut Arena, sizes: &[usize]) -> FreeList {
        let mut list = FreeList::new();
        // Push in reverse so the list order matches `sizes`.
        for (index, &size) in sizes.iter().enumerate().rev() {
            // SAFETY: each arena cell is 64 aligned bytes, unused elsewhere
            unsafe { list.push(arena.block(index, size)) };
        }
        list
    }

    #[test]
    fn test_push_pop_is_lifo() {
        let mut arena = Arena::new();
        let first = arena.block(0, 32);
        let second = arena.block(1, 48);
        let mut list = FreeList::new();
        // SAFETY: arena cells are aligned and unused
        unsafe {
            list.push(first);
            list.push(second);
        }
        assert_eq!(list.len(), 2);
        assert_eq!(list.pop(), Some(second));
        assert_eq!(list.pop(), Some(first));
        assert!(list.pop().is_none());
    }

    #[test]
    fn test_take_first_unlinks_middle() {
        let mut arena = Arena::new();
        let mut list = filled(&mut arena, &[16, 48, 32]);
        let taken = list.take_first(|size| size >= 32).expect("fitting node");
        assert_eq!(taken.size(), 48);
        assert_eq!(list.sizes().collect::<Vec<_>>(), vec![16, 32]);
    }

    #[test]
    fn test_take_best_prefers_smallest_then_earliest() {
        let mut arena = Arena::new();
        let mut list = filled(&mut arena, &[64, 40, 48, 40]);
        let expected = arena.block(1, 40);
        assert_eq!(list.take_best(33), Some(expected));
        assert_eq!(list.sizes().collect::<Vec<_>>(), vec![64, 48, 40]);
        assert_eq!(list.take_best(48).map(|b| b.size()), Some(48));
        assert!(list.take_best(65).is_none());
    }
}
