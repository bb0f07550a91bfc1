//! Stack position markers

/// A saved stack position
///
/// Created by [`StackAllocator::mark`](super::StackAllocator::mark) and
/// consumed by [`StackAllocator::rewind`](super::StackAllocator::rewind),
/// which releases every block allocated after the mark in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StackMarker {
    pub(crate) offset: usize,
}

impl StackMarker {
    /// Bytes in use when the marker was taken
    pub fn offset(&self) -> usize {
        self.offset
    }
}
