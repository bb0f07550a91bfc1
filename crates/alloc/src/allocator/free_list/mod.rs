//! Free-list caching over a backing allocator
//!
//! ## Modules
//! - `allocator` - `FreeListAllocator`, the caching decorator
//! - `list` - Intrusive list of released blocks
//! - `strategy` - Fit strategies (exact, first, best, size-capped)
pub mod allocator;
mod list;
pub mod strategy;
pub use allocator::FreeListAllocator;
pub use list::{FreeList, FreeListNode};
pub use strategy::{BestFit, ExactFit, FirstFit, FitStrategy, LimitedSize};
