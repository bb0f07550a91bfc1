//! Slab allocator implementation
//!
//! Size-class pools with intrusive free lists, refilled in bulk from a
//! backing allocator.
//!
//! ## Modules
//! - `allocator` - Main `SlabAllocator` implementation
//! - `config` - Slab capacity and size classes, with validation
pub mod allocator;
pub mod config;
pub use allocator::SlabAllocator;
pub use config::SlabConfig;
