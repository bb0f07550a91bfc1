//! A stack allocator for LIFO (Last In, First Out) memory management.
//!
//! ## Modules
//! - `allocator` - Main `StackAllocator` implementation with LIFO semantics
//! - `config` - Configuration variants (production, debug, performance)
//! - `marker` - Position markers for scoped deallocation
pub mod allocator;
pub mod config;
pub mod marker;
pub use allocator::StackAllocator;
pub use config::StackConfig;
pub use marker::StackMarker;
