//! Composable allocators
//!
//! Small allocators with one uniform contract, [`Allocator`], that snap
//! together into custom memory strategies:
//!
//! - a fixed [`StackAllocator`] buffer for LIFO scratch memory
//! - a [`FreeListAllocator`] caching released blocks for reuse
//! - a [`Fallback`] trying a primary before a secondary allocator
//! - a [`Segregator`] routing by size threshold
//! - an [`AffixAllocator`] placing typed metadata around every block
//! - a [`SlabAllocator`] serving fixed size classes
//! - proxies sharing one allocator between several owners
//!
//! Every operation exchanges [`MemoryBlock`]s. Allocation failure is the null
//! block, never a panic.
//!
//! # Features
//!
//! - `logging` (default): `tracing` events for refills, migrations and
//!   exhaustion
//!
//! # Example
//!
//! ```
//! use nebula_alloc::prelude::*;
//!
//! // Blocks up to 64 bytes come from the stack; larger ones and stack
//! // overflow go to the heap.
//! type Small = Fallback<StackAllocator<4096>, HeapAllocator>;
//! let mut alloc = Segregator::<Small, HeapAllocator, 64>::default();
//!
//! let mut block = alloc.allocate(32);
//! assert_eq!(block.size(), 32);
//!
//! unsafe {
//!     block.as_mut_slice().fill(7);
//!     assert!(alloc.reallocate(&mut block, 256));
//!     assert_eq!(&block.as_slice()[..32], &[7; 32]);
//!     alloc.deallocate(&mut block);
//! }
//! assert!(block.is_null());
//! ```

#![allow(unsafe_code)]
#![warn(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core modules
pub mod block;
pub mod error;
pub mod traits;
pub mod utils;

// Allocators
pub mod allocator;

mod realloc;

// Re-export common types for convenience
pub use allocator::{
    AffixAllocator, DynAllocator, DynProxyAllocator, Fallback, FreeListAllocator, HeapAllocator,
    NullAllocator, PrefixedSizeAllocator, ProxyAllocator, Segregator, SlabAllocator, SlabConfig,
    StackAllocator,
};
pub use block::MemoryBlock;
pub use error::{AllocError, AllocResult};
pub use traits::{
    Allocator, Capabilities, DeallocateAll, Expand, Initializer, NoopInitializer, Owns,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::allocator::{
        AffixAllocator, DynProxyAllocator, Fallback, FreeListAllocator, HeapAllocator,
        NullAllocator, PrefixedSizeAllocator, ProxyAllocator, Segregator, SlabAllocator,
        SlabConfig, StackAllocator,
    };
    pub use crate::block::MemoryBlock;
    pub use crate::error::{AllocError, AllocResult};
    pub use crate::traits::{
        Allocator, Capabilities, DeallocateAll, Expand, Initializer, NoopInitializer, Owns,
    };
}
