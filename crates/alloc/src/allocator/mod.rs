//! Allocator building blocks
//!
//! Primitive allocators own or obtain memory directly; composites wrap one or
//! two children and combine them into a new allocator with the same contract.
//!
//! Primitives: [`StackAllocator`], [`HeapAllocator`], [`NullAllocator`].
//! Composites: [`FreeListAllocator`], [`Fallback`], [`Segregator`],
//! [`AffixAllocator`], [`PrefixedSizeAllocator`], [`SlabAllocator`].
//! Indirection: [`ProxyAllocator`], [`DynProxyAllocator`].

// Primitives
mod heap;
mod null;
pub mod stack;

// Composites
pub mod affix;
mod fallback;
pub mod free_list;
mod segregator;
pub mod slab;

// Indirection
pub mod proxy;

// Re-exports for convenience
pub use affix::{
    AffixAllocator, AssertReporter, BaadF00d, ByteCanary, CorruptionDetector, CorruptionReport,
    CorruptionReporter, DeadBeef, GuardPattern, PrefixedSizeAllocator, TracingReporter,
};
pub use fallback::Fallback;
pub use free_list::{
    BestFit, ExactFit, FirstFit, FitStrategy, FreeList, FreeListAllocator, FreeListNode,
    LimitedSize,
};
pub use heap::HeapAllocator;
pub use null::NullAllocator;
pub use proxy::{DynAllocator, DynProxyAllocator, ProxyAllocator};
pub use segregator::Segregator;
pub use slab::{SlabAllocator, SlabConfig};
pub use stack::{StackAllocator, StackConfig, StackMarker};
