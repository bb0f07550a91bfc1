//! Run-time selectable allocators
//!
//! Both proxies borrow an allocator owned elsewhere and forward every call to
//! it, so one instance can serve several call sites or be swapped at run time.
//!
//! ## Modules
//! - `allocator` - `ProxyAllocator`, forwarding to a target of a fixed type
//! - `dynamic` - `DynProxyAllocator`, forwarding to a type-erased target
pub mod allocator;
pub mod dynamic;
pub use allocator::ProxyAllocator;
pub use dynamic::{DynAllocator, DynProxyAllocator};
