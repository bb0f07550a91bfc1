//! Metadata affixed around allocated blocks
//!
//! ## Modules
//! - `allocator` - `AffixAllocator`, prefix and suffix values around every block
//! - `prefixed` - `PrefixedSizeAllocator`, size recovery from the pointer alone
//! - `detector` - `CorruptionDetector`, guard-pattern canaries
pub mod allocator;
pub mod detector;
pub mod prefixed;
pub use allocator::AffixAllocator;
pub use detector::{
    AssertReporter, BaadF00d, ByteCanary, CorruptionDetector, CorruptionReport, CorruptionReporter,
    DeadBeef, GuardPattern, TracingReporter,
};
pub use prefixed::PrefixedSizeAllocator;
