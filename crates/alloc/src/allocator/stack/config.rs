//! Stack allocator configuration

/// Configuration for stack allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackConfig {
    /// Byte written over freshly allocated memory
    pub alloc_pattern: Option<u8>,

    /// Byte written over memory released from the top of the stack
    pub dealloc_pattern: Option<u8>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            alloc_pattern: if cfg!(debug_assertions) { Some(0xCC) } else { None },
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
        }
    }
}

impl StackConfig {
    /// Production configuration - no fill patterns
    pub fn production() -> Self {
        Self {
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - uninitialized and released bytes are recognizable
    pub fn debug() -> Self {
        Self {
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Performance configuration - minimal overhead
    pub fn performance() -> Self {
        Self::production()
    }
}
