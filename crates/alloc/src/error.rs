//! Error types for allocator construction and configuration
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.
//!
//! The allocation contract itself never produces these errors: `allocate`
//! answers with the null block and `expand`/`reallocate` answer with `false`.
//! `AllocError` covers the fallible setup around it, such as obtaining a stack
//! buffer or validating a slab configuration.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::error;

/// Allocator setup errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("Invalid alignment: {alignment}")]
    InvalidAlignment { alignment: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Buffer allocation failed: {size} bytes with {alignment} byte alignment")]
    BufferAllocationFailed { size: usize, alignment: usize },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: String },
}

impl AllocError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAlignment { .. } => "ALLOC:ALIGN",
            Self::InvalidConfig { .. } => "ALLOC:CONFIG:INVALID",
            Self::BufferAllocationFailed { .. } => "ALLOC:BUFFER:FAILED",
            Self::SizeOverflow { .. } => "ALLOC:OVERFLOW",
        }
    }

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create buffer allocation failed error
    pub fn buffer_allocation_failed(size: usize, alignment: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, alignment, "allocator buffer allocation failed");

        Self::BufferAllocationFailed { size, alignment }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }
}

/// Result type for allocator setup
pub type AllocResult<T> = Result<T, AllocError>;
