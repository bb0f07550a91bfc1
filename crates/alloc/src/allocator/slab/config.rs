//! Slab allocator configuration

use crate::error::{AllocError, AllocResult};
use crate::utils::is_aligned;

/// Slab capacity and the size classes carved out of each slab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabConfig<const N: usize> {
    /// Bytes requested from the backing allocator per refill
    pub slab_capacity: usize,

    /// Slot sizes, strictly ascending
    pub size_classes: [usize; N],
}

impl<const N: usize> SlabConfig<N> {
    pub const fn new(slab_capacity: usize, size_classes: [usize; N]) -> Self {
        Self {
            slab_capacity,
            size_classes,
        }
    }

    /// Largest size this configuration serves
    pub fn max_size(&self) -> usize {
        self.size_classes.last().copied().unwrap_or(0)
    }

    /// Checks the configuration against the backing allocator's alignment
    pub fn validate(&self, alignment: usize) -> AllocResult<()> {
        if !alignment.is_power_of_two() {
            return Err(AllocError::invalid_alignment(alignment));
        }
        if N == 0 {
            return Err(AllocError::invalid_config("slab needs at least one size class"));
        }
        if self.slab_capacity == 0 || !is_aligned(self.slab_capacity, alignment) {
            return Err(AllocError::invalid_config(format!(
                "slab capacity {} must be a non-zero multiple of {alignment}",
                self.slab_capacity
            )));
        }
        if self.size_classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AllocError::invalid_config("size classes must be strictly ascending"));
        }
        for &class in &self.size_classes {
            if class < size_of::<*mut u8>() {
                return Err(AllocError::invalid_config(format!(
                    "size class {class} cannot hold a free-list link"
                )));
            }
            if !is_aligned(class, alignment) {
                return Err(AllocError::invalid_config(format!(
                    "size class {class} is not a multiple of {alignment}"
                )));
            }
            if class > self.slab_capacity {
                return Err(AllocError::invalid_config(format!(
                    "size class {class} exceeds slab capacity {}",
                    self.slab_capacity
                )));
            }
        }
        Ok(())
    }
}

impl SlabConfig<6> {
    /// Six power-of-two classes from 16 to 512 bytes over 4 KiB slabs
    pub const fn standard() -> Self {
        Self::new(4096, [16, 32, 64, 128, 256, 512])
    }
}

impl Default for SlabConfig<6> {
    fn default() -> Self {
        Self::standard()
    }
}
