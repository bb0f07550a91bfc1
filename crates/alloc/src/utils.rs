//! Alignment arithmetic shared by every allocator in the crate.
//!
//! All helpers require `alignment` to be a power of two. This is checked with
//! `debug_assert!` only; release builds produce meaningless results for other
//! values.

/// Alignment used by allocators that do not choose their own.
pub const DEFAULT_ALIGNMENT: usize = 8;

/// Aligns a value up to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use nebula_alloc::utils::align_up;
///
/// assert_eq!(align_up(7, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    align_down(value + alignment - 1, alignment)
}

/// Aligns a value up, returning `None` when the result does not fit in `usize`
#[inline(always)]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    match value.checked_add(alignment - 1) {
        Some(padded) => Some(align_down(padded, alignment)),
        None => None,
    }
}

/// Aligns a value down to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use nebula_alloc::utils::align_down;
///
/// assert_eq!(align_down(7, 8), 0);
/// assert_eq!(align_down(8, 8), 8);
/// assert_eq!(align_down(9, 8), 8);
/// ```
#[inline(always)]
pub const fn align_down(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    value & !(alignment - 1)
}

/// Checks if a value is aligned to the given alignment
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Check if a pointer is properly aligned
#[inline]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr.addr(), alignment)
}

/// Larger of two alignments, usable in `const` context
#[inline(always)]
pub const fn max_alignment(a: usize, b: usize) -> usize {
    if a > b { a } else { b }
}

/// Smaller of two alignments, usable in `const` context
#[inline(always)]
pub const fn min_alignment(a: usize, b: usize) -> usize {
    if a < b { a } else { b }
}
