//! Guard-pattern corruption detection
//!
//! A [`CorruptionDetector`] is an array of guard words filled with a known
//! pattern when it is created and checked when it is dropped. Place one next
//! to a structure, or use it as the prefix or suffix of an
//! [`AffixAllocator`](super::AffixAllocator), and any stray write that lands
//! on the guard is reported with its address and both values.

use core::fmt;
use core::marker::PhantomData;

#[cfg(feature = "logging")]
use tracing::error;

/// A guard word type and the pattern it is filled with
pub trait GuardPattern {
    type Word: Copy + PartialEq + fmt::Debug;
    const PATTERN: Self::Word;
}

/// `0xDEADBEEF` in 32-bit words
#[derive(Debug, Clone, Copy, Default)]
pub struct DeadBeef;

impl GuardPattern for DeadBeef {
    type Word = u32;
    const PATTERN: u32 = 0xDEAD_BEEF;
}

/// `0xBAADF00D` in 32-bit words
#[derive(Debug, Clone, Copy, Default)]
pub struct BaadF00d;

impl GuardPattern for BaadF00d {
    type Word = u32;
    const PATTERN: u32 = 0xBAAD_F00D;
}

/// `0xCC` bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCanary;

impl GuardPattern for ByteCanary {
    type Word = u8;
    const PATTERN: u8 = 0xCC;
}

/// One guard word that no longer holds the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorruptionReport<W> {
    pub address: usize,
    pub expected: W,
    pub actual: W,
}

impl<W: fmt::Debug> fmt::Display for CorruptionReport<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "memory corruption at {:#x}: expected {:?}, found {:?}",
            self.address, self.expected, self.actual
        )
    }
}

/// Receives corruption reports
pub trait CorruptionReporter<W> {
    fn report(&mut self, report: CorruptionReport<W>);
}

impl<W, F: FnMut(CorruptionReport<W>)> CorruptionReporter<W> for F {
    fn report(&mut self, report: CorruptionReport<W>) {
        self(report);
    }
}

/// Fails a debug assertion on the first mismatch; silent in release builds
#[derive(Debug, Clone, Copy, Default)]
pub struct AssertReporter;

impl<W: PartialEq + fmt::Debug> CorruptionReporter<W> for AssertReporter {
    fn report(&mut self, report: CorruptionReport<W>) {
        debug_assert_eq!(
            report.expected, report.actual,
            "memory corruption at {:#x}",
            report.address
        );
    }
}

/// Logs every mismatch at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl<W: fmt::Debug> CorruptionReporter<W> for TracingReporter {
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn report(&mut self, report: CorruptionReport<W>) {
        #[cfg(feature = "logging")]
        error!(
            address = report.address,
            expected = ?report.expected,
            actual = ?report.actual,
            "memory corruption detected"
        );
    }
}

/// Guard array checked against its pattern on drop
///
/// The guard words come first in memory, so a detector used as an affix
/// suffix catches overruns before they reach the reporter.
#[repr(C)]
pub struct CorruptionDetector<G, const N: usize = 32, R = AssertReporter>
where
    G: GuardPattern,
    R: CorruptionReporter<G::Word>,
{
    guard: [G::Word; N],
    reporter: R,
    _pattern: PhantomData<G>,
}

impl<G, const N: usize, R> CorruptionDetector<G, N, R>
where
    G: GuardPattern,
    R: CorruptionReporter<G::Word>,
{
    pub fn with_reporter(reporter: R) -> Self {
        Self {
            guard: [G::PATTERN; N],
            reporter,
            _pattern: PhantomData,
        }
    }

    /// The guard words, for tests and inspection
    pub fn guard(&self) -> &[G::Word; N] {
        &self.guard
    }

    /// Mutable access to the guard words
    pub fn guard_mut(&mut self) -> &mut [G::Word; N] {
        &mut self.guard
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Reports every guard word that differs from the pattern
    ///
    /// Returns the number of mismatches.
    pub fn verify(&mut self) -> usize {
        let mut mismatches = 0;
        for word in &self.guard {
            // Read through a volatile load so the check survives optimization
            // of writes the compiler cannot see.
            // SAFETY: `word` is a valid reference into the guard array.
            let actual = unsafe { core::ptr::read_volatile(word) };
            if actual != G::PATTERN {
                mismatches += 1;
                self.reporter.report(CorruptionReport {
                    address: core::ptr::from_ref(word).addr(),
                    expected: G::PATTERN,
                    actual,
                });
            }
        }
        mismatches
    }
}

impl<G, const N: usize, R> Default for CorruptionDetector<G, N, R>
where
    G: GuardPattern,
    R: CorruptionReporter<G::Word> + Default,
{
    fn default() -> Self {
        Self::with_reporter(R::default())
    }
}

impl<G, const N: usize, R> Drop for CorruptionDetector<G, N, R>
where
    G: GuardPattern,
    R: CorruptionReporter<G::Word>,
{
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.verify();
        }
    }
}

impl<G, const N: usize, R> fmt::Debug for CorruptionDetector<G, N, R>
where
    G: GuardPattern,
    R: CorruptionReporter<G::Word>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorruptionDetector")
            .field("pattern", &G::PATTERN)
            .field("words", &N)
            .finish_non_exhaustive()
    }
}
