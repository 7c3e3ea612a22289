//! Target-word atomics for memory shared with dispatch stubs.
//!
//! Readers take one `Acquire` snapshot and branch only on that value. Writers
//! publish with `Release` so everything the published word points at is visible
//! before the word itself.
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "memory-validation")]
fn validate_ordering(ordering: Ordering, is_load: bool) {
    match (is_load, ordering) {
        (true, Ordering::Release) | (true, Ordering::AcqRel) => {
            panic!("Invalid load ordering: {:?}", ordering);
        }
        (false, Ordering::Acquire) | (false, Ordering::AcqRel) => {
            panic!("Invalid store ordering: {:?}", ordering);
        }
        _ => {}
    }

    if ordering == Ordering::Relaxed {
        warn_relaxed();
    }
}

/// The failure ordering is a load. The success ordering may be any read-modify-write
/// ordering but should still publish.
#[cfg(feature = "memory-validation")]
fn validate_exchange_ordering(success: Ordering, failure: Ordering) {
    validate_ordering(failure, true);
    if success == Ordering::Relaxed {
        warn_relaxed();
    }
}

#[cfg(feature = "memory-validation")]
fn warn_relaxed() {
    tracing::warn!(
        "Relaxed ordering used for a shared dispatch word. \
         Stubs and installers rely on acquire/release."
    );
}

#[cfg(not(feature = "memory-validation"))]
#[inline(always)]
fn validate_ordering(_ordering: Ordering, _is_load: bool) {}

#[cfg(not(feature = "memory-validation"))]
#[inline(always)]
fn validate_exchange_ordering(_success: Ordering, _failure: Ordering) {}

/// A machine word shared between dispatch stubs, decoders and cache installers.
///
/// Layout-identical to `usize`, so it can sit inside `#[repr(C)]` records that
/// generated code reads directly.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct SharedWord(AtomicUsize);

impl SharedWord {
    pub const fn new(value: usize) -> Self {
        Self(AtomicUsize::new(value))
    }

    /// The single read a decode is allowed to make.
    #[inline]
    pub fn snapshot(&self) -> usize {
        self.load(Ordering::Acquire)
    }

    #[inline]
    pub fn load(&self, ordering: Ordering) -> usize {
        validate_ordering(ordering, true);
        self.0.load(ordering)
    }

    #[inline]
    pub fn store(&self, value: usize, ordering: Ordering) {
        validate_ordering(ordering, false);
        self.0.store(value, ordering)
    }

    /// Release-store `value`, making prior writes visible to any acquiring reader.
    #[inline]
    pub fn publish(&self, value: usize) {
        self.store(value, Ordering::Release)
    }

    /// Publish `new` only if the word still holds `expected`.
    ///
    /// On failure returns the value that was observed instead.
    #[inline]
    pub fn compare_exchange(&self, expected: usize, new: usize) -> Result<usize, usize> {
        self.compare_exchange_with(expected, new, Ordering::Release, Ordering::Acquire)
    }

    #[inline]
    pub fn compare_exchange_with(
        &self,
        expected: usize,
        new: usize,
        success: Ordering,
        failure: Ordering,
    ) -> Result<usize, usize> {
        validate_exchange_ordering(success, failure);
        self.0.compare_exchange(expected, new, success, failure)
    }

    /// Address of the word itself. Self-relative encodings are anchored here.
    #[inline]
    pub fn address(&self) -> usize {
        self.0.as_ptr() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_then_snapshot() {
        let word = SharedWord::new(0x10);
        assert_eq!(word.snapshot(), 0x10);
        word.publish(0xdead_bee0);
        assert_eq!(word.snapshot(), 0xdead_bee0);
    }

    #[test]
    fn test_compare_exchange_reports_observed() {
        let word = SharedWord::new(5);
        assert_eq!(word.compare_exchange(5, 9), Ok(5));
        assert_eq!(word.compare_exchange(5, 11), Err(9));
        assert_eq!(word.snapshot(), 9);
    }

    #[test]
    fn test_address_is_field_address() {
        let word = SharedWord::new(0);
        assert_eq!(word.address(), &word as *const SharedWord as usize);
    }

    #[test]
    fn test_orderings() {
        let word = SharedWord::new(0);
        for ord in [Ordering::Relaxed, Ordering::Acquire, Ordering::SeqCst] {
            word.load(ord);
        }
        for ord in [Ordering::Relaxed, Ordering::Release, Ordering::SeqCst] {
            word.store(42, ord);
        }
    }

    #[test]
    #[cfg(feature = "memory-validation")]
    #[should_panic(expected = "Invalid load ordering")]
    fn test_invalid_load_ordering() {
        SharedWord::new(0).load(Ordering::Release);
    }

    #[test]
    #[cfg(feature = "memory-validation")]
    #[should_panic(expected = "Invalid store ordering")]
    fn test_invalid_store_ordering() {
        SharedWord::new(0).store(1, Ordering::Acquire);
    }

    #[test]
    fn test_exchange_orderings() {
        let word = SharedWord::new(1);
        assert_eq!(
            word.compare_exchange_with(1, 2, Ordering::AcqRel, Ordering::Acquire),
            Ok(1)
        );
        assert_eq!(
            word.compare_exchange_with(1, 3, Ordering::Relaxed, Ordering::Relaxed),
            Err(2)
        );
    }

    #[test]
    #[cfg(feature = "memory-validation")]
    #[should_panic(expected = "Invalid load ordering")]
    fn test_invalid_exchange_failure_ordering() {
        let word = SharedWord::new(0);
        let _ = word.compare_exchange_with(0, 1, Ordering::Release, Ordering::Release);
    }
}
