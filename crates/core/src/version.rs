//! Optimistic concurrency primitives for ledger streams.

use crate::error::{DomainError, DomainResult};

/// Optimistic concurrency expectation against an item's transaction stream.
///
/// The ledger store tracks a per-item version equal to the number of
/// committed transactions. Writers that base a decision on a read (e.g. a
/// clamped feeding deduction) append with `Exact` and retry on conflict;
/// writers whose delta is valid regardless of current state (restocks) may
/// use `Any`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the stream to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
