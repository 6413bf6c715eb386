//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Note that a
/// clamped feeding deduction is **not** an error; it is a valid outcome
/// surfaced by the inventory engine so callers can warn the user.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A value failed validation (e.g. non-positive restock quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated (e.g. ledger replay would go negative).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A manual adjustment would drive stock below zero. Rejected outright;
    /// manual adjustments are deliberate and never clamped.
    #[error("adjustment of {requested} rejected: only {available} available")]
    InvalidAdjustment { available: i64, requested: i64 },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested item/household/target was not found. Never fatal.
    #[error("not found")]
    NotFound,

    /// Concurrent-write contention that bounded retries could not resolve.
    /// Surfaced as a retryable failure.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
