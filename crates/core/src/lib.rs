//! `scalekeeper-core` — shared domain primitives.
//!
//! This crate contains **pure domain** primitives shared by the ledger,
//! inventory, forecast, schedule and dispatch crates (no infrastructure
//! concerns).

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{DeviceId, FeedingRef, HouseholdId, ItemId, ReptileId, UserId};
pub use version::ExpectedVersion;
