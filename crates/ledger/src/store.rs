use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use chrono::{DateTime, Utc};
use scalekeeper_core::{DomainError, ExpectedVersion, HouseholdId, ItemId};

use crate::item::{InventoryItem, ItemKey, NewItem};
use crate::transaction::{LedgerTransaction, NewTransaction};

/// Ledger store operation error.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Optimistic concurrency check failed, a duplicate natural key was
    /// inserted, or per-item serialization broke down. Retryable.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    /// The append would desynchronize the cache or drive it negative. The
    /// store is the last line of defense; policy clamping happens upstream
    /// in the inventory engine.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl From<LedgerError> for DomainError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Conflict(msg) => DomainError::Conflict(msg),
            LedgerError::NotFound => DomainError::NotFound,
            LedgerError::InvariantViolation(msg) => DomainError::InvariantViolation(msg),
            LedgerError::Validation(msg) => DomainError::Validation(msg),
        }
    }
}

/// One page of a restartable transaction listing.
///
/// `next_cursor` is the sequence number to resume from; `None` means the
/// listing is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub entries: Vec<T>,
    pub next_cursor: Option<u64>,
}

/// Point-in-time consistent copy of an item and its full transaction history.
///
/// Taken under the item's own lock, so a reader never observes a transaction
/// without its quantity update (or vice versa). Forecasting reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item: InventoryItem,
    pub transactions: Vec<LedgerTransaction>,
}

/// Append-only, household-scoped ledger store.
///
/// Transactions for a single item are applied in the order they are
/// accepted; there is no ordering guarantee between items. Appending a
/// transaction and updating the cached quantity are one atomic unit.
pub trait LedgerStore: Send + Sync {
    /// Create an item on first purchase/restock of its natural key.
    ///
    /// Returns `Conflict` if a live (non-retired) item already owns the key.
    fn create_item(&self, new: NewItem) -> Result<InventoryItem, LedgerError>;

    fn get_item(&self, item_id: ItemId) -> Result<InventoryItem, LedgerError>;

    /// Look up a live item by natural key.
    fn find_item(&self, key: &ItemKey) -> Result<Option<InventoryItem>, LedgerError>;

    fn list_items(&self, household_id: HouseholdId) -> Result<Vec<InventoryItem>, LedgerError>;

    /// Append one transaction to an item's stream.
    ///
    /// Implementations must:
    /// - enforce the optimistic concurrency check against the item version
    /// - assign a monotonically increasing `sequence_number` (current + 1)
    /// - update the cached quantity in the same atomic unit
    /// - reject a resulting negative quantity with `InvariantViolation`
    fn append(
        &self,
        new: NewTransaction,
        expected: ExpectedVersion,
    ) -> Result<LedgerTransaction, LedgerError>;

    /// List transactions in sequence order, optionally bounded by
    /// `occurred_at >= since`, restartable via `cursor` (last sequence
    /// number already seen).
    fn transactions_since(
        &self,
        item_id: ItemId,
        since: Option<DateTime<Utc>>,
        cursor: Option<u64>,
        limit: usize,
    ) -> Result<Page<LedgerTransaction>, LedgerError>;

    /// Consistent snapshot of one item and its history.
    fn snapshot(&self, item_id: ItemId) -> Result<ItemSnapshot, LedgerError>;

    /// Soft-delete an item. Requires quantity 0; history stays readable.
    fn retire_item(&self, item_id: ItemId) -> Result<(), LedgerError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn create_item(&self, new: NewItem) -> Result<InventoryItem, LedgerError> {
        (**self).create_item(new)
    }

    fn get_item(&self, item_id: ItemId) -> Result<InventoryItem, LedgerError> {
        (**self).get_item(item_id)
    }

    fn find_item(&self, key: &ItemKey) -> Result<Option<InventoryItem>, LedgerError> {
        (**self).find_item(key)
    }

    fn list_items(&self, household_id: HouseholdId) -> Result<Vec<InventoryItem>, LedgerError> {
        (**self).list_items(household_id)
    }

    fn append(
        &self,
        new: NewTransaction,
        expected: ExpectedVersion,
    ) -> Result<LedgerTransaction, LedgerError> {
        (**self).append(new, expected)
    }

    fn transactions_since(
        &self,
        item_id: ItemId,
        since: Option<DateTime<Utc>>,
        cursor: Option<u64>,
        limit: usize,
    ) -> Result<Page<LedgerTransaction>, LedgerError> {
        (**self).transactions_since(item_id, since, cursor, limit)
    }

    fn snapshot(&self, item_id: ItemId) -> Result<ItemSnapshot, LedgerError> {
        (**self).snapshot(item_id)
    }

    fn retire_item(&self, item_id: ItemId) -> Result<(), LedgerError> {
        (**self).retire_item(item_id)
    }
}
