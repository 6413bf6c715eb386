use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scalekeeper_core::{FeedingRef, ItemId};

/// Why a quantity changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Restock / purchase (delta > 0).
    Purchase,
    /// Stock consumed by a logged feeding (delta <= 0, clamped at available).
    FeedingDeduction,
    /// Deliberate manual correction (signed delta, never clamped).
    ManualAdjustment,
    /// Write-off for spoiled/expired stock (delta < 0).
    Waste,
}

/// Immutable, append-only record of one quantity change.
///
/// `sequence_number` is assigned by the store, monotonically increasing per
/// item starting at 1. Replaying `quantity_delta` in sequence order always
/// reproduces the item's cached quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: Uuid,
    pub item_id: ItemId,
    pub kind: TransactionKind,
    pub quantity_delta: i64,
    pub occurred_at: DateTime<Utc>,
    /// Link to the feeding-log entry that caused this change, if any.
    pub reference: Option<FeedingRef>,
    pub note: Option<String>,
    pub sequence_number: u64,
}

/// A transaction ready to be appended (not yet assigned a sequence number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub item_id: ItemId,
    pub kind: TransactionKind,
    pub quantity_delta: i64,
    pub occurred_at: DateTime<Utc>,
    pub reference: Option<FeedingRef>,
    pub note: Option<String>,
}

impl NewTransaction {
    pub fn new(
        item_id: ItemId,
        kind: TransactionKind,
        quantity_delta: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id,
            kind,
            quantity_delta,
            occurred_at,
            reference: None,
            note: None,
        }
    }

    pub fn with_reference(mut self, reference: FeedingRef) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
