use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scalekeeper_core::HouseholdId;

/// What a due event is about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueKind {
    OverdueFeeding,
    LowStock,
    OutOfStock,
}

/// Key the dispatcher dedupes on: at most one notification per kind and
/// subject per calendar day.
pub type DedupeKey = (DueKind, Uuid, NaiveDate);

/// A computed condition ready for notification.
///
/// Transient: not persisted beyond dispatch bookkeeping. `subject_id` is the
/// reptile for feeding events and the inventory item for stock events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueEvent {
    pub kind: DueKind,
    pub household_id: HouseholdId,
    pub subject_id: Uuid,
    pub computed_at: DateTime<Utc>,
}

impl DueEvent {
    pub fn new(
        kind: DueKind,
        household_id: HouseholdId,
        subject_id: Uuid,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            household_id,
            subject_id,
            computed_at,
        }
    }

    pub fn dedupe_key(&self) -> DedupeKey {
        (self.kind, self.subject_id, self.computed_at.date_naive())
    }
}
