use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scalekeeper_core::{FeedingRef, HouseholdId, ItemId, ReptileId};

/// A feeding logged by an external collaborator (the feeding-log module).
///
/// The core consumes this as-is: when `ate` is false or no inventory item is
/// linked, no deduction occurs. The feeding log itself lives elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingEvent {
    pub feeding_id: FeedingRef,
    pub reptile_id: ReptileId,
    pub household_id: HouseholdId,
    pub food_type: String,
    pub food_size: Option<String>,
    pub quantity_requested: i64,
    pub inventory_item_id: Option<ItemId>,
    pub ate: bool,
    pub occurred_at: DateTime<Utc>,
}

impl FeedingEvent {
    /// Whether this feeding should touch the ledger at all.
    pub fn deducts_stock(&self) -> bool {
        self.ate && self.inventory_item_id.is_some()
    }
}
