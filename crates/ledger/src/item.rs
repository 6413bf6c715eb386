use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scalekeeper_core::{HouseholdId, ItemId};

/// Natural key of an inventory item: unique per household.
///
/// Food type/size are stored trimmed so `"Mouse "` and `"Mouse"` resolve to
/// the same item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub household_id: HouseholdId,
    pub food_type: String,
    pub food_size: Option<String>,
}

impl ItemKey {
    pub fn new(
        household_id: HouseholdId,
        food_type: impl Into<String>,
        food_size: Option<String>,
    ) -> Self {
        let food_size = food_size
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            household_id,
            food_type: food_type.into().trim().to_string(),
            food_size,
        }
    }
}

/// A food stock item owned by exactly one household.
///
/// `quantity` is a cache over the item's transaction stream and `version` is
/// the number of committed transactions (the optimistic-concurrency token).
/// Items are never physically deleted while transactions reference them;
/// `retired` is the zero-and-retire soft delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub household_id: HouseholdId,
    pub food_type: String,
    pub food_size: Option<String>,
    pub quantity: i64,
    pub unit: String,
    pub cost_per_unit: Option<f64>,
    pub supplier: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub retired: bool,
    pub version: u64,
}

impl InventoryItem {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(
            self.household_id,
            self.food_type.clone(),
            self.food_size.clone(),
        )
    }
}

/// Attributes for creating an item on first purchase/restock of a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub key: ItemKey,
    pub unit: String,
    pub cost_per_unit: Option<f64>,
    pub supplier: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalizes_whitespace_and_empty_size() {
        let household = HouseholdId::new();
        let a = ItemKey::new(household, " Mouse ", Some("  ".to_string()));
        let b = ItemKey::new(household, "Mouse", None);
        assert_eq!(a, b);
    }

    #[test]
    fn keys_differ_across_households() {
        let a = ItemKey::new(HouseholdId::new(), "Cricket", None);
        let b = ItemKey::new(HouseholdId::new(), "Cricket", None);
        assert_ne!(a, b);
    }
}
