use serde::{Deserialize, Serialize};

/// Stock level of an item, derived from quantity alone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Ok,
    Low,
    Out,
}

impl StockLevel {
    /// `Out` iff quantity is 0; `Low` iff 0 < quantity <= threshold.
    pub fn for_quantity(quantity: i64, low_stock_threshold: i64) -> Self {
        if quantity == 0 {
            StockLevel::Out
        } else if quantity <= low_stock_threshold {
            StockLevel::Low
        } else {
            StockLevel::Ok
        }
    }
}
