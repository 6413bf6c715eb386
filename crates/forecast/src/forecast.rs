use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use scalekeeper_core::{DomainResult, ItemId};
use scalekeeper_ledger::{ItemSnapshot, LedgerStore, TransactionKind};

/// Forecast tuning knobs.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Trailing window of feeding history considered, in days.
    pub window_days: i64,
    /// A reorder suggestion fires when the estimate is at or under this.
    pub reorder_horizon_days: i64,
    /// Floor for suggested reorder quantities.
    pub min_order_quantity: i64,
    /// How many days of consumption a suggested reorder should cover.
    pub restock_cover_days: i64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            reorder_horizon_days: 14,
            min_order_quantity: 10,
            restock_cover_days: 30,
        }
    }
}

/// How much weight to put on the numeric projection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Fewer than two distinct feeding dates in the window; no numbers are
    /// fabricated from a single data point.
    Unknown,
    /// Two to four distinct feeding dates.
    Low,
    /// Five or more distinct feeding dates.
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderSuggestion {
    pub quantity: i64,
}

/// Depletion forecast for one inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub item_id: ItemId,
    pub rate_per_day: Option<f64>,
    /// `None` when unknown, or when the observed rate is zero (never runs
    /// out at the current pace).
    pub days_remaining: Option<f64>,
    /// Also `None` when the projected date is too far out to represent.
    pub estimated_depletion: Option<DateTime<Utc>>,
    pub confidence: Confidence,
    pub reorder: Option<ReorderSuggestion>,
}

impl ForecastResult {
    fn unknown(item_id: ItemId) -> Self {
        Self {
            item_id,
            rate_per_day: None,
            days_remaining: None,
            estimated_depletion: None,
            confidence: Confidence::Unknown,
            reorder: None,
        }
    }
}

/// Compute a depletion forecast from a point-in-time ledger snapshot.
///
/// Only `FeedingDeduction` transactions inside the trailing window count.
/// The earliest in-window deduction anchors the observation interval; the
/// rate is what was consumed after that anchor, divided by the
/// earliest-to-latest span. A sparse history is therefore not diluted by
/// the fixed window length.
pub fn forecast(
    snapshot: &ItemSnapshot,
    now: DateTime<Utc>,
    config: &ForecastConfig,
) -> ForecastResult {
    let window_start = now - Duration::days(config.window_days);
    let item_id = snapshot.item.id;

    let deductions: Vec<_> = snapshot
        .transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::FeedingDeduction)
        .filter(|tx| tx.occurred_at > window_start && tx.occurred_at <= now)
        .collect();

    let distinct_days: BTreeSet<_> = deductions
        .iter()
        .map(|tx| tx.occurred_at.date_naive())
        .collect();
    if distinct_days.len() < 2 {
        return ForecastResult::unknown(item_id);
    }

    // Safe unwraps below: at least two deductions exist here.
    let earliest = deductions.iter().map(|tx| tx.occurred_at).min().unwrap();
    let latest = deductions.iter().map(|tx| tx.occurred_at).max().unwrap();
    let span_days = (latest - earliest).num_seconds() as f64 / 86_400.0;

    let consumed_after_anchor: i64 = deductions
        .iter()
        .filter(|tx| tx.occurred_at > earliest)
        .map(|tx| -tx.quantity_delta)
        .sum();

    let rate_per_day = consumed_after_anchor as f64 / span_days;
    let confidence = if distinct_days.len() >= 5 {
        Confidence::High
    } else {
        Confidence::Low
    };

    if rate_per_day <= 0.0 {
        // Only zero-delta (clamped) feedings observed; nothing is being
        // consumed, so there is no finite depletion date.
        return ForecastResult {
            item_id,
            rate_per_day: Some(0.0),
            days_remaining: None,
            estimated_depletion: None,
            confidence,
            reorder: None,
        };
    }

    let days_remaining = snapshot.item.quantity as f64 / rate_per_day;
    // A huge stock at a trickle rate can project a date beyond what the
    // datetime type can hold; leave the date unstated rather than panic.
    let estimated_depletion = Duration::try_seconds((days_remaining * 86_400.0) as i64)
        .and_then(|d| now.checked_add_signed(d));

    let reorder = if days_remaining <= config.reorder_horizon_days as f64 {
        let covering = (rate_per_day * config.restock_cover_days as f64).ceil() as i64;
        Some(ReorderSuggestion {
            quantity: covering.max(config.min_order_quantity),
        })
    } else {
        None
    };

    ForecastResult {
        item_id,
        rate_per_day: Some(rate_per_day),
        days_remaining: Some(days_remaining),
        estimated_depletion,
        confidence,
        reorder,
    }
}

/// Convenience wrapper that reads the snapshot from a ledger store.
#[derive(Debug)]
pub struct ForecastEngine<S: LedgerStore> {
    store: Arc<S>,
    config: ForecastConfig,
}

impl<S: LedgerStore> ForecastEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, ForecastConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: ForecastConfig) -> Self {
        Self { store, config }
    }

    pub fn forecast_item(&self, item_id: ItemId, now: DateTime<Utc>) -> DomainResult<ForecastResult> {
        let snapshot = self.store.snapshot(item_id)?;
        Ok(forecast(&snapshot, now, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalekeeper_core::{ExpectedVersion, FeedingRef, HouseholdId};
    use scalekeeper_ledger::{
        InMemoryLedgerStore, ItemKey, NewItem, NewTransaction,
    };

    fn snapshot_with(
        initial: i64,
        feedings: &[(i64, i64)], // (days ago, quantity)
        now: DateTime<Utc>,
    ) -> ItemSnapshot {
        let store = InMemoryLedgerStore::new();
        let item = store
            .create_item(NewItem {
                key: ItemKey::new(HouseholdId::new(), "Mouse", None),
                unit: "unit".to_string(),
                cost_per_unit: None,
                supplier: None,
                purchase_date: now - Duration::days(60),
                expiry_date: None,
            })
            .unwrap();
        store
            .append(
                NewTransaction::new(
                    item.id,
                    TransactionKind::Purchase,
                    initial,
                    now - Duration::days(60),
                ),
                ExpectedVersion::Any,
            )
            .unwrap();

        for &(days_ago, quantity) in feedings {
            store
                .append(
                    NewTransaction::new(
                        item.id,
                        TransactionKind::FeedingDeduction,
                        -quantity,
                        now - Duration::days(days_ago),
                    )
                    .with_reference(FeedingRef::new()),
                    ExpectedVersion::Any,
                )
                .unwrap();
        }

        store.snapshot(item.id).unwrap()
    }

    #[test]
    fn single_feeding_date_yields_unknown() {
        let now = Utc::now();
        let snap = snapshot_with(50, &[(3, 5)], now);

        let result = forecast(&snap, now, &ForecastConfig::default());
        assert_eq!(result.confidence, Confidence::Unknown);
        assert_eq!(result.rate_per_day, None);
        assert_eq!(result.days_remaining, None);
        assert_eq!(result.reorder, None);
    }

    #[test]
    fn two_feedings_on_the_same_day_yield_unknown() {
        let now = Utc::now();
        let snap = snapshot_with(50, &[(3, 5), (3, 5)], now);

        let result = forecast(&snap, now, &ForecastConfig::default());
        assert_eq!(result.confidence, Confidence::Unknown);
    }

    #[test]
    fn two_feedings_five_days_apart_give_unit_rate() {
        // Two deductions of 5 units each, 5 days apart, 50 on hand:
        // rate 1.0/day, 50 days remaining.
        let now = Utc::now();
        let snap = snapshot_with(60, &[(10, 5), (5, 5)], now);
        assert_eq!(snap.item.quantity, 50);

        let result = forecast(&snap, now, &ForecastConfig::default());
        assert_eq!(result.confidence, Confidence::Low);
        let rate = result.rate_per_day.unwrap();
        assert!((rate - 1.0).abs() < 1e-9, "rate was {rate}");
        let days = result.days_remaining.unwrap();
        assert!((days - 50.0).abs() < 1e-9, "days_remaining was {days}");
        assert!(result.reorder.is_none());

        let depletion = result.estimated_depletion.unwrap();
        assert_eq!((depletion - now).num_days(), 50);
    }

    #[test]
    fn feedings_outside_the_window_are_ignored() {
        let now = Utc::now();
        // Only the 40-days-ago feeding would make a second distinct date.
        let snap = snapshot_with(50, &[(40, 5), (3, 5)], now);

        let result = forecast(&snap, now, &ForecastConfig::default());
        assert_eq!(result.confidence, Confidence::Unknown);
    }

    #[test]
    fn reorder_fires_inside_the_horizon_with_floor() {
        let now = Utc::now();
        // 6 units consumed after the anchor over a 6-day span: 1/day.
        let snap = snapshot_with(24, &[(8, 2), (6, 2), (4, 2), (2, 2)], now);
        assert_eq!(snap.item.quantity, 16);

        let config = ForecastConfig::default();
        let result = forecast(&snap, now, &config);
        let rate = result.rate_per_day.unwrap();
        assert!((rate - 1.0).abs() < 1e-9);
        // 16 units at 1/day -> 16 days: outside the 14-day horizon.
        assert!(result.reorder.is_none());

        // Drop stock into the horizon.
        let mut snap = snap;
        snap.item.quantity = 5;
        let result = forecast(&snap, now, &config);
        let suggestion = result.reorder.unwrap();
        // 1/day * 30 cover days = 30, above the floor of 10.
        assert_eq!(suggestion.quantity, 30);
    }

    #[test]
    fn reorder_quantity_never_drops_below_minimum() {
        let now = Utc::now();
        // Slow burner: 1 unit every 10 days.
        let snap = snapshot_with(3, &[(20, 1), (10, 1)], now);
        assert_eq!(snap.item.quantity, 1);

        let result = forecast(&snap, now, &ForecastConfig::default());
        let rate = result.rate_per_day.unwrap();
        assert!((rate - 0.1).abs() < 1e-9);
        let suggestion = result.reorder.unwrap();
        assert_eq!(suggestion.quantity, 10); // ceil(0.1 * 30) = 3, floored to 10
    }

    #[test]
    fn unrepresentable_depletion_date_is_left_unstated() {
        let now = Utc::now();
        // 500 billion units trickling away at 0.1/day projects a date far
        // beyond the representable range.
        let snap = snapshot_with(500_000_000_000, &[(13, 1), (3, 1)], now);

        let result = forecast(&snap, now, &ForecastConfig::default());
        let rate = result.rate_per_day.unwrap();
        assert!((rate - 0.1).abs() < 1e-9);
        assert!(result.days_remaining.unwrap() > 1e12);
        assert_eq!(result.estimated_depletion, None);
        assert_eq!(result.reorder, None);
    }

    #[test]
    fn zero_rate_means_no_finite_depletion() {
        let now = Utc::now();
        // Clamped feedings against an empty shelf: deltas of zero.
        let snap = snapshot_with(0, &[(6, 0), (3, 0)], now);

        let result = forecast(&snap, now, &ForecastConfig::default());
        assert_eq!(result.rate_per_day, Some(0.0));
        assert_eq!(result.days_remaining, None);
        assert_eq!(result.estimated_depletion, None);
        assert_eq!(result.reorder, None);
    }

    #[test]
    fn five_distinct_days_raise_confidence() {
        let now = Utc::now();
        let snap = snapshot_with(
            100,
            &[(10, 2), (8, 2), (6, 2), (4, 2), (2, 2)],
            now,
        );

        let result = forecast(&snap, now, &ForecastConfig::default());
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn engine_reads_consistent_snapshot_from_store() {
        let now = Utc::now();
        let store = Arc::new(InMemoryLedgerStore::new());
        let item = store
            .create_item(NewItem {
                key: ItemKey::new(HouseholdId::new(), "Cricket", None),
                unit: "unit".to_string(),
                cost_per_unit: None,
                supplier: None,
                purchase_date: now,
                expiry_date: None,
            })
            .unwrap();
        store
            .append(
                NewTransaction::new(item.id, TransactionKind::Purchase, 50, now),
                ExpectedVersion::Any,
            )
            .unwrap();

        let engine = ForecastEngine::new(store);
        let result = engine.forecast_item(item.id, now).unwrap();
        assert_eq!(result.confidence, Confidence::Unknown);
    }
}
