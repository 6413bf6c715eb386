use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use scalekeeper_core::{DomainResult, HouseholdId, ItemId, ReptileId};
use scalekeeper_inventory::StockLevel;
use scalekeeper_ledger::{InventoryItem, LedgerStore};

use crate::due::{DueEvent, DueKind};
use crate::schedule::{FeedingSchedule, ScheduleState};

/// External feeding-log/reptile data source.
///
/// The schedule engine never owns this data; the surrounding app's profile
/// and feeding modules feed it in.
pub trait ScheduleSource: Send + Sync + std::fmt::Debug {
    fn households(&self) -> Vec<HouseholdId>;
    fn schedules_for(&self, household_id: HouseholdId) -> Vec<FeedingSchedule>;
}

impl<T> ScheduleSource for Arc<T>
where
    T: ScheduleSource + ?Sized,
{
    fn households(&self) -> Vec<HouseholdId> {
        (**self).households()
    }

    fn schedules_for(&self, household_id: HouseholdId) -> Vec<FeedingSchedule> {
        (**self).schedules_for(household_id)
    }
}

/// In-memory schedule source for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryScheduleSource {
    schedules: RwLock<HashMap<HouseholdId, Vec<FeedingSchedule>>>,
}

impl InMemoryScheduleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, schedule: FeedingSchedule) {
        let mut map = self.schedules.write().unwrap_or_else(|e| e.into_inner());
        let list = map.entry(schedule.household_id).or_default();
        match list.iter_mut().find(|s| s.reptile_id == schedule.reptile_id) {
            Some(existing) => *existing = schedule,
            None => list.push(schedule),
        }
    }

    /// Advance `last_fed_at` for a reptile (collaborator-supplied feeding).
    pub fn record_feeding(&self, reptile_id: ReptileId, at: DateTime<Utc>) {
        let mut map = self.schedules.write().unwrap_or_else(|e| e.into_inner());
        for list in map.values_mut() {
            for s in list.iter_mut().filter(|s| s.reptile_id == reptile_id) {
                s.record_feeding(at);
            }
        }
    }
}

impl ScheduleSource for InMemoryScheduleSource {
    fn households(&self) -> Vec<HouseholdId> {
        let map = self.schedules.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<_> = map.keys().copied().collect();
        ids.sort_by_key(|h| *h.as_uuid());
        ids
    }

    fn schedules_for(&self, household_id: HouseholdId) -> Vec<FeedingSchedule> {
        let map = self.schedules.read().unwrap_or_else(|e| e.into_inner());
        map.get(&household_id).cloned().unwrap_or_default()
    }
}

/// Sweep/evaluation tuning knobs.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Days before the due date at which a schedule turns `DueSoon`.
    pub advance_notice_days: i64,
    /// Quantity at or below which stock counts as low.
    pub low_stock_threshold: i64,
    /// Whether a deduction triggers an immediate stock evaluation instead of
    /// waiting for the next sweep.
    pub notify_on_deduction: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            advance_notice_days: 1,
            low_stock_threshold: 5,
            notify_on_deduction: true,
        }
    }
}

/// Computes due/overdue conditions for feedings and stock thresholds.
///
/// Both the recurring sweep and the on-demand paths funnel through the same
/// pure per-entity evaluation, so running them twice with no intervening
/// state change yields the same events.
#[derive(Debug)]
pub struct ScheduleEngine<S: LedgerStore> {
    source: Arc<dyn ScheduleSource>,
    store: Arc<S>,
    config: SweepConfig,
}

impl<S: LedgerStore> ScheduleEngine<S> {
    pub fn new(source: Arc<dyn ScheduleSource>, store: Arc<S>) -> Self {
        Self::with_config(source, store, SweepConfig::default())
    }

    pub fn with_config(
        source: Arc<dyn ScheduleSource>,
        store: Arc<S>,
        config: SweepConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Pure evaluation of one feeding schedule.
    pub fn evaluate_schedule(
        &self,
        schedule: &FeedingSchedule,
        now: DateTime<Utc>,
    ) -> Option<DueEvent> {
        if !schedule.active {
            return None;
        }
        match schedule.state(now, self.config.advance_notice_days) {
            ScheduleState::Overdue => Some(DueEvent::new(
                DueKind::OverdueFeeding,
                schedule.household_id,
                *schedule.reptile_id.as_uuid(),
                now,
            )),
            ScheduleState::DueSoon | ScheduleState::OnTrack => None,
        }
    }

    /// Pure evaluation of one inventory item's stock level.
    pub fn evaluate_stock(&self, item: &InventoryItem, now: DateTime<Utc>) -> Option<DueEvent> {
        if item.retired {
            return None;
        }
        let kind = match StockLevel::for_quantity(item.quantity, self.config.low_stock_threshold) {
            StockLevel::Out => DueKind::OutOfStock,
            StockLevel::Low => DueKind::LowStock,
            StockLevel::Ok => return None,
        };
        Some(DueEvent::new(
            kind,
            item.household_id,
            *item.id.as_uuid(),
            now,
        ))
    }

    /// Evaluate one household from a single point-in-time view: overdue
    /// feedings first, then stock thresholds.
    pub fn evaluate_household(
        &self,
        household_id: HouseholdId,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<DueEvent>> {
        let mut events = Vec::new();

        for schedule in self.source.schedules_for(household_id) {
            if let Some(event) = self.evaluate_schedule(&schedule, now) {
                events.push(event);
            }
        }

        for item in self.store.list_items(household_id)? {
            if let Some(event) = self.evaluate_stock(&item, now) {
                events.push(event);
            }
        }

        debug!(
            household_id = %household_id,
            events = events.len(),
            "household evaluated"
        );
        Ok(events)
    }

    /// Full evaluation across all known households.
    ///
    /// Each household's events are computed from one snapshot; there is no
    /// cross-household ordering guarantee.
    pub fn sweep(&self, now: DateTime<Utc>) -> DomainResult<Vec<DueEvent>> {
        let mut events = Vec::new();
        for household_id in self.source.households() {
            match self.evaluate_household(household_id, now) {
                Ok(mut batch) => events.append(&mut batch),
                Err(err) => {
                    warn!(household_id = %household_id, error = %err, "household evaluation failed");
                    return Err(err);
                }
            }
        }
        Ok(events)
    }

    /// On-demand path, called right after a deduction so a shelf emptied by
    /// a feeding is reported without waiting for the next sweep. Returns
    /// `None` when disabled or stock is fine.
    pub fn evaluate_after_deduction(
        &self,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<DueEvent>> {
        if !self.config.notify_on_deduction {
            return Ok(None);
        }
        let item = self.store.get_item(item_id)?;
        Ok(self.evaluate_stock(&item, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use scalekeeper_core::ExpectedVersion;
    use scalekeeper_ledger::{
        InMemoryLedgerStore, ItemKey, NewItem, NewTransaction, TransactionKind,
    };

    struct Fixture {
        source: Arc<InMemoryScheduleSource>,
        store: Arc<InMemoryLedgerStore>,
        engine: ScheduleEngine<InMemoryLedgerStore>,
        household_id: HouseholdId,
    }

    fn fixture() -> Fixture {
        let source = Arc::new(InMemoryScheduleSource::new());
        let store = Arc::new(InMemoryLedgerStore::new());
        let engine = ScheduleEngine::new(source.clone(), store.clone());
        Fixture {
            source,
            store,
            engine,
            household_id: HouseholdId::new(),
        }
    }

    fn add_item(f: &Fixture, food_type: &str, quantity: i64) -> ItemId {
        let item = f
            .store
            .create_item(NewItem {
                key: ItemKey::new(f.household_id, food_type, None),
                unit: "unit".to_string(),
                cost_per_unit: None,
                supplier: None,
                purchase_date: Utc::now(),
                expiry_date: None,
            })
            .unwrap();
        if quantity > 0 {
            f.store
                .append(
                    NewTransaction::new(item.id, TransactionKind::Purchase, quantity, Utc::now()),
                    ExpectedVersion::Any,
                )
                .unwrap();
        }
        item.id
    }

    #[test]
    fn overdue_schedule_emits_one_event() {
        let f = fixture();
        let reptile_id = ReptileId::new();
        f.source.upsert(FeedingSchedule::new(
            reptile_id,
            f.household_id,
            7,
            Utc::now() - Duration::days(8),
        ));

        let events = f.engine.sweep(Utc::now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, DueKind::OverdueFeeding);
        assert_eq!(events[0].subject_id, *reptile_id.as_uuid());
        assert_eq!(events[0].household_id, f.household_id);
    }

    #[test]
    fn inactive_schedules_are_skipped() {
        let f = fixture();
        let mut schedule = FeedingSchedule::new(
            ReptileId::new(),
            f.household_id,
            7,
            Utc::now() - Duration::days(30),
        );
        schedule.deactivate();
        f.source.upsert(schedule);

        assert!(f.engine.sweep(Utc::now()).unwrap().is_empty());
    }

    #[test]
    fn stock_thresholds_map_to_event_kinds() {
        let f = fixture();
        // Register the household via an on-track schedule.
        f.source.upsert(FeedingSchedule::new(
            ReptileId::new(),
            f.household_id,
            14,
            Utc::now(),
        ));
        add_item(&f, "Mouse", 20);
        let low = add_item(&f, "Cricket", 3);
        let out = add_item(&f, "Locust", 0);

        let events = f.engine.sweep(Utc::now()).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .any(|e| e.kind == DueKind::LowStock && e.subject_id == *low.as_uuid()));
        assert!(events
            .iter()
            .any(|e| e.kind == DueKind::OutOfStock && e.subject_id == *out.as_uuid()));
    }

    #[test]
    fn sweep_is_idempotent_without_intervening_mutation() {
        let f = fixture();
        f.source.upsert(FeedingSchedule::new(
            ReptileId::new(),
            f.household_id,
            7,
            Utc::now() - Duration::days(10),
        ));
        add_item(&f, "Mouse", 2);

        let now = Utc::now();
        let first = f.engine.sweep(now).unwrap();
        let second = f.engine.sweep(now).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn evaluate_after_deduction_reports_emptied_shelf() {
        let f = fixture();
        let item_id = add_item(&f, "Mouse", 0);

        let event = f
            .engine
            .evaluate_after_deduction(item_id, Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, DueKind::OutOfStock);
    }

    #[test]
    fn evaluate_after_deduction_can_be_disabled() {
        let source = Arc::new(InMemoryScheduleSource::new());
        let store = Arc::new(InMemoryLedgerStore::new());
        let engine = ScheduleEngine::with_config(
            source,
            store.clone(),
            SweepConfig {
                notify_on_deduction: false,
                ..SweepConfig::default()
            },
        );

        let item = store
            .create_item(NewItem {
                key: ItemKey::new(HouseholdId::new(), "Mouse", None),
                unit: "unit".to_string(),
                cost_per_unit: None,
                supplier: None,
                purchase_date: Utc::now(),
                expiry_date: None,
            })
            .unwrap();

        assert_eq!(
            engine.evaluate_after_deduction(item.id, Utc::now()).unwrap(),
            None
        );
    }

    #[test]
    fn healthy_stock_after_deduction_is_quiet() {
        let f = fixture();
        let item_id = add_item(&f, "Mouse", 12);

        assert_eq!(
            f.engine
                .evaluate_after_deduction(item_id, Utc::now())
                .unwrap(),
            None
        );
    }
}
