use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use scalekeeper_schedule::DedupeKey;

/// Idempotency record for notifications: at most one send per
/// `(kind, subject, calendar day)`, however many sweeps run that day.
pub trait DedupeStore: Send + Sync {
    /// Record the key; returns true exactly once per key.
    fn record_if_first(&self, key: DedupeKey) -> bool;
}

impl<T> DedupeStore for Arc<T>
where
    T: DedupeStore + ?Sized,
{
    fn record_if_first(&self, key: DedupeKey) -> bool {
        (**self).record_if_first(key)
    }
}

/// In-memory dedupe set for tests/dev and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryDedupeStore {
    seen: RwLock<HashSet<DedupeKey>>,
}

impl InMemoryDedupeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedupeStore for InMemoryDedupeStore {
    fn record_if_first(&self, key: DedupeKey) -> bool {
        let mut seen = self.seen.write().unwrap_or_else(|e| e.into_inner());
        seen.insert(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use scalekeeper_schedule::DueKind;
    use uuid::Uuid;

    #[test]
    fn first_record_wins_repeats_lose() {
        let store = InMemoryDedupeStore::new();
        let day = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let subject = Uuid::now_v7();
        let key = (DueKind::OverdueFeeding, subject, day);

        assert!(store.record_if_first(key));
        assert!(!store.record_if_first(key));

        // A new day or kind is a fresh key.
        assert!(store.record_if_first((DueKind::OverdueFeeding, subject, day.succ_opt().unwrap())));
        assert!(store.record_if_first((DueKind::LowStock, subject, day)));
    }
}
