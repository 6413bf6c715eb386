use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use scalekeeper_core::{ExpectedVersion, HouseholdId, ItemId};

use crate::item::{InventoryItem, ItemKey, NewItem};
use crate::store::{ItemSnapshot, LedgerError, LedgerStore, Page};
use crate::transaction::{LedgerTransaction, NewTransaction};

#[derive(Debug)]
struct ItemRecord {
    item: InventoryItem,
    transactions: Vec<LedgerTransaction>,
}

/// In-memory ledger store with per-item serialization.
///
/// Each item lives behind its own mutex, so writers against one item
/// serialize while unrelated items mutate fully in parallel. The natural-key
/// index maps live items only; retiring an item frees its key for a future
/// restock while history stays readable by id.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    records: RwLock<HashMap<ItemId, Arc<Mutex<ItemRecord>>>>,
    keys: RwLock<HashMap<ItemKey, ItemId>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, item_id: ItemId) -> Result<Arc<Mutex<ItemRecord>>, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|_| LedgerError::Conflict("records lock poisoned".to_string()))?;
        records.get(&item_id).cloned().ok_or(LedgerError::NotFound)
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn create_item(&self, new: NewItem) -> Result<InventoryItem, LedgerError> {
        if new.key.food_type.is_empty() {
            return Err(LedgerError::Validation(
                "food_type cannot be empty".to_string(),
            ));
        }

        let mut keys = self
            .keys
            .write()
            .map_err(|_| LedgerError::Conflict("key index lock poisoned".to_string()))?;

        if keys.contains_key(&new.key) {
            return Err(LedgerError::Conflict(format!(
                "item already exists for key ({}, {:?})",
                new.key.food_type, new.key.food_size
            )));
        }

        let item = InventoryItem {
            id: ItemId::new(),
            household_id: new.key.household_id,
            food_type: new.key.food_type.clone(),
            food_size: new.key.food_size.clone(),
            quantity: 0,
            unit: new.unit,
            cost_per_unit: new.cost_per_unit,
            supplier: new.supplier,
            purchase_date: new.purchase_date,
            expiry_date: new.expiry_date,
            retired: false,
            version: 0,
        };

        let mut records = self
            .records
            .write()
            .map_err(|_| LedgerError::Conflict("records lock poisoned".to_string()))?;

        keys.insert(new.key, item.id);
        records.insert(
            item.id,
            Arc::new(Mutex::new(ItemRecord {
                item: item.clone(),
                transactions: Vec::new(),
            })),
        );

        debug!(item_id = %item.id, food_type = %item.food_type, "inventory item created");
        Ok(item)
    }

    fn get_item(&self, item_id: ItemId) -> Result<InventoryItem, LedgerError> {
        let record = self.record(item_id)?;
        let guard = record
            .lock()
            .map_err(|_| LedgerError::Conflict("item lock poisoned".to_string()))?;
        Ok(guard.item.clone())
    }

    fn find_item(&self, key: &ItemKey) -> Result<Option<InventoryItem>, LedgerError> {
        let keys = self
            .keys
            .read()
            .map_err(|_| LedgerError::Conflict("key index lock poisoned".to_string()))?;
        match keys.get(key) {
            Some(id) => Ok(Some(self.get_item(*id)?)),
            None => Ok(None),
        }
    }

    fn list_items(&self, household_id: HouseholdId) -> Result<Vec<InventoryItem>, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|_| LedgerError::Conflict("records lock poisoned".to_string()))?;

        let mut items = Vec::new();
        for record in records.values() {
            let guard = record
                .lock()
                .map_err(|_| LedgerError::Conflict("item lock poisoned".to_string()))?;
            if guard.item.household_id == household_id {
                items.push(guard.item.clone());
            }
        }

        // Stable listing order for callers and tests.
        items.sort_by_key(|i| *i.id.as_uuid());
        Ok(items)
    }

    fn append(
        &self,
        new: NewTransaction,
        expected: ExpectedVersion,
    ) -> Result<LedgerTransaction, LedgerError> {
        let record = self.record(new.item_id)?;
        let mut guard = record
            .lock()
            .map_err(|_| LedgerError::Conflict("item lock poisoned".to_string()))?;

        if guard.item.retired {
            return Err(LedgerError::Validation("item is retired".to_string()));
        }

        let current = guard.item.version;
        if !expected.matches(current) {
            return Err(LedgerError::Conflict(format!(
                "expected {expected:?}, found {current}"
            )));
        }

        let new_quantity = guard.item.quantity + new.quantity_delta;
        if new_quantity < 0 {
            return Err(LedgerError::InvariantViolation(format!(
                "delta {} would drive quantity {} below zero",
                new.quantity_delta, guard.item.quantity
            )));
        }

        // Transaction append and cache update are one critical section:
        // partial application is impossible.
        let committed = LedgerTransaction {
            id: Uuid::now_v7(),
            item_id: new.item_id,
            kind: new.kind,
            quantity_delta: new.quantity_delta,
            occurred_at: new.occurred_at,
            reference: new.reference,
            note: new.note,
            sequence_number: current + 1,
        };

        guard.transactions.push(committed.clone());
        guard.item.quantity = new_quantity;
        guard.item.version = committed.sequence_number;

        debug!(
            item_id = %new.item_id,
            kind = ?committed.kind,
            delta = committed.quantity_delta,
            quantity = new_quantity,
            seq = committed.sequence_number,
            "ledger transaction committed"
        );

        Ok(committed)
    }

    fn transactions_since(
        &self,
        item_id: ItemId,
        since: Option<DateTime<Utc>>,
        cursor: Option<u64>,
        limit: usize,
    ) -> Result<Page<LedgerTransaction>, LedgerError> {
        let record = self.record(item_id)?;
        let guard = record
            .lock()
            .map_err(|_| LedgerError::Conflict("item lock poisoned".to_string()))?;

        let after = cursor.unwrap_or(0);
        let mut matching = guard
            .transactions
            .iter()
            .filter(|tx| tx.sequence_number > after)
            .filter(|tx| since.is_none_or(|s| tx.occurred_at >= s))
            .cloned();

        let entries: Vec<_> = matching.by_ref().take(limit).collect();
        let next_cursor = if matching.next().is_some() {
            entries.last().map(|tx| tx.sequence_number)
        } else {
            None
        };

        Ok(Page {
            entries,
            next_cursor,
        })
    }

    fn snapshot(&self, item_id: ItemId) -> Result<ItemSnapshot, LedgerError> {
        let record = self.record(item_id)?;
        let guard = record
            .lock()
            .map_err(|_| LedgerError::Conflict("item lock poisoned".to_string()))?;
        Ok(ItemSnapshot {
            item: guard.item.clone(),
            transactions: guard.transactions.clone(),
        })
    }

    fn retire_item(&self, item_id: ItemId) -> Result<(), LedgerError> {
        let record = self.record(item_id)?;
        let mut guard = record
            .lock()
            .map_err(|_| LedgerError::Conflict("item lock poisoned".to_string()))?;

        if guard.item.quantity != 0 {
            return Err(LedgerError::Validation(format!(
                "cannot retire item with quantity {}",
                guard.item.quantity
            )));
        }
        if guard.item.retired {
            return Ok(());
        }

        guard.item.retired = true;
        let key = guard.item.key();
        drop(guard);

        // Free the natural key so a future restock can recreate the item.
        if let Ok(mut keys) = self.keys.write() {
            keys.remove(&key);
        }
        Ok(())
    }
}
