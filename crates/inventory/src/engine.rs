use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scalekeeper_core::{DomainError, DomainResult, ExpectedVersion, FeedingRef, ItemId};
use scalekeeper_ledger::{
    InventoryItem, ItemKey, LedgerError, LedgerStore, LedgerTransaction, NewItem, NewTransaction,
    TransactionKind,
};

use crate::feeding::FeedingEvent;
use crate::level::StockLevel;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// How many times a read-decide-append cycle retries on a version
    /// conflict before surfacing `Conflict` to the caller.
    pub max_append_retries: u32,
    /// Quantity at or below which an item counts as low stock.
    pub low_stock_threshold: i64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_append_retries: 5,
            low_stock_threshold: 5,
        }
    }
}

/// Restock attributes beyond the quantity itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestockMeta {
    pub unit: Option<String>,
    pub cost_per_unit: Option<f64>,
    pub supplier: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Outcome of a feeding deduction.
///
/// `Partial` is not an error: the feeding succeeded with a clamped deduction
/// (possibly zero when the shelf was already empty) and the caller should
/// warn the user. Data loss is worse than an inexact log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deduction {
    Full {
        transaction: LedgerTransaction,
        remaining: i64,
    },
    Partial {
        transaction: LedgerTransaction,
        requested: i64,
        deducted: i64,
        remaining: i64,
    },
}

impl Deduction {
    pub fn transaction(&self) -> &LedgerTransaction {
        match self {
            Deduction::Full { transaction, .. } | Deduction::Partial { transaction, .. } => {
                transaction
            }
        }
    }

    pub fn remaining(&self) -> i64 {
        match self {
            Deduction::Full { remaining, .. } | Deduction::Partial { remaining, .. } => *remaining,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Deduction::Partial { .. })
    }
}

/// Inventory engine: the only writer of item quantities.
///
/// Mutations against one item serialize through the ledger's per-item
/// discipline; decisions based on a read (clamping, adjustment rejection)
/// append with `ExpectedVersion::Exact` and retry on conflict so two
/// concurrent writers can never both consume the same stock.
#[derive(Debug)]
pub struct InventoryEngine<S: LedgerStore> {
    store: Arc<S>,
    config: InventoryConfig,
}

impl<S: LedgerStore> InventoryEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, InventoryConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: InventoryConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Record a purchase/restock, creating the item on first restock of the
    /// key. Always succeeds for a positive quantity.
    pub fn restock(
        &self,
        key: ItemKey,
        quantity: i64,
        meta: RestockMeta,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<(InventoryItem, LedgerTransaction)> {
        if quantity <= 0 {
            return Err(DomainError::validation(format!(
                "restock quantity must be positive, got {quantity}"
            )));
        }

        let item = match self.store.find_item(&key)? {
            Some(item) => item,
            None => {
                let new = NewItem {
                    key: key.clone(),
                    unit: meta.unit.clone().unwrap_or_else(|| "unit".to_string()),
                    cost_per_unit: meta.cost_per_unit,
                    supplier: meta.supplier.clone(),
                    purchase_date: occurred_at,
                    expiry_date: meta.expiry_date,
                };
                match self.store.create_item(new) {
                    Ok(item) => item,
                    // Lost a first-restock race; the winner's item takes
                    // this purchase.
                    Err(LedgerError::Conflict(msg)) => self
                        .store
                        .find_item(&key)?
                        .ok_or(DomainError::Conflict(msg))?,
                    Err(other) => return Err(other.into()),
                }
            }
        };

        let mut tx = NewTransaction::new(item.id, TransactionKind::Purchase, quantity, occurred_at);
        if let Some(note) = meta.note {
            tx = tx.with_note(note);
        }

        // A purchase is valid regardless of current quantity; no version
        // expectation needed.
        let committed = self.store.append(tx, ExpectedVersion::Any)?;
        let item = self.store.get_item(item.id)?;

        info!(
            item_id = %item.id,
            quantity,
            total = item.quantity,
            "stock purchased"
        );
        Ok((item, committed))
    }

    /// Deduct stock for a logged feeding.
    ///
    /// Clamps at zero rather than failing: if the requested amount exceeds
    /// available stock the recorded delta is the available amount (possibly
    /// zero) and the result is `Deduction::Partial`. A feeding can always be
    /// logged, even against an empty shelf.
    pub fn deduct_for_feeding(
        &self,
        item_id: ItemId,
        requested: i64,
        reference: FeedingRef,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Deduction> {
        if requested <= 0 {
            return Err(DomainError::validation(format!(
                "deduction must be positive, got {requested}"
            )));
        }

        let mut attempt = 0;
        loop {
            let item = self.store.get_item(item_id)?;
            let available = item.quantity;
            let deducted = requested.min(available);

            let tx = NewTransaction::new(
                item_id,
                TransactionKind::FeedingDeduction,
                -deducted,
                occurred_at,
            )
            .with_reference(reference);

            match self.store.append(tx, ExpectedVersion::Exact(item.version)) {
                Ok(transaction) => {
                    let remaining = available - deducted;
                    if deducted < requested {
                        warn!(
                            %item_id,
                            requested,
                            deducted,
                            remaining,
                            "feeding deduction clamped to available stock"
                        );
                        return Ok(Deduction::Partial {
                            transaction,
                            requested,
                            deducted,
                            remaining,
                        });
                    }
                    info!(%item_id, deducted, remaining, "stock deducted for feeding");
                    return Ok(Deduction::Full {
                        transaction,
                        remaining,
                    });
                }
                Err(LedgerError::Conflict(msg)) => {
                    attempt += 1;
                    if attempt > self.config.max_append_retries {
                        warn!(%item_id, attempts = attempt, "deduction retries exhausted");
                        return Err(DomainError::conflict(msg));
                    }
                    // Another writer got in first; re-read and re-clamp.
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Deliberate manual correction. Never clamps: a result below zero is
    /// rejected with `InvalidAdjustment` and the ledger is left untouched.
    pub fn adjust(
        &self,
        item_id: ItemId,
        delta: i64,
        note: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<LedgerTransaction> {
        if delta == 0 {
            return Err(DomainError::validation("adjustment delta cannot be zero"));
        }
        self.append_checked(
            item_id,
            TransactionKind::ManualAdjustment,
            delta,
            note.into(),
            occurred_at,
        )
    }

    /// Write off spoiled or expired stock. Same rejection rule as `adjust`.
    pub fn record_waste(
        &self,
        item_id: ItemId,
        quantity: i64,
        note: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<LedgerTransaction> {
        if quantity <= 0 {
            return Err(DomainError::validation(format!(
                "waste quantity must be positive, got {quantity}"
            )));
        }
        self.append_checked(
            item_id,
            TransactionKind::Waste,
            -quantity,
            note.into(),
            occurred_at,
        )
    }

    fn append_checked(
        &self,
        item_id: ItemId,
        kind: TransactionKind,
        delta: i64,
        note: String,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<LedgerTransaction> {
        let mut attempt = 0;
        loop {
            let item = self.store.get_item(item_id)?;
            if item.quantity + delta < 0 {
                return Err(DomainError::InvalidAdjustment {
                    available: item.quantity,
                    requested: delta,
                });
            }

            let tx = NewTransaction::new(item_id, kind, delta, occurred_at)
                .with_note(note.clone());

            match self.store.append(tx, ExpectedVersion::Exact(item.version)) {
                Ok(committed) => {
                    info!(%item_id, ?kind, delta, "stock adjusted");
                    return Ok(committed);
                }
                Err(LedgerError::Conflict(msg)) => {
                    attempt += 1;
                    if attempt > self.config.max_append_retries {
                        return Err(DomainError::conflict(msg));
                    }
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Current quantity, consistent with the ledger at the time of the call.
    pub fn get_stock(&self, item_id: ItemId) -> DomainResult<i64> {
        Ok(self.store.get_item(item_id)?.quantity)
    }

    /// Stock level derived from the current quantity.
    pub fn stock_level(&self, item_id: ItemId) -> DomainResult<StockLevel> {
        let quantity = self.get_stock(item_id)?;
        Ok(StockLevel::for_quantity(
            quantity,
            self.config.low_stock_threshold,
        ))
    }

    /// Intake for externally-logged feedings. No deduction when the reptile
    /// refused the food or no inventory item is linked.
    pub fn record_feeding(&self, event: &FeedingEvent) -> DomainResult<Option<Deduction>> {
        if !event.deducts_stock() {
            return Ok(None);
        }
        let item_id = event
            .inventory_item_id
            .ok_or_else(|| DomainError::validation("feeding event lost its item id"))?;
        let deduction = self.deduct_for_feeding(
            item_id,
            event.quantity_requested,
            event.feeding_id,
            event.occurred_at,
        )?;
        Ok(Some(deduction))
    }
}
