//! `scalekeeper-ledger` — durable, household-scoped inventory ledger.
//!
//! The ledger is the source of truth for stock: every quantity change is an
//! immutable, append-only `LedgerTransaction`, and the `quantity` field on
//! `InventoryItem` is a materialized cache that the store keeps in lockstep
//! with the replayed delta sum. Writing a transaction and updating the cache
//! happen as one atomic unit, per item, under concurrent writers.

pub mod item;
pub mod memory;
pub mod store;
pub mod transaction;

pub use item::{InventoryItem, ItemKey, NewItem};
pub use memory::InMemoryLedgerStore;
pub use store::{ItemSnapshot, LedgerError, LedgerStore, Page};
pub use transaction::{LedgerTransaction, NewTransaction, TransactionKind};
