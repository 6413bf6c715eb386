//! Inventory quantity policy on top of the ledger.
//!
//! The engine owns every stock mutation: restocks, feeding deductions
//! (clamped, never blocking a feeding log), deliberate manual adjustments
//! (rejected rather than clamped) and waste write-offs. Reads are always
//! consistent with the ledger at the time of the call.

pub mod engine;
pub mod feeding;
pub mod level;

pub use engine::{Deduction, InventoryConfig, InventoryEngine, RestockMeta};
pub use feeding::FeedingEvent;
pub use level::StockLevel;
