//! Event distribution between core components.
//!
//! Due events computed by the schedule engine travel to the notification
//! dispatcher over this bus. The contract is at-least-once: consumers must be
//! idempotent (the dispatcher's calendar-day dedupe absorbs replays).

pub mod bus;
pub mod in_memory;

pub use bus::{EventBus, Subscription};
pub use in_memory::{InMemoryBusError, InMemoryEventBus};
