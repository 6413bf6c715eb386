//! `scalekeeper-dispatch` — household-scoped notification fan-out.
//!
//! Resolves a due event to every device of every member of the owning
//! household and delivers best-effort in parallel: one bad, slow or revoked
//! target never blocks the rest. Permanent failures invalidate the target;
//! transient failures retry with bounded backoff; a calendar-day dedupe
//! record keeps at-least-once delivery from turning into daily nagging.

pub mod backoff;
pub mod channel;
pub mod dedupe;
pub mod dispatcher;
pub mod message;
pub mod registry;
pub mod target;

pub use backoff::BackoffPolicy;
pub use channel::{DeliveryChannel, DeliveryStatus};
pub use dedupe::{DedupeStore, InMemoryDedupeStore};
pub use dispatcher::{DeliveryReport, Dispatcher, DispatcherConfig};
pub use message::Message;
pub use registry::{
    DeviceRegistry, HouseholdDirectory, InMemoryDeviceRegistry, InMemoryHouseholdDirectory,
};
pub use target::{NotificationTarget, TargetValidity};
