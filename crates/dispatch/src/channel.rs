use std::sync::Arc;

use crate::message::Message;
use crate::target::NotificationTarget;

/// Outcome of one delivery attempt, as reported by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// Worth retrying (network hiccup, service busy).
    Transient(String),
    /// The target itself is rejected (revoked subscription, gone endpoint).
    /// The dispatcher invalidates it and never retries.
    Permanent(String),
}

/// External delivery channel (web push, email gateway, ...).
///
/// Implementations may block; the dispatcher bounds each call with its
/// per-delivery timeout.
pub trait DeliveryChannel: Send + Sync {
    fn deliver(&self, target: &NotificationTarget, message: &Message) -> DeliveryStatus;
}

impl<C> DeliveryChannel for Arc<C>
where
    C: DeliveryChannel + ?Sized,
{
    fn deliver(&self, target: &NotificationTarget, message: &Message) -> DeliveryStatus {
        (**self).deliver(target, message)
    }
}
