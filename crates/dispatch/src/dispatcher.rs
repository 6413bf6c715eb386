use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use scalekeeper_core::HouseholdId;
use scalekeeper_schedule::{DueEvent, DueKind};

use crate::backoff::BackoffPolicy;
use crate::channel::{DeliveryChannel, DeliveryStatus};
use crate::dedupe::DedupeStore;
use crate::message::Message;
use crate::registry::{DeviceRegistry, HouseholdDirectory};
use crate::target::NotificationTarget;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub backoff: BackoffPolicy,
    /// Upper bound on a single channel call. A stuck target counts as a
    /// transient failure and never holds up the other targets.
    pub per_delivery_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            per_delivery_timeout: Duration::from_secs(5),
        }
    }
}

/// Per-event summary of what the fan-out did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub kind: DueKind,
    pub household_id: HouseholdId,
    pub subject_id: Uuid,
    pub delivered: usize,
    pub failed: usize,
    pub invalidated: usize,
    pub skipped_invalid: usize,
    /// True when the event was already sent today and nothing was attempted.
    pub deduped: bool,
}

impl DeliveryReport {
    fn deduped_for(event: &DueEvent) -> Self {
        Self {
            kind: event.kind,
            household_id: event.household_id,
            subject_id: event.subject_id,
            delivered: 0,
            failed: 0,
            invalidated: 0,
            skipped_invalid: 0,
            deduped: true,
        }
    }
}

enum Outcome {
    Delivered,
    Failed,
    Invalidated,
}

/// Fans a due event out to every device of every household member.
///
/// Deliveries run on one thread per target so a slow or flaky endpoint
/// cannot delay the others. At-most-once per calendar day is enforced
/// through the dedupe store before any target is contacted.
pub struct Dispatcher {
    directory: Arc<dyn HouseholdDirectory>,
    registry: Arc<dyn DeviceRegistry>,
    dedupe: Arc<dyn DedupeStore>,
    channel: Arc<dyn DeliveryChannel>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn HouseholdDirectory>,
        registry: Arc<dyn DeviceRegistry>,
        dedupe: Arc<dyn DedupeStore>,
        channel: Arc<dyn DeliveryChannel>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            directory,
            registry,
            dedupe,
            channel,
            config,
        }
    }

    pub fn dispatch(&self, event: &DueEvent) -> DeliveryReport {
        if !self.dedupe.record_if_first(event.dedupe_key()) {
            debug!(
                kind = ?event.kind,
                subject_id = %event.subject_id,
                "due event already dispatched today"
            );
            return DeliveryReport::deduped_for(event);
        }

        let message = Message::for_event(event);
        let mut skipped_invalid = 0usize;
        let mut valid_targets = Vec::new();
        for user_id in self.directory.members(event.household_id) {
            for target in self.registry.targets_for(user_id) {
                if target.is_valid() {
                    valid_targets.push(target);
                } else {
                    skipped_invalid += 1;
                }
            }
        }

        let (tx, rx) = mpsc::channel();
        let expected = valid_targets.len();
        for target in valid_targets {
            let tx = tx.clone();
            let channel = Arc::clone(&self.channel);
            let registry = Arc::clone(&self.registry);
            let message = message.clone();
            let config = self.config.clone();
            thread::spawn(move || {
                let outcome = deliver_to_target(channel, &*registry, &target, &message, &config);
                // receiver dropped means dispatch already returned; nothing to do
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        let mut report = DeliveryReport {
            kind: event.kind,
            household_id: event.household_id,
            subject_id: event.subject_id,
            delivered: 0,
            failed: 0,
            invalidated: 0,
            skipped_invalid,
            deduped: false,
        };
        for outcome in rx.iter().take(expected) {
            match outcome {
                Outcome::Delivered => report.delivered += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Invalidated => report.invalidated += 1,
            }
        }

        info!(
            kind = ?event.kind,
            subject_id = %event.subject_id,
            household_id = %event.household_id,
            delivered = report.delivered,
            failed = report.failed,
            invalidated = report.invalidated,
            skipped_invalid = report.skipped_invalid,
            "due event dispatched"
        );
        report
    }
}

fn deliver_to_target(
    channel: Arc<dyn DeliveryChannel>,
    registry: &dyn DeviceRegistry,
    target: &NotificationTarget,
    message: &Message,
    config: &DispatcherConfig,
) -> Outcome {
    let mut attempt = 1;
    loop {
        if !config.backoff.allows_attempt(attempt) {
            return Outcome::Failed;
        }
        let delay = config.backoff.delay_before_attempt(attempt);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        match deliver_with_timeout(
            Arc::clone(&channel),
            target,
            message,
            config.per_delivery_timeout,
        ) {
            DeliveryStatus::Delivered => {
                registry.touch(target.device_id, Utc::now());
                return Outcome::Delivered;
            }
            DeliveryStatus::Permanent(reason) => {
                warn!(
                    device_id = %target.device_id,
                    reason,
                    "permanent delivery failure"
                );
                registry.invalidate(target.device_id, &reason, Utc::now());
                return Outcome::Invalidated;
            }
            DeliveryStatus::Transient(reason) => {
                debug!(
                    device_id = %target.device_id,
                    attempt,
                    reason,
                    "transient delivery failure"
                );
                attempt += 1;
            }
        }
    }
}

/// Bounds one channel call. If it blows the deadline the call keeps running
/// on its own thread until it finishes, but the dispatcher moves on.
fn deliver_with_timeout(
    channel: Arc<dyn DeliveryChannel>,
    target: &NotificationTarget,
    message: &Message,
    timeout: Duration,
) -> DeliveryStatus {
    let (tx, rx) = mpsc::channel();
    let target = target.clone();
    let message = message.clone();
    thread::spawn(move || {
        let status = channel.deliver(&target, &message);
        let _ = tx.send(status);
    });
    match rx.recv_timeout(timeout) {
        Ok(status) => status,
        Err(_) => DeliveryStatus::Transient("delivery timed out".to_string()),
    }
}
