use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scalekeeper_core::{DeviceId, UserId};

/// Whether a target is still worth delivering to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetValidity {
    Valid,
    /// The delivery channel rejected the registration itself (e.g. a revoked
    /// push subscription). Invalidated, never deleted, never retried.
    Invalid {
        reason: String,
        at: DateTime<Utc>,
    },
}

/// One registered delivery address for one user's device.
///
/// `address` is opaque to the core; only the delivery channel interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTarget {
    pub device_id: DeviceId,
    pub user_id: UserId,
    pub address: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub validity: TargetValidity,
}

impl NotificationTarget {
    pub fn new(device_id: DeviceId, user_id: UserId, address: impl Into<String>) -> Self {
        Self {
            device_id,
            user_id,
            address: address.into(),
            last_used_at: None,
            validity: TargetValidity::Valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validity == TargetValidity::Valid
    }
}
