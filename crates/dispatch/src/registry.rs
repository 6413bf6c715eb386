use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::info;

use scalekeeper_core::{DeviceId, HouseholdId, UserId};

use crate::target::{NotificationTarget, TargetValidity};

/// External household-membership collaborator.
pub trait HouseholdDirectory: Send + Sync {
    fn members(&self, household_id: HouseholdId) -> Vec<UserId>;
}

impl<T> HouseholdDirectory for Arc<T>
where
    T: HouseholdDirectory + ?Sized,
{
    fn members(&self, household_id: HouseholdId) -> Vec<UserId> {
        (**self).members(household_id)
    }
}

/// External device-registration collaborator.
///
/// Targets are registered elsewhere; the dispatcher owns only their validity
/// state. `targets_for` returns every registration, including invalidated
/// ones, so reports can count what was skipped.
pub trait DeviceRegistry: Send + Sync {
    fn targets_for(&self, user_id: UserId) -> Vec<NotificationTarget>;

    /// Mark a target permanently undeliverable. Kept, not deleted.
    fn invalidate(&self, device_id: DeviceId, reason: &str, at: DateTime<Utc>);

    /// Record a successful delivery.
    fn touch(&self, device_id: DeviceId, at: DateTime<Utc>);
}

impl<T> DeviceRegistry for Arc<T>
where
    T: DeviceRegistry + ?Sized,
{
    fn targets_for(&self, user_id: UserId) -> Vec<NotificationTarget> {
        (**self).targets_for(user_id)
    }

    fn invalidate(&self, device_id: DeviceId, reason: &str, at: DateTime<Utc>) {
        (**self).invalidate(device_id, reason, at)
    }

    fn touch(&self, device_id: DeviceId, at: DateTime<Utc>) {
        (**self).touch(device_id, at)
    }
}

/// In-memory membership directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryHouseholdDirectory {
    members: RwLock<HashMap<HouseholdId, Vec<UserId>>>,
}

impl InMemoryHouseholdDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, household_id: HouseholdId, user_id: UserId) {
        let mut map = self.members.write().unwrap_or_else(|e| e.into_inner());
        let list = map.entry(household_id).or_default();
        if !list.contains(&user_id) {
            list.push(user_id);
        }
    }
}

impl HouseholdDirectory for InMemoryHouseholdDirectory {
    fn members(&self, household_id: HouseholdId) -> Vec<UserId> {
        let map = self.members.read().unwrap_or_else(|e| e.into_inner());
        map.get(&household_id).cloned().unwrap_or_default()
    }
}

/// In-memory device registry for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDeviceRegistry {
    targets: RwLock<HashMap<DeviceId, NotificationTarget>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, target: NotificationTarget) {
        let mut map = self.targets.write().unwrap_or_else(|e| e.into_inner());
        map.insert(target.device_id, target);
    }

    pub fn get(&self, device_id: DeviceId) -> Option<NotificationTarget> {
        let map = self.targets.read().unwrap_or_else(|e| e.into_inner());
        map.get(&device_id).cloned()
    }
}

impl DeviceRegistry for InMemoryDeviceRegistry {
    fn targets_for(&self, user_id: UserId) -> Vec<NotificationTarget> {
        let map = self.targets.read().unwrap_or_else(|e| e.into_inner());
        let mut targets: Vec<_> = map
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        targets.sort_by_key(|t| *t.device_id.as_uuid());
        targets
    }

    fn invalidate(&self, device_id: DeviceId, reason: &str, at: DateTime<Utc>) {
        let mut map = self.targets.write().unwrap_or_else(|e| e.into_inner());
        if let Some(target) = map.get_mut(&device_id) {
            target.validity = TargetValidity::Invalid {
                reason: reason.to_string(),
                at,
            };
            info!(device_id = %device_id, reason, "notification target invalidated");
        }
    }

    fn touch(&self, device_id: DeviceId, at: DateTime<Utc>) {
        let mut map = self.targets.write().unwrap_or_else(|e| e.into_inner());
        if let Some(target) = map.get_mut(&device_id) {
            target.last_used_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_sticks_and_preserves_the_record() {
        let registry = InMemoryDeviceRegistry::new();
        let user_id = UserId::new();
        let device_id = DeviceId::new();
        registry.register(NotificationTarget::new(device_id, user_id, "sub:abc"));

        registry.invalidate(device_id, "410 gone", Utc::now());

        let target = registry.get(device_id).unwrap();
        assert!(!target.is_valid());
        assert_eq!(registry.targets_for(user_id).len(), 1);
    }

    #[test]
    fn directory_deduplicates_members() {
        let directory = InMemoryHouseholdDirectory::new();
        let household_id = HouseholdId::new();
        let user_id = UserId::new();
        directory.add_member(household_id, user_id);
        directory.add_member(household_id, user_id);
        assert_eq!(directory.members(household_id).len(), 1);
    }
}
