use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use scalekeeper_core::{HouseholdId, ReptileId};

/// Where a feeding schedule stands relative to its next due date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleState {
    OnTrack,
    DueSoon,
    Overdue,
}

/// Per-reptile feeding cadence.
///
/// `last_fed_at` only advances when a feeding is recorded; the schedule
/// never mutates on its own. Deactivated rather than deleted so history is
/// preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedingSchedule {
    pub reptile_id: ReptileId,
    pub household_id: HouseholdId,
    pub interval_days: i64,
    pub last_fed_at: DateTime<Utc>,
    pub active: bool,
}

impl FeedingSchedule {
    pub fn new(
        reptile_id: ReptileId,
        household_id: HouseholdId,
        interval_days: i64,
        last_fed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            reptile_id,
            household_id,
            interval_days,
            last_fed_at,
            active: true,
        }
    }

    pub fn next_due_at(&self) -> DateTime<Utc> {
        self.last_fed_at + Duration::days(self.interval_days)
    }

    /// State at `now`:
    /// - on track while `now < next_due - advance_notice`
    /// - due soon from the advance-notice boundary up to (excluding) due
    /// - overdue from the due instant onward
    pub fn state(&self, now: DateTime<Utc>, advance_notice_days: i64) -> ScheduleState {
        let next_due = self.next_due_at();
        if now >= next_due {
            ScheduleState::Overdue
        } else if now >= next_due - Duration::days(advance_notice_days) {
            ScheduleState::DueSoon
        } else {
            ScheduleState::OnTrack
        }
    }

    /// Advance `last_fed_at` for a newly recorded feeding. Out-of-order
    /// events never move the schedule backwards.
    pub fn record_feeding(&mut self, at: DateTime<Utc>) {
        if at > self.last_fed_at {
            self.last_fed_at = at;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(interval_days: i64, fed_days_ago: i64) -> FeedingSchedule {
        FeedingSchedule::new(
            ReptileId::new(),
            HouseholdId::new(),
            interval_days,
            Utc::now() - Duration::days(fed_days_ago),
        )
    }

    #[test]
    fn fed_eight_days_ago_on_seven_day_interval_is_overdue() {
        let s = schedule(7, 8);
        assert_eq!(s.state(Utc::now(), 1), ScheduleState::Overdue);
    }

    #[test]
    fn state_boundaries() {
        let now = Utc::now();
        let s = schedule(7, 0);

        // Day 5 of 7 with one day notice: still on track.
        assert_eq!(s.state(now + Duration::days(5), 1), ScheduleState::OnTrack);
        // Inside the notice window.
        assert_eq!(
            s.state(now + Duration::days(6) + Duration::hours(1), 1),
            ScheduleState::DueSoon
        );
        // Exactly at the due instant: overdue.
        assert_eq!(s.state(s.next_due_at(), 1), ScheduleState::Overdue);
    }

    #[test]
    fn recording_a_feeding_never_moves_backwards() {
        let mut s = schedule(7, 2);
        let before = s.last_fed_at;

        s.record_feeding(before - Duration::days(3));
        assert_eq!(s.last_fed_at, before);

        let newer = before + Duration::days(2);
        s.record_feeding(newer);
        assert_eq!(s.last_fed_at, newer);
    }
}
