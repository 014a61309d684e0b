//! Shared fixtures for issue lifecycle unit tests.

use crate::issue::{
    domain::{Actor, IssueStatus},
    services::CreateIssueRequest,
};
use crate::user::domain::UserId;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Clock that only moves when a test advances it.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl SteppingClock {
    /// Starts the clock at `start`.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().expect("clock lock should not be poisoned");
        *now += delta;
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
                .single()
                .expect("valid start timestamp"),
        )
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock should not be poisoned")
    }
}

/// Builds an actor with a fresh identifier.
pub fn actor(name: &str) -> Actor {
    Actor::new(UserId::new(), name).expect("actor name should be valid")
}

/// Builds a minimal report request.
pub fn report(title: &str, location: &str) -> CreateIssueRequest {
    CreateIssueRequest::new(
        title,
        format!("{title} needs attention"),
        location,
        actor("Rita Reporter"),
    )
}

/// Statuses reachable from `pending`, in a fixed order.
pub const NON_INITIAL_STATUSES: [IssueStatus; 4] = [
    IssueStatus::InProgress,
    IssueStatus::Scheduled,
    IssueStatus::Urgent,
    IssueStatus::Fixed,
];
