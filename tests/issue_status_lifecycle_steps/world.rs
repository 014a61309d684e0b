//! Shared world state for issue status lifecycle BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use twinfix::issue::{
    adapters::memory::InMemoryIssueRepository,
    domain::{Actor, Issue},
    services::{IssueLifecycleError, IssueLifecycleService},
};

/// Service type used by the BDD world.
pub type TestIssueService = IssueLifecycleService<InMemoryIssueRepository, DefaultClock>;

/// Scenario world for issue lifecycle behaviour tests.
pub struct IssueLifecycleWorld {
    pub service: TestIssueService,
    pub issue: Option<Issue>,
    pub technician: Option<Actor>,
    pub last_result: Option<Result<Issue, IssueLifecycleError>>,
}

impl IssueLifecycleWorld {
    /// Creates a world with an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: IssueLifecycleService::new(
                Arc::new(InMemoryIssueRepository::new()),
                Arc::new(DefaultClock),
            ),
            issue: None,
            technician: None,
            last_result: None,
        }
    }

    /// Returns the issue under test.
    pub fn issue(&self) -> Result<&Issue, eyre::Report> {
        self.issue
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing reported issue in scenario world"))
    }

    /// Records a service result, keeping the latest issue state on success.
    pub fn record(&mut self, result: Result<Issue, IssueLifecycleError>) {
        if let Ok(ref updated) = result {
            self.issue = Some(updated.clone());
        }
        self.last_result = Some(result);
    }
}

impl Default for IssueLifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> IssueLifecycleWorld {
    IssueLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
