//! Then steps for issue status lifecycle BDD scenarios.

use super::world::{IssueLifecycleWorld, run_async};
use rstest_bdd_macros::then;
use twinfix::issue::{domain::IssueStatus, services::IssueLifecycleError};

#[then(r#"the issue status is "{status}""#)]
fn issue_status_is(world: &IssueLifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let expected = IssueStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let stored = run_async(world.service.get(world.issue()?.id()))?;

    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            stored.status()
        ));
    }
    Ok(())
}

#[then(r#"the issue records "{name}" as the fixer"#)]
fn issue_records_fixer(world: &IssueLifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let issue = world.issue()?;
    let fixer = issue
        .fixed_by()
        .ok_or_else(|| eyre::eyre!("issue has no recorded fixer"))?;

    eyre::ensure!(fixer.name() == name, "expected fixer {name}, found {}", fixer.name());
    eyre::ensure!(issue.fixed_at().is_some(), "fix timestamp missing");
    eyre::ensure!(
        issue.time_to_fix_minutes().is_some_and(|minutes| minutes >= 0),
        "time to fix missing"
    );
    Ok(())
}

#[then(r#"the status history reads "{expected}""#)]
fn status_history_reads(world: &IssueLifecycleWorld, expected: String) -> Result<(), eyre::Report> {
    let history = run_async(world.service.history(world.issue()?.id()))?;
    let rendered = history
        .iter()
        .map(|change| format!("{}>{}", change.old_status(), change.new_status()))
        .collect::<Vec<_>>()
        .join(", ");

    eyre::ensure!(
        rendered == expected,
        "expected history {expected}, found {rendered}"
    );
    Ok(())
}

#[then("the status history is empty")]
fn status_history_is_empty(world: &IssueLifecycleWorld) -> Result<(), eyre::Report> {
    let history = run_async(world.service.history(world.issue()?.id()))?;
    eyre::ensure!(history.is_empty(), "expected no history, found {}", history.len());
    Ok(())
}

#[then("the request is rejected as invalid")]
fn request_rejected(world: &IssueLifecycleWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing service result"))?;

    if !matches!(result, Err(IssueLifecycleError::Domain(_))) {
        return Err(eyre::eyre!("expected a validation error, got {result:?}"));
    }
    Ok(())
}
