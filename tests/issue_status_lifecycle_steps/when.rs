//! When steps for issue status lifecycle BDD scenarios.

use super::world::{IssueLifecycleWorld, run_async};
use rstest_bdd_macros::when;
use twinfix::issue::services::{MarkFixedRequest, TransitionIssueRequest};

#[when(r#"the technician moves the issue to "{status}""#)]
fn technician_moves_issue(
    world: &mut IssueLifecycleWorld,
    status: String,
) -> Result<(), eyre::Report> {
    let technician = world
        .technician
        .clone()
        .ok_or_else(|| eyre::eyre!("missing technician in scenario world"))?;
    let request = TransitionIssueRequest::new(world.issue()?.id(), status).with_actor(technician);
    let result = run_async(world.service.transition(request));
    world.record(result);
    Ok(())
}

#[when(r#"someone moves the issue to "{status}""#)]
fn someone_moves_issue(world: &mut IssueLifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let request = TransitionIssueRequest::new(world.issue()?.id(), status);
    let result = run_async(world.service.transition(request));
    world.record(result);
    Ok(())
}

#[when("the technician marks the issue as fixed")]
fn technician_marks_fixed(world: &mut IssueLifecycleWorld) -> Result<(), eyre::Report> {
    let technician = world
        .technician
        .clone()
        .ok_or_else(|| eyre::eyre!("missing technician in scenario world"))?;
    let request = MarkFixedRequest::by(world.issue()?.id(), &technician);
    let result = run_async(world.service.mark_fixed(request));
    world.record(result);
    Ok(())
}

#[when("someone marks the issue as fixed anonymously")]
fn anonymous_marks_fixed(world: &mut IssueLifecycleWorld) -> Result<(), eyre::Report> {
    let request = MarkFixedRequest::new(world.issue()?.id(), None, None, None);
    let result = run_async(world.service.mark_fixed(request));
    world.record(result);
    Ok(())
}
