//! Given steps for issue status lifecycle BDD scenarios.

use super::world::{IssueLifecycleWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use twinfix::{
    issue::{domain::Actor, services::CreateIssueRequest},
    user::domain::UserId,
};

#[given(r#"a pending issue reported at "{location}""#)]
fn pending_issue(world: &mut IssueLifecycleWorld, location: String) -> Result<(), eyre::Report> {
    let reporter = Actor::new(UserId::new(), "Rita Reporter")?;
    let request = CreateIssueRequest::new(
        "Equipment fault",
        "Reported during the morning walk-through",
        location,
        reporter,
    );
    let created = run_async(world.service.create(request)).wrap_err("report issue")?;
    world.issue = Some(created);
    Ok(())
}

#[given(r#"a technician named "{name}""#)]
fn technician_named(world: &mut IssueLifecycleWorld, name: String) -> Result<(), eyre::Report> {
    world.technician = Some(Actor::new(UserId::new(), name)?);
    Ok(())
}
