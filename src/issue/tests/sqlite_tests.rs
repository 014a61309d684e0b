//! `SQLite` adapter tests against an in-memory database.

use super::support::{SteppingClock, actor, report};
use crate::database::{connect_in_memory, run_migrations};
use crate::issue::{
    adapters::{memory::InMemoryIssueRepository, sqlite::SqliteIssueRepository},
    domain::{
        Comment, FloorplanPin, Issue, IssueId, IssueImage, IssuePatch, IssueStatus, IssueType,
        PersistedStatusChangeData, StatusChange,
    },
    ports::{IssueFilter, IssueRepository, IssueRepositoryError},
    services::{IssueLifecycleService, MarkFixedRequest},
};
use chrono::TimeDelta;
use eyre::{ensure, eyre};
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn repository() -> SqliteIssueRepository {
    let pool = connect_in_memory().expect("in-memory pool should open");
    run_migrations(&pool).expect("migrations should apply");
    SqliteIssueRepository::new(pool)
}

fn transitioned(
    issue: &Issue,
    status: IssueStatus,
    clock: &SteppingClock,
) -> eyre::Result<(Issue, StatusChange)> {
    let mut next = issue.clone();
    let change = next
        .transition_to(status, Some(actor("Tom Technician")), None, clock)
        .ok_or_else(|| eyre!("status {status} should differ from {}", issue.status()))?;
    Ok((next, change))
}

async fn stored_issue(
    repository: &SqliteIssueRepository,
    clock: &SteppingClock,
) -> eyre::Result<Issue> {
    let service = IssueLifecycleService::new(Arc::new(repository.clone()), Arc::new(clock.clone()));
    Ok(service
        .create(
            report("Walk-in cooler alarm", "Back of house")
                .with_issue_type(IssueType::Refrigerator)
                .with_coordinates(52.52, 13.405)
                .with_pin(FloorplanPin {
                    x: 12.5,
                    y: 7.25,
                    is_interior: true,
                })
                .with_estimated_cost(310.0)
                .with_images(["cooler.jpg".to_owned()]),
        )
        .await?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_issue_round_trips_every_field(
    repository: SqliteIssueRepository,
) -> eyre::Result<()> {
    let clock = SteppingClock::default();
    let issue = stored_issue(&repository, &clock).await?;
    clock.advance(TimeDelta::seconds(95));
    let (fixed, change) = transitioned(&issue, IssueStatus::Fixed, &clock)?;
    repository.commit_transition(&fixed, &change).await?;

    let loaded = repository
        .find_by_id(issue.id())
        .await?
        .ok_or_else(|| eyre!("issue should be stored"))?;

    ensure!(loaded == fixed, "loaded issue differs: {loaded:?} vs {fixed:?}");
    ensure!(loaded.time_to_fix_minutes() == Some(1), "minutes persisted");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_issue_id_is_rejected(repository: SqliteIssueRepository) -> eyre::Result<()> {
    let clock = SteppingClock::default();
    let issue = stored_issue(&repository, &clock).await?;

    let result = repository.store(&issue, &[]).await;

    ensure!(
        matches!(result, Err(IssueRepositoryError::DuplicateIssue(id)) if id == issue.id()),
        "expected duplicate issue error, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_transition_is_rejected_without_history(
    repository: SqliteIssueRepository,
) -> eyre::Result<()> {
    let clock = SteppingClock::default();
    let issue = stored_issue(&repository, &clock).await?;
    let (first, first_change) = transitioned(&issue, IssueStatus::InProgress, &clock)?;
    let (second, second_change) = transitioned(&issue, IssueStatus::Urgent, &clock)?;

    repository.commit_transition(&first, &first_change).await?;
    let result = repository.commit_transition(&second, &second_change).await;

    ensure!(
        matches!(
            result,
            Err(IssueRepositoryError::StaleStatus {
                expected: IssueStatus::Pending,
                ..
            })
        ),
        "expected stale status, got {result:?}"
    );
    let history = repository.status_history(issue.id()).await?;
    ensure!(history == vec![first_change], "only the winning transition is recorded");
    let stored = repository
        .find_by_id(issue.id())
        .await?
        .ok_or_else(|| eyre!("issue should exist"))?;
    ensure!(stored.status() == IssueStatus::InProgress, "winner's status kept");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_history_insert_rolls_back_status(
    repository: SqliteIssueRepository,
) -> eyre::Result<()> {
    let clock = SteppingClock::default();
    let issue = stored_issue(&repository, &clock).await?;
    let (started, started_change) = transitioned(&issue, IssueStatus::InProgress, &clock)?;
    repository.commit_transition(&started, &started_change).await?;

    let (urgent, urgent_change) = transitioned(&started, IssueStatus::Urgent, &clock)?;
    let colliding = StatusChange::from_persisted(PersistedStatusChangeData {
        id: started_change.id(),
        issue_id: urgent_change.issue_id(),
        old_status: urgent_change.old_status(),
        new_status: urgent_change.new_status(),
        changed_by: urgent_change.changed_by().cloned(),
        notes: None,
        created_at: urgent_change.created_at(),
    });
    let result = repository.commit_transition(&urgent, &colliding).await;

    ensure!(
        matches!(result, Err(IssueRepositoryError::Persistence(_))),
        "history insert should fail, got {result:?}"
    );
    let stored = repository
        .find_by_id(issue.id())
        .await?
        .ok_or_else(|| eyre!("issue should exist"))?;
    ensure!(
        stored.status() == IssueStatus::InProgress,
        "status update must roll back with the history insert"
    );
    ensure!(
        repository.status_history(issue.id()).await?.len() == 1,
        "no extra history entry"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn field_update_never_reverts_a_transition(
    repository: SqliteIssueRepository,
) -> eyre::Result<()> {
    let clock = SteppingClock::default();
    let issue = stored_issue(&repository, &clock).await?;
    let (fixed, change) = transitioned(&issue, IssueStatus::Fixed, &clock)?;
    repository.commit_transition(&fixed, &change).await?;

    let mut outdated = issue.clone();
    outdated.apply_patch(
        IssuePatch {
            title: Some("Cooler alarm silenced".to_owned()),
            pin: Some(None),
            ..IssuePatch::default()
        },
        &clock,
    )?;
    repository.update(&outdated).await?;

    let stored = repository
        .find_by_id(issue.id())
        .await?
        .ok_or_else(|| eyre!("issue should exist"))?;
    ensure!(stored.title() == "Cooler alarm silenced", "title updated");
    ensure!(stored.pin().is_none(), "pin cleared");
    ensure!(stored.status() == IssueStatus::Fixed, "status untouched by field update");
    ensure!(stored.fix() == fixed.fix(), "fix metrics untouched by field update");
    Ok(())
}

async fn transition_keeps_concurrent_field_edit<R>(repository: Arc<R>) -> eyre::Result<()>
where
    R: IssueRepository + 'static,
{
    let clock = SteppingClock::default();
    let service = IssueLifecycleService::new(Arc::clone(&repository), Arc::new(clock.clone()));
    let created = service
        .create(report("Walk-in cooler alarm", "Back of house"))
        .await?;

    let snapshot = service.get(created.id()).await?;
    let (started, change) = transitioned(&snapshot, IssueStatus::InProgress, &clock)?;
    service
        .update(
            created.id(),
            IssuePatch {
                title: Some("Cooler alarm silenced".to_owned()),
                ..IssuePatch::default()
            },
        )
        .await?;
    repository.commit_transition(&started, &change).await?;

    let stored = repository
        .find_by_id(created.id())
        .await?
        .ok_or_else(|| eyre!("issue should exist"))?;
    ensure!(
        stored.title() == "Cooler alarm silenced",
        "transition reverted the title to {:?}",
        stored.title()
    );
    ensure!(stored.status() == IssueStatus::InProgress, "status transitioned");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sqlite_transition_never_reverts_a_field_update(
    repository: SqliteIssueRepository,
) -> eyre::Result<()> {
    transition_keeps_concurrent_field_edit(Arc::new(repository)).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn memory_transition_never_reverts_a_field_update() -> eyre::Result<()> {
    transition_keeps_concurrent_field_edit(Arc::new(InMemoryIssueRepository::new())).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_of_missing_issue_is_not_found(repository: SqliteIssueRepository) {
    let clock = SteppingClock::default();
    let phantom = stored_issue(&repository, &clock)
        .await
        .expect("issue creation should succeed");
    repository
        .delete(phantom.id())
        .await
        .expect("delete should succeed");

    let result = repository.update(&phantom).await;

    assert!(matches!(result, Err(IssueRepositoryError::NotFound(id)) if id == phantom.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_cascades_to_dependants(repository: SqliteIssueRepository) -> eyre::Result<()> {
    let clock = SteppingClock::default();
    let issue = stored_issue(&repository, &clock).await?;
    let image_ids: Vec<_> = repository
        .images(issue.id())
        .await?
        .iter()
        .map(IssueImage::id)
        .collect();
    let comment = Comment::new(issue.id(), actor("Rita Reporter"), "Still beeping", &clock)?;
    repository.store_comment(&comment).await?;
    let (started, change) = transitioned(&issue, IssueStatus::InProgress, &clock)?;
    repository.commit_transition(&started, &change).await?;

    ensure!(repository.delete(issue.id()).await?, "first delete removes the issue");

    ensure!(repository.find_by_id(issue.id()).await?.is_none(), "issue gone");
    ensure!(repository.status_history(issue.id()).await?.is_empty(), "history gone");
    ensure!(repository.comments(issue.id()).await?.is_empty(), "comments gone");
    ensure!(repository.images(issue.id()).await?.is_empty(), "images gone");
    for image_id in image_ids {
        ensure!(repository.find_image(image_id).await?.is_none(), "image row gone");
    }
    ensure!(!repository.delete(issue.id()).await?, "second delete is a no-op");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attachments_for_missing_issue_are_not_found(repository: SqliteIssueRepository) {
    let clock = SteppingClock::default();
    let missing = IssueId::new();
    let comment = Comment::new(missing, actor("Rita Reporter"), "Anyone?", &clock)
        .expect("comment should be valid");
    let image = IssueImage::new(missing, "ghost.png", &clock).expect("image should be valid");

    let comment_result = repository.store_comment(&comment).await;
    let image_result = repository.store_image(&image).await;

    assert!(matches!(comment_result, Err(IssueRepositoryError::NotFound(id)) if id == missing));
    assert!(matches!(image_result, Err(IssueRepositoryError::NotFound(id)) if id == missing));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_orders_newest_first_with_insertion_tie_break(
    repository: SqliteIssueRepository,
) -> eyre::Result<()> {
    let clock = SteppingClock::default();
    let service = IssueLifecycleService::new(Arc::new(repository.clone()), Arc::new(clock.clone()));
    let first = service.create(report("First", "Lobby")).await?;
    let second = service.create(report("Second", "Lobby")).await?;
    clock.advance(TimeDelta::minutes(1));
    let third = service
        .create(report("Third", "Lobby").with_issue_type(IssueType::Lighting))
        .await?;

    let all = repository.list(IssueFilter::default()).await?;
    let lighting = repository
        .list(IssueFilter {
            issue_type: Some(IssueType::Lighting),
            ..IssueFilter::default()
        })
        .await?;

    ensure!(
        all.iter()
            .map(Issue::id)
            .eq([third.id(), second.id(), first.id()]),
        "newest first, later insert first on equal timestamps"
    );
    ensure!(lighting.iter().map(Issue::id).eq([third.id()]), "type filter");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn statistics_match_the_in_memory_aggregation(
    repository: SqliteIssueRepository,
) -> eyre::Result<()> {
    let clock = SteppingClock::default();
    let sqlite = IssueLifecycleService::new(Arc::new(repository.clone()), Arc::new(clock.clone()));
    let memory_repository = Arc::new(InMemoryIssueRepository::new());
    let memory = IssueLifecycleService::new(Arc::clone(&memory_repository), Arc::new(clock.clone()));
    let fixer = actor("Tom Technician");

    let seeds = [
        ("Fryer smoking", "Kitchen", IssueType::Fryer, Some(7)),
        ("Fryer timer", "Kitchen", IssueType::Fryer, Some(20)),
        ("Grill igniter", "Entrance", IssueType::Grill, None),
        ("Loose chair", "Dining room", IssueType::Seating, Some(45)),
        ("Table wobble", "Dining room", IssueType::Seating, None),
        ("Door closer", "Entrance", IssueType::Other, None),
    ];
    for (title, location, issue_type, fix_after) in seeds {
        let request = report(title, location).with_issue_type(issue_type);
        let in_sqlite = sqlite.create(request.clone()).await?;
        let in_memory = memory.create(request).await?;
        if let Some(minutes) = fix_after {
            clock.advance(TimeDelta::minutes(minutes));
            sqlite
                .mark_fixed(MarkFixedRequest::by(in_sqlite.id(), &fixer))
                .await?;
            memory
                .mark_fixed(MarkFixedRequest::by(in_memory.id(), &fixer))
                .await?;
        }
    }

    for scope in [
        None,
        Some(IssueType::Fryer),
        Some(IssueType::Seating),
        Some(IssueType::Hvac),
    ] {
        let from_sqlite = repository.statistics(scope).await?;
        let from_memory = memory_repository.statistics(scope).await?;
        ensure!(
            from_sqlite == from_memory,
            "statistics differ for {scope:?}: {from_sqlite:?} vs {from_memory:?}"
        );
    }
    let overall = repository.statistics(None).await?;
    ensure!(overall.total_issues == 6, "six issues");
    ensure!(overall.fixed_issues == 3, "three fixed");
    ensure!(
        overall.most_reported_location.as_deref() == Some("Dining room"),
        "three-way location tie resolves lexicographically"
    );
    Ok(())
}
