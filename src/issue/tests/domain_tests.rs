//! Domain-focused tests for status transitions, fix metrics, patches,
//! proximity and statistics.

use super::support::{SteppingClock, actor};
use crate::issue::domain::{
    Actor, FloorplanPin, GeoPoint, Issue, IssueDomainError, IssuePatch, IssuePriority,
    IssueStatistics, IssueStatus, IssueType, NewIssue, SearchRadius,
};
use chrono::TimeDelta;
use eyre::{ensure, eyre};
use mockable::Clock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> SteppingClock {
    SteppingClock::default()
}

fn new_issue(location: &str) -> NewIssue {
    NewIssue {
        title: "Fryer not heating".to_owned(),
        description: "Oil stays cold after warm-up".to_owned(),
        location: location.to_owned(),
        reported_by: actor("Rita Reporter"),
        status: IssueStatus::Pending,
        priority: IssuePriority::High,
        issue_type: IssueType::Fryer,
        coordinates: None,
        pin: None,
        estimated_cost: 120.0,
    }
}

#[fixture]
fn pending_issue(clock: SteppingClock) -> Issue {
    Issue::report(new_issue("Kitchen"), &clock).expect("issue should be valid")
}

#[rstest]
#[case("pending", IssueStatus::Pending)]
#[case("in_progress", IssueStatus::InProgress)]
#[case("scheduled", IssueStatus::Scheduled)]
#[case(" URGENT ", IssueStatus::Urgent)]
#[case("fixed", IssueStatus::Fixed)]
#[case("completed", IssueStatus::Fixed)]
fn status_parses_canonical_values_and_alias(#[case] raw: &str, #[case] expected: IssueStatus) {
    assert_eq!(IssueStatus::try_from(raw), Ok(expected));
}

#[rstest]
#[case("done")]
#[case("")]
#[case("in progress")]
fn status_rejects_values_outside_the_enumeration(#[case] raw: &str) {
    assert_eq!(
        IssueStatus::try_from(raw),
        Err(IssueDomainError::UnknownStatus(raw.to_owned()))
    );
}

#[rstest]
fn only_fixed_is_terminal() {
    let terminal: Vec<IssueStatus> = IssueStatus::ALL
        .into_iter()
        .filter(|status| status.is_terminal())
        .collect();
    assert_eq!(terminal, vec![IssueStatus::Fixed]);
}

#[rstest]
fn report_trims_text_and_starts_without_fix(clock: SteppingClock) {
    let mut input = new_issue("  Drive-thru lane 2 ");
    input.title = "  Speaker crackles ".to_owned();

    let issue = Issue::report(input, &clock).expect("issue should be valid");

    assert_eq!(issue.title(), "Speaker crackles");
    assert_eq!(issue.location(), "Drive-thru lane 2");
    assert_eq!(issue.status(), IssueStatus::Pending);
    assert!(issue.fix().is_none());
    assert_eq!(issue.created_at(), issue.updated_at());
}

#[rstest]
fn report_as_fixed_records_reporter_as_fixer(clock: SteppingClock) -> eyre::Result<()> {
    let mut input = new_issue("Kitchen");
    input.status = IssueStatus::Fixed;
    let reporter = input.reported_by.clone();

    let issue = Issue::report(input, &clock)?;

    ensure!(issue.status() == IssueStatus::Fixed, "status kept");
    ensure!(issue.fixed_at() == Some(issue.created_at()), "fixed at creation");
    ensure!(issue.time_to_fix_minutes() == Some(0), "zero minutes to fix");
    ensure!(issue.fixed_by() == Some(&reporter), "reporter recorded as fixer");

    let stats = IssueStatistics::from_issues([&issue]);
    ensure!(stats.fixed_issues == 1, "counted as fixed");
    ensure!(stats.average_fix_time == Some(0.0), "contributes to the average");
    ensure!(stats.last_fix_date == Some(issue.created_at()), "contributes a fix date");
    Ok(())
}

#[rstest]
#[case::blank_title("title")]
#[case::blank_location("location")]
fn report_rejects_blank_required_text(clock: SteppingClock, #[case] field: &'static str) {
    let mut input = new_issue("Kitchen");
    match field {
        "title" => input.title = "   ".to_owned(),
        _ => input.location = String::new(),
    }

    assert_eq!(
        Issue::report(input, &clock),
        Err(IssueDomainError::EmptyField(field))
    );
}

#[rstest]
fn report_rejects_negative_estimated_cost(clock: SteppingClock) {
    let mut input = new_issue("Kitchen");
    input.estimated_cost = -1.0;

    let result = Issue::report(input, &clock);

    assert!(matches!(
        result,
        Err(IssueDomainError::InvalidCost {
            field: "estimated cost",
            ..
        })
    ));
}

#[rstest]
fn transition_to_same_status_is_a_no_op(clock: SteppingClock, mut pending_issue: Issue) {
    let before = pending_issue.clone();
    clock.advance(TimeDelta::minutes(5));

    let change = pending_issue.transition_to(IssueStatus::Pending, None, None, &clock);

    assert!(change.is_none());
    assert_eq!(pending_issue, before);
}

#[rstest]
fn transition_records_history_entry(
    clock: SteppingClock,
    mut pending_issue: Issue,
) -> eyre::Result<()> {
    let technician = actor("Tom Technician");
    clock.advance(TimeDelta::minutes(3));

    let change = pending_issue
        .transition_to(
            IssueStatus::InProgress,
            Some(technician.clone()),
            Some("  on my way  ".to_owned()),
            &clock,
        )
        .ok_or_else(|| eyre!("transition should produce a history record"))?;

    ensure!(change.issue_id() == pending_issue.id(), "issue id mismatch");
    ensure!(change.old_status() == IssueStatus::Pending, "old status mismatch");
    ensure!(change.new_status() == IssueStatus::InProgress, "new status mismatch");
    ensure!(change.changed_by() == Some(&technician), "actor mismatch");
    ensure!(change.notes() == Some("on my way"), "notes should be trimmed");
    ensure!(change.created_at() == clock.utc(), "timestamp mismatch");
    ensure!(
        pending_issue.updated_at() == change.created_at(),
        "updated_at should follow the transition"
    );
    ensure!(pending_issue.fix().is_none(), "non-terminal status has no fix");
    Ok(())
}

#[rstest]
fn blank_notes_are_dropped(clock: SteppingClock, mut pending_issue: Issue) {
    let change = pending_issue
        .transition_to(IssueStatus::Urgent, None, Some("   ".to_owned()), &clock)
        .expect("status changes");

    assert_eq!(change.notes(), None);
    assert_eq!(change.changed_by(), None);
}

#[rstest]
#[case::ninety_seconds(TimeDelta::seconds(90), 1)]
#[case::just_under_a_minute(TimeDelta::seconds(59), 0)]
#[case::two_hours(TimeDelta::hours(2), 120)]
fn fixing_derives_whole_minutes_to_fix(
    clock: SteppingClock,
    mut pending_issue: Issue,
    #[case] elapsed: TimeDelta,
    #[case] expected_minutes: i64,
) {
    let technician = actor("Tom Technician");
    clock.advance(elapsed);

    pending_issue
        .transition_to(IssueStatus::Fixed, Some(technician.clone()), None, &clock)
        .expect("status changes");

    assert_eq!(pending_issue.time_to_fix_minutes(), Some(expected_minutes));
    assert_eq!(pending_issue.fixed_at(), Some(clock.utc()));
    assert_eq!(pending_issue.fixed_by(), Some(&technician));
}

#[rstest]
fn refixing_overwrites_metrics_and_leaving_fixed_keeps_them(
    clock: SteppingClock,
    mut pending_issue: Issue,
) {
    let first: Actor = actor("First Fixer");
    let second: Actor = actor("Second Fixer");

    clock.advance(TimeDelta::minutes(10));
    pending_issue.transition_to(IssueStatus::Fixed, Some(first.clone()), None, &clock);
    let first_fix = pending_issue.fix().cloned();

    clock.advance(TimeDelta::minutes(5));
    pending_issue.transition_to(IssueStatus::InProgress, None, None, &clock);
    assert_eq!(pending_issue.fix().cloned(), first_fix);
    assert_eq!(pending_issue.fixed_by(), Some(&first));

    clock.advance(TimeDelta::minutes(15));
    pending_issue.transition_to(IssueStatus::Fixed, Some(second.clone()), None, &clock);
    assert_eq!(pending_issue.time_to_fix_minutes(), Some(30));
    assert_eq!(pending_issue.fixed_by(), Some(&second));
}

#[rstest]
fn patch_updates_fields_and_clears_nullable_values(clock: SteppingClock, mut pending_issue: Issue) {
    pending_issue
        .apply_patch(
            IssuePatch {
                coordinates: Some(Some(GeoPoint::new(51.5, -0.12).expect("valid point"))),
                pin: Some(Some(FloorplanPin {
                    x: 10.0,
                    y: 20.0,
                    is_interior: true,
                })),
                final_cost: Some(Some(99.5)),
                ..IssuePatch::default()
            },
            &clock,
        )
        .expect("first patch applies");
    clock.advance(TimeDelta::minutes(1));

    pending_issue
        .apply_patch(
            IssuePatch {
                title: Some("Fryer element replaced".to_owned()),
                priority: Some(IssuePriority::Low),
                coordinates: Some(None),
                final_cost: Some(None),
                ..IssuePatch::default()
            },
            &clock,
        )
        .expect("second patch applies");

    assert_eq!(pending_issue.title(), "Fryer element replaced");
    assert_eq!(pending_issue.priority(), IssuePriority::Low);
    assert_eq!(pending_issue.coordinates(), None);
    assert!(pending_issue.pin().is_some_and(|pin| pin.is_interior));
    assert_eq!(pending_issue.final_cost(), None);
    assert_eq!(pending_issue.status(), IssueStatus::Pending);
    assert_eq!(pending_issue.updated_at(), clock.utc());
}

#[rstest]
fn invalid_patch_leaves_issue_untouched(clock: SteppingClock, mut pending_issue: Issue) {
    let before = pending_issue.clone();
    clock.advance(TimeDelta::minutes(1));

    let result = pending_issue.apply_patch(
        IssuePatch {
            title: Some("New title".to_owned()),
            description: Some("  ".to_owned()),
            ..IssuePatch::default()
        },
        &clock,
    );

    assert_eq!(result, Err(IssueDomainError::EmptyField("description")));
    assert_eq!(pending_issue, before);
}

#[rstest]
#[case(91.0, 0.0)]
#[case(0.0, -180.5)]
#[case(f64::NAN, 0.0)]
fn geo_point_rejects_out_of_range_values(#[case] latitude: f64, #[case] longitude: f64) {
    assert!(matches!(
        GeoPoint::new(latitude, longitude),
        Err(IssueDomainError::InvalidCoordinates { .. })
    ));
}

#[rstest]
fn zero_radius_contains_only_the_centre() {
    let centre = GeoPoint::new(0.0, 0.0).expect("valid point");
    let area = SearchRadius::new(centre, 0.0).expect("valid radius");

    assert!(area.contains(centre));
    assert!(!area.contains(GeoPoint::new(0.0, 0.001).expect("valid point")));
}

#[rstest]
#[case(10.04, true)]
#[case(10.05, false)]
fn default_radius_boundary_uses_planar_degrees(#[case] longitude: f64, #[case] inside: bool) {
    let centre = GeoPoint::new(10.0, 10.0).expect("valid point");
    let area = SearchRadius::new(centre, SearchRadius::DEFAULT_KM).expect("valid radius");
    let point = GeoPoint::new(10.0, longitude).expect("valid point");

    assert_eq!(area.contains(point), inside);
}

#[rstest]
#[case(-1.0)]
#[case(f64::INFINITY)]
fn search_radius_rejects_invalid_values(#[case] radius: f64) {
    let centre = GeoPoint::new(0.0, 0.0).expect("valid point");
    assert!(matches!(
        SearchRadius::new(centre, radius),
        Err(IssueDomainError::InvalidRadius(_))
    ));
}

#[rstest]
fn statistics_over_nothing_are_zero() {
    let stats = IssueStatistics::from_issues(std::iter::empty());

    assert_eq!(stats, IssueStatistics::default());
    assert_eq!(stats.average_fix_time, None);
    assert_eq!(stats.most_reported_location, None);
}

#[rstest]
fn statistics_aggregate_fix_metrics_and_break_location_ties(clock: SteppingClock) {
    let mut issues: Vec<Issue> = ["Lobby", "Kitchen", "Lobby", "Kitchen", "Patio"]
        .into_iter()
        .map(|location| Issue::report(new_issue(location), &clock).expect("valid issue"))
        .collect();

    clock.advance(TimeDelta::minutes(10));
    if let Some(issue) = issues.get_mut(0) {
        issue.transition_to(IssueStatus::Fixed, Some(actor("Fixer")), None, &clock);
    }
    clock.advance(TimeDelta::minutes(20));
    if let Some(issue) = issues.get_mut(1) {
        issue.transition_to(IssueStatus::Fixed, Some(actor("Fixer")), None, &clock);
    }

    let stats = IssueStatistics::from_issues(&issues);

    assert_eq!(stats.total_issues, 5);
    assert_eq!(stats.open_issues, 3);
    assert_eq!(stats.fixed_issues, 2);
    assert_eq!(stats.average_fix_time, Some(20.0));
    assert_eq!(stats.most_reported_location.as_deref(), Some("Kitchen"));
    assert_eq!(stats.last_fix_date, Some(clock.utc()));
}

#[rstest]
fn reopened_issue_counts_as_open(clock: SteppingClock, mut pending_issue: Issue) {
    pending_issue.transition_to(IssueStatus::Fixed, Some(actor("Fixer")), None, &clock);
    pending_issue.transition_to(IssueStatus::Urgent, None, None, &clock);

    let stats = IssueStatistics::from_issues([&pending_issue]);

    assert_eq!(stats.open_issues, 1);
    assert_eq!(stats.fixed_issues, 0);
    assert_eq!(stats.average_fix_time, None);
    assert_eq!(stats.last_fix_date, None);
}
