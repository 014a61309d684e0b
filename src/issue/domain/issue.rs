//! Issue aggregate root and its status transition logic.

use super::{
    Actor, FloorplanPin, GeoPoint, IssueDomainError, IssueId, IssuePriority, IssueStatus,
    IssueType, StatusChange,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Completion metrics captured when an issue enters [`IssueStatus::Fixed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRecord {
    fixed_at: DateTime<Utc>,
    fixed_by: Option<Actor>,
    time_to_fix_minutes: i64,
}

impl FixRecord {
    /// Derives fix metrics from the creation and fix timestamps.
    ///
    /// Elapsed time is truncated to whole minutes and never negative.
    #[must_use]
    pub fn derive(created_at: DateTime<Utc>, fixed_at: DateTime<Utc>, fixed_by: Option<Actor>) -> Self {
        let time_to_fix_minutes = (fixed_at - created_at).num_minutes().max(0);
        Self {
            fixed_at,
            fixed_by,
            time_to_fix_minutes,
        }
    }

    /// Reconstructs fix metrics from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        fixed_at: DateTime<Utc>,
        fixed_by: Option<Actor>,
        time_to_fix_minutes: i64,
    ) -> Self {
        Self {
            fixed_at,
            fixed_by,
            time_to_fix_minutes,
        }
    }

    /// Returns when the issue was marked fixed.
    #[must_use]
    pub const fn fixed_at(&self) -> DateTime<Utc> {
        self.fixed_at
    }

    /// Returns who fixed the issue, if recorded.
    #[must_use]
    pub const fn fixed_by(&self) -> Option<&Actor> {
        self.fixed_by.as_ref()
    }

    /// Returns the whole minutes between creation and fix.
    #[must_use]
    pub const fn time_to_fix_minutes(&self) -> i64 {
        self.time_to_fix_minutes
    }
}

/// Validated input for reporting a new issue.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    /// Short summary.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Free-text location, used for "most reported location" statistics.
    pub location: String,
    /// Reporting user.
    pub reported_by: Actor,
    /// Initial status.
    pub status: IssueStatus,
    /// Urgency.
    pub priority: IssuePriority,
    /// Category.
    pub issue_type: IssueType,
    /// Optional map position.
    pub coordinates: Option<GeoPoint>,
    /// Optional floorplan pin.
    pub pin: Option<FloorplanPin>,
    /// Estimated repair cost.
    pub estimated_cost: f64,
}

/// Typed partial update of an issue's descriptive fields.
///
/// Outer `None` leaves a field untouched; for nullable fields the inner
/// `None` clears the stored value. Status is deliberately absent: status
/// changes go through [`Issue::transition_to`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuePatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New priority.
    pub priority: Option<IssuePriority>,
    /// New category.
    pub issue_type: Option<IssueType>,
    /// New or cleared coordinates.
    pub coordinates: Option<Option<GeoPoint>>,
    /// New or cleared floorplan pin.
    pub pin: Option<Option<FloorplanPin>>,
    /// New estimated cost.
    pub estimated_cost: Option<f64>,
    /// New or cleared final cost.
    pub final_cost: Option<Option<f64>>,
}

/// Issue aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    id: IssueId,
    title: String,
    description: String,
    location: String,
    status: IssueStatus,
    priority: IssuePriority,
    issue_type: IssueType,
    coordinates: Option<GeoPoint>,
    pin: Option<FloorplanPin>,
    reported_by: Actor,
    estimated_cost: f64,
    final_cost: Option<f64>,
    fix: Option<FixRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted issue aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedIssueData {
    /// Persisted identifier.
    pub id: IssueId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted location.
    pub location: String,
    /// Persisted status.
    pub status: IssueStatus,
    /// Persisted priority.
    pub priority: IssuePriority,
    /// Persisted category.
    pub issue_type: IssueType,
    /// Persisted coordinates.
    pub coordinates: Option<GeoPoint>,
    /// Persisted floorplan pin.
    pub pin: Option<FloorplanPin>,
    /// Persisted reporter.
    pub reported_by: Actor,
    /// Persisted estimated cost.
    pub estimated_cost: f64,
    /// Persisted final cost.
    pub final_cost: Option<f64>,
    /// Persisted fix metrics.
    pub fix: Option<FixRecord>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Reports a new issue.
    ///
    /// An issue reported directly as [`IssueStatus::Fixed`] records the
    /// reporter as the fixer, with a fix time of zero minutes.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError`] when a required text field is blank or the
    /// estimated cost is negative.
    pub fn report(new_issue: NewIssue, clock: &impl Clock) -> Result<Self, IssueDomainError> {
        let title = required_text(new_issue.title, "title")?;
        let description = required_text(new_issue.description, "description")?;
        let location = required_text(new_issue.location, "location")?;
        let estimated_cost = validated_cost(new_issue.estimated_cost, "estimated cost")?;
        let timestamp = clock.utc();
        let fix = new_issue.status.is_terminal().then(|| {
            FixRecord::derive(timestamp, timestamp, Some(new_issue.reported_by.clone()))
        });

        Ok(Self {
            id: IssueId::new(),
            title,
            description,
            location,
            status: new_issue.status,
            priority: new_issue.priority,
            issue_type: new_issue.issue_type,
            coordinates: new_issue.coordinates,
            pin: new_issue.pin,
            reported_by: new_issue.reported_by,
            estimated_cost,
            final_cost: None,
            fix,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs an issue from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedIssueData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            location: data.location,
            status: data.status,
            priority: data.priority,
            issue_type: data.issue_type,
            coordinates: data.coordinates,
            pin: data.pin,
            reported_by: data.reported_by,
            estimated_cost: data.estimated_cost,
            final_cost: data.final_cost,
            fix: data.fix,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the issue identifier.
    #[must_use]
    pub const fn id(&self) -> IssueId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the free-text location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> IssueStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> IssuePriority {
        self.priority
    }

    /// Returns the category.
    #[must_use]
    pub const fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    /// Returns the map coordinates, if any.
    #[must_use]
    pub const fn coordinates(&self) -> Option<GeoPoint> {
        self.coordinates
    }

    /// Returns the floorplan pin, if any.
    #[must_use]
    pub const fn pin(&self) -> Option<FloorplanPin> {
        self.pin
    }

    /// Returns the reporting user.
    #[must_use]
    pub const fn reported_by(&self) -> &Actor {
        &self.reported_by
    }

    /// Returns the estimated cost.
    #[must_use]
    pub const fn estimated_cost(&self) -> f64 {
        self.estimated_cost
    }

    /// Returns the final cost, if recorded.
    #[must_use]
    pub const fn final_cost(&self) -> Option<f64> {
        self.final_cost
    }

    /// Returns the fix metrics of the latest transition into `fixed`.
    #[must_use]
    pub const fn fix(&self) -> Option<&FixRecord> {
        self.fix.as_ref()
    }

    /// Returns when the issue was last marked fixed.
    #[must_use]
    pub fn fixed_at(&self) -> Option<DateTime<Utc>> {
        self.fix.as_ref().map(FixRecord::fixed_at)
    }

    /// Returns who last marked the issue fixed.
    #[must_use]
    pub fn fixed_by(&self) -> Option<&Actor> {
        self.fix.as_ref().and_then(FixRecord::fixed_by)
    }

    /// Returns whole minutes from creation to the latest fix.
    #[must_use]
    pub fn time_to_fix_minutes(&self) -> Option<i64> {
        self.fix.as_ref().map(FixRecord::time_to_fix_minutes)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the issue to `new_status` and returns the history record.
    ///
    /// Returns `None` without touching the issue when `new_status` equals the
    /// current status. Entering [`IssueStatus::Fixed`] overwrites the fix
    /// metrics; leaving it keeps them.
    pub fn transition_to(
        &mut self,
        new_status: IssueStatus,
        actor: Option<Actor>,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Option<StatusChange> {
        if new_status == self.status {
            return None;
        }

        let timestamp = clock.utc();
        if new_status.is_terminal() {
            self.fix = Some(FixRecord::derive(self.created_at, timestamp, actor.clone()));
        }
        let change =
            StatusChange::record(self.id, self.status, new_status, actor, notes, timestamp);
        self.status = new_status;
        self.updated_at = timestamp;
        Some(change)
    }

    /// Applies a typed partial update.
    ///
    /// The issue is left unchanged when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError`] when a text field would become blank or a
    /// cost is negative.
    pub fn apply_patch(
        &mut self,
        patch: IssuePatch,
        clock: &impl Clock,
    ) -> Result<(), IssueDomainError> {
        let title = patch.title.map(|value| required_text(value, "title")).transpose()?;
        let description = patch
            .description
            .map(|value| required_text(value, "description"))
            .transpose()?;
        let location = patch
            .location
            .map(|value| required_text(value, "location"))
            .transpose()?;
        let estimated_cost = patch
            .estimated_cost
            .map(|value| validated_cost(value, "estimated cost"))
            .transpose()?;
        let final_cost = patch
            .final_cost
            .map(|value| value.map(|cost| validated_cost(cost, "final cost")).transpose())
            .transpose()?;

        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(value) = location {
            self.location = value;
        }
        if let Some(value) = patch.priority {
            self.priority = value;
        }
        if let Some(value) = patch.issue_type {
            self.issue_type = value;
        }
        if let Some(value) = patch.coordinates {
            self.coordinates = value;
        }
        if let Some(value) = patch.pin {
            self.pin = value;
        }
        if let Some(value) = estimated_cost {
            self.estimated_cost = value;
        }
        if let Some(value) = final_cost {
            self.final_cost = value;
        }
        self.updated_at = clock.utc();
        Ok(())
    }
}

fn required_text(value: String, field: &'static str) -> Result<String, IssueDomainError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(IssueDomainError::EmptyField(field));
    }
    if normalized.len() == value.len() {
        return Ok(value);
    }
    Ok(normalized.to_owned())
}

fn validated_cost(value: f64, field: &'static str) -> Result<f64, IssueDomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(IssueDomainError::InvalidCost { field, value });
    }
    Ok(value)
}
