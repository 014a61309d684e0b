//! Append-only status history records.

use super::{Actor, IssueId, IssueStatus, StatusChangeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded status transition of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    id: StatusChangeId,
    issue_id: IssueId,
    old_status: IssueStatus,
    new_status: IssueStatus,
    changed_by: Option<Actor>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedStatusChangeData {
    /// Persisted record identifier.
    pub id: StatusChangeId,
    /// Owning issue.
    pub issue_id: IssueId,
    /// Status before the transition.
    pub old_status: IssueStatus,
    /// Status after the transition.
    pub new_status: IssueStatus,
    /// Acting user, if any.
    pub changed_by: Option<Actor>,
    /// Free-text note.
    pub notes: Option<String>,
    /// Transition timestamp.
    pub created_at: DateTime<Utc>,
}

impl StatusChange {
    pub(super) fn record(
        issue_id: IssueId,
        old_status: IssueStatus,
        new_status: IssueStatus,
        changed_by: Option<Actor>,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StatusChangeId::new(),
            issue_id,
            old_status,
            new_status,
            changed_by,
            notes: notes
                .map(|note| note.trim().to_owned())
                .filter(|note| !note.is_empty()),
            created_at,
        }
    }

    /// Reconstructs a status change from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedStatusChangeData) -> Self {
        Self {
            id: data.id,
            issue_id: data.issue_id,
            old_status: data.old_status,
            new_status: data.new_status,
            changed_by: data.changed_by,
            notes: data.notes,
            created_at: data.created_at,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> StatusChangeId {
        self.id
    }

    /// Returns the owning issue identifier.
    #[must_use]
    pub const fn issue_id(&self) -> IssueId {
        self.issue_id
    }

    /// Returns the status before the transition.
    #[must_use]
    pub const fn old_status(&self) -> IssueStatus {
        self.old_status
    }

    /// Returns the status after the transition.
    #[must_use]
    pub const fn new_status(&self) -> IssueStatus {
        self.new_status
    }

    /// Returns the acting user, or `None` for system-initiated transitions.
    #[must_use]
    pub const fn changed_by(&self) -> Option<&Actor> {
        self.changed_by.as_ref()
    }

    /// Returns the note attached to the transition.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the transition timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
