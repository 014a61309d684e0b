//! Domain model for the issue lifecycle tracker.
//!
//! Issues move through a closed set of statuses. Every status change yields
//! an append-only [`StatusChange`] record, and entering the terminal
//! [`IssueStatus::Fixed`] status derives fix metrics on the issue. The
//! domain is free of persistence concerns; adapters rebuild aggregates
//! through the `from_persisted` constructors.

mod actor;
mod attachments;
mod error;
mod geo;
mod ids;
mod issue;
mod statistics;
mod status;
mod status_change;

pub use actor::Actor;
pub use attachments::{Comment, IssueImage};
pub use error::IssueDomainError;
pub use geo::{FloorplanPin, GeoPoint, KM_PER_DEGREE, SearchRadius};
pub use ids::{CommentId, ImageId, IssueId, StatusChangeId};
pub use issue::{FixRecord, Issue, IssuePatch, NewIssue, PersistedIssueData};
pub use statistics::IssueStatistics;
pub use status::{IssuePriority, IssueStatus, IssueType};
pub use status_change::{PersistedStatusChangeData, StatusChange};
