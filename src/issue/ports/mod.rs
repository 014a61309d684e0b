//! Port contracts for the issue lifecycle tracker.
//!
//! Ports define infrastructure-agnostic interfaces used by issue services.

pub mod repository;

pub use repository::{IssueFilter, IssueRepository, IssueRepositoryError, IssueRepositoryResult};
