//! Repository port for issue persistence, status history and attachments.

use crate::issue::domain::{
    Comment, ImageId, Issue, IssueId, IssueImage, IssueStatistics, IssueStatus, IssueType,
    StatusChange,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for issue repository operations.
pub type IssueRepositoryResult<T> = Result<T, IssueRepositoryError>;

/// Optional criteria for listing issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueFilter {
    /// Only issues currently in this status.
    pub status: Option<IssueStatus>,
    /// Only issues of this category.
    pub issue_type: Option<IssueType>,
}

impl IssueFilter {
    /// Returns whether `issue` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        self.status.is_none_or(|status| issue.status() == status)
            && self
                .issue_type
                .is_none_or(|issue_type| issue.issue_type() == issue_type)
    }
}

/// Issue persistence contract.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Stores a new issue together with its initial images.
    ///
    /// # Errors
    ///
    /// Returns [`IssueRepositoryError::DuplicateIssue`] when the identifier
    /// already exists.
    async fn store(&self, issue: &Issue, images: &[IssueImage]) -> IssueRepositoryResult<()>;

    /// Persists descriptive field changes and `updated_at`.
    ///
    /// Status and fix metrics are left as stored; they only change through
    /// [`IssueRepository::commit_transition`].
    ///
    /// # Errors
    ///
    /// Returns [`IssueRepositoryError::NotFound`] when the issue does not exist.
    async fn update(&self, issue: &Issue) -> IssueRepositoryResult<()>;

    /// Atomically writes a status transition and appends its history record.
    ///
    /// The write only succeeds when the stored status still equals
    /// `change.old_status()`; neither the issue nor the history changes
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`IssueRepositoryError::StaleStatus`] when another transition
    /// won the race, or [`IssueRepositoryError::NotFound`] when the issue is
    /// gone.
    async fn commit_transition(
        &self,
        issue: &Issue,
        change: &StatusChange,
    ) -> IssueRepositoryResult<()>;

    /// Deletes an issue with its history, comments and images.
    ///
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: IssueId) -> IssueRepositoryResult<bool>;

    /// Finds an issue by identifier.
    async fn find_by_id(&self, id: IssueId) -> IssueRepositoryResult<Option<Issue>>;

    /// Lists issues matching `filter`, newest first.
    async fn list(&self, filter: IssueFilter) -> IssueRepositoryResult<Vec<Issue>>;

    /// Returns every issue that has map coordinates, in creation order.
    async fn find_with_coordinates(&self) -> IssueRepositoryResult<Vec<Issue>>;

    /// Returns the status history of an issue, newest first.
    async fn status_history(&self, id: IssueId) -> IssueRepositoryResult<Vec<StatusChange>>;

    /// Stores a comment.
    ///
    /// # Errors
    ///
    /// Returns [`IssueRepositoryError::NotFound`] when the issue does not exist.
    async fn store_comment(&self, comment: &Comment) -> IssueRepositoryResult<()>;

    /// Returns the comments of an issue, oldest first.
    async fn comments(&self, id: IssueId) -> IssueRepositoryResult<Vec<Comment>>;

    /// Stores an image reference.
    ///
    /// # Errors
    ///
    /// Returns [`IssueRepositoryError::NotFound`] when the issue does not exist.
    async fn store_image(&self, image: &IssueImage) -> IssueRepositoryResult<()>;

    /// Returns the images of an issue, oldest first.
    async fn images(&self, id: IssueId) -> IssueRepositoryResult<Vec<IssueImage>>;

    /// Finds an image by identifier.
    async fn find_image(&self, id: ImageId) -> IssueRepositoryResult<Option<IssueImage>>;

    /// Aggregates statistics, optionally restricted to one category.
    async fn statistics(
        &self,
        issue_type: Option<IssueType>,
    ) -> IssueRepositoryResult<IssueStatistics>;
}

/// Errors returned by issue repository implementations.
#[derive(Debug, Clone, Error)]
pub enum IssueRepositoryError {
    /// An issue with the same identifier already exists.
    #[error("duplicate issue identifier: {0}")]
    DuplicateIssue(IssueId),

    /// The issue was not found.
    #[error("issue not found: {0}")]
    NotFound(IssueId),

    /// The stored status no longer matches the transition's starting status.
    #[error("issue {issue_id} is no longer in status {expected}")]
    StaleStatus {
        /// Issue being transitioned.
        issue_id: IssueId,
        /// Status the transition expected to find.
        expected: IssueStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl IssueRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
