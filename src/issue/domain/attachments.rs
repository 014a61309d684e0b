//! Comments and images attached to an issue.

use super::{Actor, CommentId, ImageId, IssueDomainError, IssueId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Discussion entry on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    issue_id: IssueId,
    author: Actor,
    content: String,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a comment with non-empty content.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::EmptyField`] when the content is blank.
    pub fn new(
        issue_id: IssueId,
        author: Actor,
        content: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, IssueDomainError> {
        let raw = content.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IssueDomainError::EmptyField("comment content"));
        }
        Ok(Self {
            id: CommentId::new(),
            issue_id,
            author,
            content: normalized.to_owned(),
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a comment from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: CommentId,
        issue_id: IssueId,
        author: Actor,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            issue_id,
            author,
            content,
            created_at,
        }
    }

    /// Returns the comment identifier.
    #[must_use]
    pub const fn id(&self) -> CommentId {
        self.id
    }

    /// Returns the commented issue.
    #[must_use]
    pub const fn issue_id(&self) -> IssueId {
        self.issue_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn author(&self) -> &Actor {
        &self.author
    }

    /// Returns the comment body.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Reference to an uploaded image file.
///
/// Only the stored file name is tracked; the bytes live in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueImage {
    id: ImageId,
    issue_id: IssueId,
    filename: String,
    created_at: DateTime<Utc>,
}

impl IssueImage {
    /// Creates an image reference.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::EmptyField`] when the file name is blank.
    pub fn new(
        issue_id: IssueId,
        filename: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, IssueDomainError> {
        let raw = filename.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IssueDomainError::EmptyField("image filename"));
        }
        Ok(Self {
            id: ImageId::new(),
            issue_id,
            filename: normalized.to_owned(),
            created_at: clock.utc(),
        })
    }

    /// Reconstructs an image reference from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: ImageId,
        issue_id: IssueId,
        filename: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            issue_id,
            filename,
            created_at,
        }
    }

    /// Returns the image identifier.
    #[must_use]
    pub const fn id(&self) -> ImageId {
        self.id
    }

    /// Returns the owning issue.
    #[must_use]
    pub const fn issue_id(&self) -> IssueId {
        self.issue_id
    }

    /// Returns the stored file name.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the upload timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
