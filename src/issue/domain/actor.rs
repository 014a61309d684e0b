//! Acting user references recorded on issues and history.

use super::IssueDomainError;
use crate::user::domain::UserId;
use serde::{Deserialize, Serialize};

/// User reference captured at the time of an action.
///
/// The display name is denormalised so history stays readable after the user
/// record changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    name: String,
}

impl Actor {
    /// Creates an actor reference with a non-empty display name.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::EmptyField`] when the name is blank.
    pub fn new(id: UserId, name: impl Into<String>) -> Result<Self, IssueDomainError> {
        let raw = name.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IssueDomainError::EmptyField("actor name"));
        }
        Ok(Self {
            id,
            name: normalized.to_owned(),
        })
    }

    /// Builds an actor from optional identity parts.
    ///
    /// Returns `Ok(None)` when neither part is present, so callers can model
    /// system-initiated actions.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::EmptyField`] when only one of the two
    /// parts is provided or the name is blank.
    pub fn from_optional_parts(
        id: Option<UserId>,
        name: Option<String>,
    ) -> Result<Option<Self>, IssueDomainError> {
        match (id, name) {
            (None, None) => Ok(None),
            (Some(user_id), Some(user_name)) => Self::new(user_id, user_name).map(Some),
            (None, Some(_)) => Err(IssueDomainError::EmptyField("actor id")),
            (Some(_), None) => Err(IssueDomainError::EmptyField("actor name")),
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
