//! Error types for issue domain validation and parsing.

use super::IssueId;
use thiserror::Error;

/// Errors returned while constructing or mutating issue domain values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IssueDomainError {
    /// A required text field is empty after trimming.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// The status value is not part of the closed status enumeration.
    #[error("unknown issue status: {0}")]
    UnknownStatus(String),

    /// The priority value is unsupported.
    #[error("unknown issue priority: {0}")]
    UnknownPriority(String),

    /// The issue type value is unsupported.
    #[error("unknown issue type: {0}")]
    UnknownIssueType(String),

    /// Latitude or longitude is outside the valid range or not finite.
    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// Rejected latitude in degrees.
        latitude: f64,
        /// Rejected longitude in degrees.
        longitude: f64,
    },

    /// A search radius is negative or not finite.
    #[error("invalid search radius {0} km")]
    InvalidRadius(f64),

    /// A cost value is negative or not finite.
    #[error("invalid {field} {value}")]
    InvalidCost {
        /// Name of the rejected cost field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Marking an issue as fixed requires the acting user.
    #[error("marking issue {0} as fixed requires fixedById and fixedByName")]
    MissingFixActor(IssueId),
}
