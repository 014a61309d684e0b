//! Closed enumerations describing issue status, priority and category.

use super::IssueDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue lifecycle status.
///
/// `Fixed` is the single terminal value: transitions into it record the fix
/// metrics on the issue. The legacy spelling `completed` parses as `Fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Reported and awaiting triage.
    #[default]
    Pending,
    /// Work on the issue has started.
    InProgress,
    /// A repair has been scheduled.
    Scheduled,
    /// Flagged as needing immediate attention.
    Urgent,
    /// The issue has been repaired.
    Fixed,
}

impl IssueStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Scheduled,
        Self::Urgent,
        Self::Fixed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Scheduled => "scheduled",
            Self::Urgent => "urgent",
            Self::Fixed => "fixed",
        }
    }

    /// Returns whether this is the terminal status that carries fix metrics.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fixed)
    }
}

impl TryFrom<&str> for IssueStatus {
    type Error = IssueDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "scheduled" => Ok(Self::Scheduled),
            "urgent" => Ok(Self::Urgent),
            "fixed" | "completed" => Ok(Self::Fixed),
            _ => Err(IssueDomainError::UnknownStatus(value.to_owned())),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue urgency as set by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    /// Can wait.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// Needs prompt attention.
    High,
}

impl IssuePriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for IssuePriority {
    type Error = IssueDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(IssueDomainError::UnknownPriority(value.to_owned())),
        }
    }
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equipment or area category an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// Fryer equipment.
    Fryer,
    /// Grill equipment.
    Grill,
    /// Ice cream machine.
    #[serde(rename = "ice_cream_machine")]
    IceCream,
    /// Drink dispenser.
    DrinkDispenser,
    /// Refrigeration units.
    Refrigerator,
    /// Seating area.
    Seating,
    /// Service counter.
    Counter,
    /// Restrooms.
    Bathroom,
    /// Flooring.
    Floor,
    /// Ceiling.
    Ceiling,
    /// Lighting.
    Lighting,
    /// Heating, ventilation and air conditioning.
    Hvac,
    /// Building exterior.
    Exterior,
    /// Playground.
    Playground,
    /// Drive-through lane.
    DriveThru,
    /// Anything else.
    #[default]
    Other,
}

impl IssueType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fryer => "fryer",
            Self::Grill => "grill",
            Self::IceCream => "ice_cream_machine",
            Self::DrinkDispenser => "drink_dispenser",
            Self::Refrigerator => "refrigerator",
            Self::Seating => "seating",
            Self::Counter => "counter",
            Self::Bathroom => "bathroom",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
            Self::Lighting => "lighting",
            Self::Hvac => "hvac",
            Self::Exterior => "exterior",
            Self::Playground => "playground",
            Self::DriveThru => "drive_thru",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for IssueType {
    type Error = IssueDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fryer" => Ok(Self::Fryer),
            "grill" => Ok(Self::Grill),
            "ice_cream_machine" => Ok(Self::IceCream),
            "drink_dispenser" => Ok(Self::DrinkDispenser),
            "refrigerator" => Ok(Self::Refrigerator),
            "seating" => Ok(Self::Seating),
            "counter" => Ok(Self::Counter),
            "bathroom" => Ok(Self::Bathroom),
            "floor" => Ok(Self::Floor),
            "ceiling" => Ok(Self::Ceiling),
            "lighting" => Ok(Self::Lighting),
            "hvac" => Ok(Self::Hvac),
            "exterior" => Ok(Self::Exterior),
            "playground" => Ok(Self::Playground),
            "drive_thru" => Ok(Self::DriveThru),
            "other" => Ok(Self::Other),
            _ => Err(IssueDomainError::UnknownIssueType(value.to_owned())),
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
