//! Aggregate issue statistics.

use super::{Issue, IssueStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary counts and fix metrics over a set of issues.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStatistics {
    /// Number of issues in scope.
    pub total_issues: u64,
    /// Issues whose status is anything but `fixed`.
    pub open_issues: u64,
    /// Issues whose status is `fixed`.
    pub fixed_issues: u64,
    /// Mean minutes-to-fix over fixed issues, `None` when there are none.
    pub average_fix_time: Option<f64>,
    /// Most frequent location; ties resolve to the lexicographically smallest.
    pub most_reported_location: Option<String>,
    /// Latest fix timestamp among fixed issues.
    pub last_fix_date: Option<DateTime<Utc>>,
}

impl IssueStatistics {
    /// Computes statistics over an in-memory collection of issues.
    #[must_use]
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut stats = Self::default();
        let mut fix_minutes_total: i64 = 0;
        let mut fix_minutes_count: u32 = 0;
        let mut location_counts: BTreeMap<&str, u64> = BTreeMap::new();

        for issue in issues {
            stats.total_issues += 1;
            *location_counts.entry(issue.location()).or_default() += 1;

            if issue.status() != IssueStatus::Fixed {
                stats.open_issues += 1;
                continue;
            }
            stats.fixed_issues += 1;
            if let Some(minutes) = issue.time_to_fix_minutes() {
                fix_minutes_total = fix_minutes_total.saturating_add(minutes);
                fix_minutes_count += 1;
            }
            if let Some(fixed_at) = issue.fixed_at() {
                stats.last_fix_date = stats.last_fix_date.max(Some(fixed_at));
            }
        }

        stats.average_fix_time = average(fix_minutes_total, fix_minutes_count);
        stats.most_reported_location = most_frequent(&location_counts);
        stats
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "average fix time is reported as a floating-point mean"
)]
fn average(total: i64, count: u32) -> Option<f64> {
    (count > 0).then(|| total as f64 / f64::from(count))
}

/// Picks the highest count; `BTreeMap` iteration order makes the first
/// maximum the lexicographically smallest key.
fn most_frequent(counts: &BTreeMap<&str, u64>) -> Option<String> {
    let mut best: Option<(&str, u64)> = None;
    for (location, count) in counts {
        if best.is_none_or(|(_, best_count)| *count > best_count) {
            best = Some((*location, *count));
        }
    }
    best.map(|(location, _)| location.to_owned())
}
