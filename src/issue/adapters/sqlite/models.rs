//! Diesel row models for issue persistence.

use super::schema::{comments, images, issues, status_history};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Nullable, Text};

/// Full issue row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = issues)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IssueRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: String,
    pub priority: String,
    pub issue_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pin_x: Option<f64>,
    pub pin_y: Option<f64>,
    pub is_interior_pin: Option<bool>,
    pub reported_by_id: String,
    pub reported_by_name: String,
    pub estimated_cost: f64,
    pub final_cost: Option<f64>,
    pub fixed_by_id: Option<String>,
    pub fixed_by_name: Option<String>,
    pub fixed_at: Option<String>,
    pub time_to_fix: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Descriptive columns written by field edits.
///
/// Cleared optional values are written as `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = issues)]
#[diesel(treat_none_as_null = true)]
pub struct IssueFieldsChangeset {
    pub title: String,
    pub description: String,
    pub location: String,
    pub priority: String,
    pub issue_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pin_x: Option<f64>,
    pub pin_y: Option<f64>,
    pub is_interior_pin: Option<bool>,
    pub estimated_cost: f64,
    pub final_cost: Option<f64>,
    pub updated_at: String,
}

/// Lifecycle columns written by a status transition.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = issues)]
#[diesel(treat_none_as_null = true)]
pub struct IssueLifecycleChangeset {
    pub status: String,
    pub fixed_by_id: Option<String>,
    pub fixed_by_name: Option<String>,
    pub fixed_at: Option<String>,
    pub time_to_fix: Option<i64>,
    pub updated_at: String,
}

/// Status history row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = status_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StatusChangeRow {
    pub id: String,
    pub issue_id: String,
    pub old_status: String,
    pub new_status: String,
    pub changed_by_id: Option<String>,
    pub changed_by_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Comment row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommentRow {
    pub id: String,
    pub issue_id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub created_at: String,
}

/// Image reference row, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ImageRow {
    pub id: String,
    pub issue_id: String,
    pub filename: String,
    pub created_at: String,
}

/// Aggregate counters computed by the statistics query.
#[derive(Debug, Clone, QueryableByName)]
pub struct StatisticsRow {
    #[diesel(sql_type = BigInt)]
    pub total_issues: i64,
    #[diesel(sql_type = BigInt)]
    pub open_issues: i64,
    #[diesel(sql_type = BigInt)]
    pub fixed_issues: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub average_fix_time: Option<f64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub last_fix_date: Option<String>,
}

/// Report count for the busiest location.
#[derive(Debug, Clone, QueryableByName)]
pub struct LocationCountRow {
    #[diesel(sql_type = Text)]
    pub location: String,
    #[diesel(sql_type = BigInt)]
    pub reports: i64,
}
