//! `SQLite` repository implementation for issue lifecycle storage.

use super::{
    models::{
        CommentRow, ImageRow, IssueFieldsChangeset, IssueLifecycleChangeset, IssueRow,
        LocationCountRow, StatisticsRow, StatusChangeRow,
    },
    schema::{comments, images, issues, status_history},
};
use crate::database::{SqlitePool, decode_timestamp, encode_timestamp};
use crate::issue::{
    domain::{
        Actor, Comment, CommentId, FixRecord, FloorplanPin, GeoPoint, ImageId, Issue, IssueId,
        IssueImage, IssuePriority, IssueStatistics, IssueStatus, IssueType,
        PersistedIssueData, PersistedStatusChangeData, StatusChange, StatusChangeId,
    },
    ports::{IssueFilter, IssueRepository, IssueRepositoryError, IssueRepositoryResult},
};
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use tracing::debug;

/// `SQLite`-backed issue repository.
#[derive(Debug, Clone)]
pub struct SqliteIssueRepository {
    pool: SqlitePool,
}

impl SqliteIssueRepository {
    /// Creates a repository over a migrated connection pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> IssueRepositoryResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> IssueRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(IssueRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(IssueRepositoryError::persistence)?
    }
}

impl From<DieselError> for IssueRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// Row-ordering tie-break for rows sharing a timestamp.
fn rowid() -> diesel::expression::SqlLiteral<BigInt> {
    sql::<BigInt>("rowid")
}

#[async_trait]
impl IssueRepository for SqliteIssueRepository {
    async fn store(&self, issue: &Issue, images: &[IssueImage]) -> IssueRepositoryResult<()> {
        let issue_id = issue.id();
        let new_row = to_issue_row(issue);
        let image_rows: Vec<ImageRow> = images.iter().map(to_image_row).collect();

        self.run_blocking(move |connection| {
            connection.immediate_transaction(|conn| {
                diesel::insert_into(issues::table)
                    .values(&new_row)
                    .execute(conn)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            IssueRepositoryError::DuplicateIssue(issue_id)
                        }
                        other => IssueRepositoryError::persistence(other),
                    })?;
                if !image_rows.is_empty() {
                    diesel::insert_into(images::table)
                        .values(&image_rows)
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, issue: &Issue) -> IssueRepositoryResult<()> {
        let issue_id = issue.id();
        let changeset = to_fields_changeset(issue);

        self.run_blocking(move |connection| {
            let updated = diesel::update(issues::table.find(issue_id.to_string()))
                .set(&changeset)
                .execute(connection)?;
            if updated == 0 {
                return Err(IssueRepositoryError::NotFound(issue_id));
            }
            Ok(())
        })
        .await
    }

    async fn commit_transition(
        &self,
        issue: &Issue,
        change: &StatusChange,
    ) -> IssueRepositoryResult<()> {
        let issue_id = issue.id();
        let expected = change.old_status();
        let changeset = to_lifecycle_changeset(issue);
        let history_row = to_status_change_row(change);

        self.run_blocking(move |connection| {
            connection.immediate_transaction(|conn| {
                let key = issue_id.to_string();
                let updated = diesel::update(
                    issues::table
                        .filter(issues::id.eq(key.as_str()))
                        .filter(issues::status.eq(expected.as_str())),
                )
                .set(&changeset)
                .execute(conn)?;

                if updated == 0 {
                    let exists = issues::table
                        .filter(issues::id.eq(key.as_str()))
                        .count()
                        .get_result::<i64>(conn)?
                        > 0;
                    return Err(if exists {
                        IssueRepositoryError::StaleStatus { issue_id, expected }
                    } else {
                        IssueRepositoryError::NotFound(issue_id)
                    });
                }

                diesel::insert_into(status_history::table)
                    .values(&history_row)
                    .execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    async fn delete(&self, id: IssueId) -> IssueRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(issues::table.find(id.to_string())).execute(connection)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn find_by_id(&self, id: IssueId) -> IssueRepositoryResult<Option<Issue>> {
        self.run_blocking(move |connection| {
            let row = issues::table
                .find(id.to_string())
                .select(IssueRow::as_select())
                .first::<IssueRow>(connection)
                .optional()?;
            row.map(row_to_issue).transpose()
        })
        .await
    }

    async fn list(&self, filter: IssueFilter) -> IssueRepositoryResult<Vec<Issue>> {
        self.run_blocking(move |connection| {
            let mut query = issues::table
                .select(IssueRow::as_select())
                .order_by(issues::created_at.desc())
                .then_order_by(rowid().desc())
                .into_boxed();
            if let Some(status) = filter.status {
                query = query.filter(issues::status.eq(status.as_str()));
            }
            if let Some(issue_type) = filter.issue_type {
                query = query.filter(issues::issue_type.eq(issue_type.as_str()));
            }
            let rows = query.load::<IssueRow>(connection)?;
            rows.into_iter().map(row_to_issue).collect()
        })
        .await
    }

    async fn find_with_coordinates(&self) -> IssueRepositoryResult<Vec<Issue>> {
        self.run_blocking(move |connection| {
            let rows = issues::table
                .filter(issues::latitude.is_not_null())
                .filter(issues::longitude.is_not_null())
                .select(IssueRow::as_select())
                .order_by(issues::created_at.asc())
                .then_order_by(rowid().asc())
                .load::<IssueRow>(connection)?;
            rows.into_iter().map(row_to_issue).collect()
        })
        .await
    }

    async fn status_history(&self, id: IssueId) -> IssueRepositoryResult<Vec<StatusChange>> {
        self.run_blocking(move |connection| {
            let rows = status_history::table
                .filter(status_history::issue_id.eq(id.to_string()))
                .select(StatusChangeRow::as_select())
                .order_by(status_history::created_at.desc())
                .then_order_by(rowid().desc())
                .load::<StatusChangeRow>(connection)?;
            rows.into_iter().map(row_to_status_change).collect()
        })
        .await
    }

    async fn store_comment(&self, comment: &Comment) -> IssueRepositoryResult<()> {
        let issue_id = comment.issue_id();
        let row = to_comment_row(comment);
        self.run_blocking(move |connection| {
            diesel::insert_into(comments::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| missing_parent(err, issue_id))?;
            Ok(())
        })
        .await
    }

    async fn comments(&self, id: IssueId) -> IssueRepositoryResult<Vec<Comment>> {
        self.run_blocking(move |connection| {
            let rows = comments::table
                .filter(comments::issue_id.eq(id.to_string()))
                .select(CommentRow::as_select())
                .order_by(comments::created_at.asc())
                .then_order_by(rowid().asc())
                .load::<CommentRow>(connection)?;
            rows.into_iter().map(row_to_comment).collect()
        })
        .await
    }

    async fn store_image(&self, image: &IssueImage) -> IssueRepositoryResult<()> {
        let issue_id = image.issue_id();
        let row = to_image_row(image);
        self.run_blocking(move |connection| {
            diesel::insert_into(images::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| missing_parent(err, issue_id))?;
            Ok(())
        })
        .await
    }

    async fn images(&self, id: IssueId) -> IssueRepositoryResult<Vec<IssueImage>> {
        self.run_blocking(move |connection| {
            let rows = images::table
                .filter(images::issue_id.eq(id.to_string()))
                .select(ImageRow::as_select())
                .order_by(images::created_at.asc())
                .then_order_by(rowid().asc())
                .load::<ImageRow>(connection)?;
            rows.into_iter().map(row_to_image).collect()
        })
        .await
    }

    async fn find_image(&self, id: ImageId) -> IssueRepositoryResult<Option<IssueImage>> {
        self.run_blocking(move |connection| {
            let row = images::table
                .find(id.to_string())
                .select(ImageRow::as_select())
                .first::<ImageRow>(connection)
                .optional()?;
            row.map(row_to_image).transpose()
        })
        .await
    }

    async fn statistics(
        &self,
        issue_type: Option<IssueType>,
    ) -> IssueRepositoryResult<IssueStatistics> {
        let type_filter = issue_type.map(IssueType::as_str);
        self.run_blocking(move |connection| {
            let totals = diesel::sql_query(concat!(
                "SELECT COUNT(*) AS total_issues, ",
                "COALESCE(SUM(CASE WHEN status <> 'fixed' THEN 1 ELSE 0 END), 0) AS open_issues, ",
                "COALESCE(SUM(CASE WHEN status = 'fixed' THEN 1 ELSE 0 END), 0) AS fixed_issues, ",
                "AVG(CASE WHEN status = 'fixed' THEN time_to_fix END) AS average_fix_time, ",
                "MAX(CASE WHEN status = 'fixed' THEN fixed_at END) AS last_fix_date ",
                "FROM issues WHERE (? IS NULL OR issue_type = ?)",
            ))
            .bind::<Nullable<Text>, _>(type_filter)
            .bind::<Nullable<Text>, _>(type_filter)
            .get_result::<StatisticsRow>(connection)?;

            let busiest = diesel::sql_query(concat!(
                "SELECT location, COUNT(*) AS reports FROM issues ",
                "WHERE (? IS NULL OR issue_type = ?) ",
                "GROUP BY location ORDER BY reports DESC, location ASC LIMIT 1",
            ))
            .bind::<Nullable<Text>, _>(type_filter)
            .bind::<Nullable<Text>, _>(type_filter)
            .get_result::<LocationCountRow>(connection)
            .optional()?;

            if let Some(row) = &busiest {
                debug!(location = %row.location, reports = row.reports, "busiest location");
            }
            row_to_statistics(totals, busiest.map(|row| row.location))
        })
        .await
    }
}

fn missing_parent(err: DieselError, issue_id: IssueId) -> IssueRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            IssueRepositoryError::NotFound(issue_id)
        }
        other => IssueRepositoryError::persistence(other),
    }
}

fn to_issue_row(issue: &Issue) -> IssueRow {
    let coordinates = issue.coordinates();
    let pin = issue.pin();
    let fix = issue.fix();
    IssueRow {
        id: issue.id().to_string(),
        title: issue.title().to_owned(),
        description: issue.description().to_owned(),
        location: issue.location().to_owned(),
        status: issue.status().as_str().to_owned(),
        priority: issue.priority().as_str().to_owned(),
        issue_type: issue.issue_type().as_str().to_owned(),
        latitude: coordinates.map(GeoPoint::latitude),
        longitude: coordinates.map(GeoPoint::longitude),
        pin_x: pin.map(|value| value.x),
        pin_y: pin.map(|value| value.y),
        is_interior_pin: pin.map(|value| value.is_interior),
        reported_by_id: issue.reported_by().id().to_string(),
        reported_by_name: issue.reported_by().name().to_owned(),
        estimated_cost: issue.estimated_cost(),
        final_cost: issue.final_cost(),
        fixed_by_id: fix.and_then(FixRecord::fixed_by).map(|actor| actor.id().to_string()),
        fixed_by_name: fix
            .and_then(FixRecord::fixed_by)
            .map(|actor| actor.name().to_owned()),
        fixed_at: fix.map(|record| encode_timestamp(record.fixed_at())),
        time_to_fix: fix.map(FixRecord::time_to_fix_minutes),
        created_at: encode_timestamp(issue.created_at()),
        updated_at: encode_timestamp(issue.updated_at()),
    }
}

fn to_fields_changeset(issue: &Issue) -> IssueFieldsChangeset {
    let row = to_issue_row(issue);
    IssueFieldsChangeset {
        title: row.title,
        description: row.description,
        location: row.location,
        priority: row.priority,
        issue_type: row.issue_type,
        latitude: row.latitude,
        longitude: row.longitude,
        pin_x: row.pin_x,
        pin_y: row.pin_y,
        is_interior_pin: row.is_interior_pin,
        estimated_cost: row.estimated_cost,
        final_cost: row.final_cost,
        updated_at: row.updated_at,
    }
}

fn to_lifecycle_changeset(issue: &Issue) -> IssueLifecycleChangeset {
    let row = to_issue_row(issue);
    IssueLifecycleChangeset {
        status: row.status,
        fixed_by_id: row.fixed_by_id,
        fixed_by_name: row.fixed_by_name,
        fixed_at: row.fixed_at,
        time_to_fix: row.time_to_fix,
        updated_at: row.updated_at,
    }
}

fn to_status_change_row(change: &StatusChange) -> StatusChangeRow {
    StatusChangeRow {
        id: change.id().to_string(),
        issue_id: change.issue_id().to_string(),
        old_status: change.old_status().as_str().to_owned(),
        new_status: change.new_status().as_str().to_owned(),
        changed_by_id: change.changed_by().map(|actor| actor.id().to_string()),
        changed_by_name: change.changed_by().map(|actor| actor.name().to_owned()),
        notes: change.notes().map(str::to_owned),
        created_at: encode_timestamp(change.created_at()),
    }
}

fn to_comment_row(comment: &Comment) -> CommentRow {
    CommentRow {
        id: comment.id().to_string(),
        issue_id: comment.issue_id().to_string(),
        user_id: comment.author().id().to_string(),
        user_name: comment.author().name().to_owned(),
        content: comment.content().to_owned(),
        created_at: encode_timestamp(comment.created_at()),
    }
}

fn to_image_row(image: &IssueImage) -> ImageRow {
    ImageRow {
        id: image.id().to_string(),
        issue_id: image.issue_id().to_string(),
        filename: image.filename().to_owned(),
        created_at: encode_timestamp(image.created_at()),
    }
}

fn parse_id<T>(value: &str) -> IssueRepositoryResult<T>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    value.parse::<T>().map_err(IssueRepositoryError::persistence)
}

fn parse_timestamp(value: &str) -> IssueRepositoryResult<DateTime<Utc>> {
    decode_timestamp(value).map_err(IssueRepositoryError::persistence)
}

fn parse_actor(id: Option<&str>, name: Option<String>) -> IssueRepositoryResult<Option<Actor>> {
    let user_id = id.map(parse_id::<UserId>).transpose()?;
    Actor::from_optional_parts(user_id, name).map_err(IssueRepositoryError::persistence)
}

fn row_to_issue(row: IssueRow) -> IssueRepositoryResult<Issue> {
    let IssueRow {
        id,
        title,
        description,
        location,
        status,
        priority,
        issue_type,
        latitude,
        longitude,
        pin_x,
        pin_y,
        is_interior_pin,
        reported_by_id,
        reported_by_name,
        estimated_cost,
        final_cost,
        fixed_by_id,
        fixed_by_name,
        fixed_at,
        time_to_fix,
        created_at,
        updated_at,
    } = row;

    let coordinates = match (latitude, longitude) {
        (Some(lat), Some(lng)) => {
            Some(GeoPoint::new(lat, lng).map_err(IssueRepositoryError::persistence)?)
        }
        _ => None,
    };
    let pin = match (pin_x, pin_y) {
        (Some(x), Some(y)) => Some(FloorplanPin {
            x,
            y,
            is_interior: is_interior_pin.unwrap_or(false),
        }),
        _ => None,
    };
    let reported_by = Actor::new(parse_id::<UserId>(&reported_by_id)?, reported_by_name)
        .map_err(IssueRepositoryError::persistence)?;
    let fix = fixed_at
        .map(|value| {
            Ok::<_, IssueRepositoryError>(FixRecord::from_persisted(
                parse_timestamp(&value)?,
                parse_actor(fixed_by_id.as_deref(), fixed_by_name)?,
                time_to_fix.unwrap_or_default(),
            ))
        })
        .transpose()?;

    Ok(Issue::from_persisted(PersistedIssueData {
        id: parse_id::<IssueId>(&id)?,
        title,
        description,
        location,
        status: IssueStatus::try_from(status.as_str()).map_err(IssueRepositoryError::persistence)?,
        priority: IssuePriority::try_from(priority.as_str())
            .map_err(IssueRepositoryError::persistence)?,
        issue_type: IssueType::try_from(issue_type.as_str())
            .map_err(IssueRepositoryError::persistence)?,
        coordinates,
        pin,
        reported_by,
        estimated_cost,
        final_cost,
        fix,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    }))
}

fn row_to_status_change(row: StatusChangeRow) -> IssueRepositoryResult<StatusChange> {
    Ok(StatusChange::from_persisted(PersistedStatusChangeData {
        id: parse_id::<StatusChangeId>(&row.id)?,
        issue_id: parse_id::<IssueId>(&row.issue_id)?,
        old_status: IssueStatus::try_from(row.old_status.as_str())
            .map_err(IssueRepositoryError::persistence)?,
        new_status: IssueStatus::try_from(row.new_status.as_str())
            .map_err(IssueRepositoryError::persistence)?,
        changed_by: parse_actor(row.changed_by_id.as_deref(), row.changed_by_name)?,
        notes: row.notes,
        created_at: parse_timestamp(&row.created_at)?,
    }))
}

fn row_to_comment(row: CommentRow) -> IssueRepositoryResult<Comment> {
    let author = Actor::new(parse_id::<UserId>(&row.user_id)?, row.user_name)
        .map_err(IssueRepositoryError::persistence)?;
    Ok(Comment::from_persisted(
        parse_id::<CommentId>(&row.id)?,
        parse_id::<IssueId>(&row.issue_id)?,
        author,
        row.content,
        parse_timestamp(&row.created_at)?,
    ))
}

fn row_to_image(row: ImageRow) -> IssueRepositoryResult<IssueImage> {
    Ok(IssueImage::from_persisted(
        parse_id::<ImageId>(&row.id)?,
        parse_id::<IssueId>(&row.issue_id)?,
        row.filename,
        parse_timestamp(&row.created_at)?,
    ))
}

fn row_to_statistics(
    row: StatisticsRow,
    most_reported_location: Option<String>,
) -> IssueRepositoryResult<IssueStatistics> {
    let count = |value: i64| u64::try_from(value).map_err(IssueRepositoryError::persistence);
    Ok(IssueStatistics {
        total_issues: count(row.total_issues)?,
        open_issues: count(row.open_issues)?,
        fixed_issues: count(row.fixed_issues)?,
        average_fix_time: row.average_fix_time,
        most_reported_location,
        last_fix_date: row.last_fix_date.as_deref().map(parse_timestamp).transpose()?,
    })
}
