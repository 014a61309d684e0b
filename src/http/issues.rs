//! Issue routes: CRUD, status transitions, history, proximity, statistics
//! and attachments.

use super::error::{ApiError, ApiResult};
use crate::issue::{
    domain::{
        Actor, Comment, CommentId, FloorplanPin, GeoPoint, ImageId, Issue, IssueId, IssueImage,
        IssuePatch, IssuePriority, IssueStatistics, IssueStatus, IssueType, StatusChange,
        StatusChangeId,
    },
    ports::{IssueFilter, IssueRepository},
    services::{
        CreateIssueRequest, IssueLifecycleService, MarkFixedRequest, TransitionIssueRequest,
    },
};
use crate::user::domain::UserId;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Deserializer, Serialize};

/// Builds the issue routes over `service`.
#[must_use]
pub fn routes<R, C>(service: IssueLifecycleService<R, C>) -> Router
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/issues", get(list_issues::<R, C>).post(create_issue::<R, C>))
        .route("/issues/nearby", get(nearby_issues::<R, C>))
        .route(
            "/issues/{id}",
            get(get_issue::<R, C>)
                .patch(update_issue::<R, C>)
                .delete(delete_issue::<R, C>),
        )
        .route("/issues/{id}/status", patch(transition_issue::<R, C>))
        .route("/issues/{id}/fix", post(fix_issue::<R, C>))
        .route("/issues/{id}/status-history", get(status_history::<R, C>))
        .route(
            "/issues/{id}/comments",
            get(list_comments::<R, C>).post(add_comment::<R, C>),
        )
        .route(
            "/issues/{id}/images",
            get(list_images::<R, C>).post(add_image::<R, C>),
        )
        .route("/images/{id}", get(get_image::<R, C>))
        .route("/statistics", get(statistics::<R, C>))
        .with_state(service)
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_issue_id(raw: &str) -> ApiResult<IssueId> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("invalid issue id: {raw}")))
}

fn parse_status(raw: &str) -> ApiResult<IssueStatus> {
    IssueStatus::try_from(raw).map_err(ApiError::validation)
}

fn parse_issue_type(raw: Option<&str>) -> ApiResult<Option<IssueType>> {
    raw.map(IssueType::try_from)
        .transpose()
        .map_err(ApiError::validation)
}

fn parse_priority(raw: Option<&str>) -> ApiResult<Option<IssuePriority>> {
    raw.map(IssuePriority::try_from)
        .transpose()
        .map_err(ApiError::validation)
}

/// JSON representation of an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueView {
    /// Issue identifier.
    pub id: IssueId,
    /// Short summary.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Free-text location.
    pub location: String,
    /// Current status.
    pub status: IssueStatus,
    /// Urgency.
    pub priority: IssuePriority,
    /// Category.
    pub issue_type: IssueType,
    /// Map latitude.
    pub latitude: Option<f64>,
    /// Map longitude.
    pub longitude: Option<f64>,
    /// Floorplan pin x offset.
    pub pin_x: Option<f64>,
    /// Floorplan pin y offset.
    pub pin_y: Option<f64>,
    /// Whether the pin is on the interior floorplan.
    pub is_interior_pin: bool,
    /// Reporting user.
    pub reported_by_id: UserId,
    /// Reporting user's display name.
    pub reported_by_name: String,
    /// Estimated repair cost.
    pub estimated_cost: f64,
    /// Final repair cost.
    pub final_cost: Option<f64>,
    /// User who last fixed the issue.
    pub fixed_by_id: Option<UserId>,
    /// Display name of the user who last fixed the issue.
    pub fixed_by_name: Option<String>,
    /// Latest fix timestamp.
    pub fixed_at: Option<DateTime<Utc>>,
    /// Whole minutes from creation to the latest fix.
    pub time_to_fix: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Issue> for IssueView {
    fn from(issue: &Issue) -> Self {
        let coordinates = issue.coordinates();
        let pin = issue.pin();
        Self {
            id: issue.id(),
            title: issue.title().to_owned(),
            description: issue.description().to_owned(),
            location: issue.location().to_owned(),
            status: issue.status(),
            priority: issue.priority(),
            issue_type: issue.issue_type(),
            latitude: coordinates.map(GeoPoint::latitude),
            longitude: coordinates.map(GeoPoint::longitude),
            pin_x: pin.map(|value| value.x),
            pin_y: pin.map(|value| value.y),
            is_interior_pin: pin.is_some_and(|value| value.is_interior),
            reported_by_id: issue.reported_by().id(),
            reported_by_name: issue.reported_by().name().to_owned(),
            estimated_cost: issue.estimated_cost(),
            final_cost: issue.final_cost(),
            fixed_by_id: issue.fixed_by().map(Actor::id),
            fixed_by_name: issue.fixed_by().map(|actor| actor.name().to_owned()),
            fixed_at: issue.fixed_at(),
            time_to_fix: issue.time_to_fix_minutes(),
            created_at: issue.created_at(),
            updated_at: issue.updated_at(),
        }
    }
}

fn views(issues: &[Issue]) -> Vec<IssueView> {
    issues.iter().map(IssueView::from).collect()
}

/// JSON representation of a status history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeView {
    /// Record identifier.
    pub id: StatusChangeId,
    /// Owning issue.
    pub issue_id: IssueId,
    /// Status before the transition.
    pub old_status: IssueStatus,
    /// Status after the transition.
    pub new_status: IssueStatus,
    /// Acting user.
    pub changed_by_id: Option<UserId>,
    /// Acting user's display name.
    pub changed_by_name: Option<String>,
    /// Free-text note.
    pub notes: Option<String>,
    /// Transition timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&StatusChange> for StatusChangeView {
    fn from(change: &StatusChange) -> Self {
        Self {
            id: change.id(),
            issue_id: change.issue_id(),
            old_status: change.old_status(),
            new_status: change.new_status(),
            changed_by_id: change.changed_by().map(Actor::id),
            changed_by_name: change.changed_by().map(|actor| actor.name().to_owned()),
            notes: change.notes().map(str::to_owned),
            created_at: change.created_at(),
        }
    }
}

/// JSON representation of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    /// Comment identifier.
    pub id: CommentId,
    /// Commented issue.
    pub issue_id: IssueId,
    /// Author.
    pub user_id: UserId,
    /// Author's display name.
    pub user_name: String,
    /// Comment body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id(),
            issue_id: comment.issue_id(),
            user_id: comment.author().id(),
            user_name: comment.author().name().to_owned(),
            content: comment.content().to_owned(),
            created_at: comment.created_at(),
        }
    }
}

/// JSON representation of an image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageView {
    /// Image identifier.
    pub id: ImageId,
    /// Owning issue.
    pub issue_id: IssueId,
    /// Stored file name.
    pub filename: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&IssueImage> for ImageView {
    fn from(image: &IssueImage) -> Self {
        Self {
            id: image.id(),
            issue_id: image.issue_id(),
            filename: image.filename().to_owned(),
            created_at: image.created_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIssueBody {
    title: String,
    description: String,
    location: String,
    reported_by_id: UserId,
    reported_by_name: String,
    status: Option<String>,
    priority: Option<String>,
    issue_type: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    pin_x: Option<f64>,
    pin_y: Option<f64>,
    is_interior_pin: Option<bool>,
    estimated_cost: Option<f64>,
    #[serde(default)]
    images: Vec<String>,
}

impl CreateIssueBody {
    fn into_request(self) -> ApiResult<CreateIssueRequest> {
        let reporter =
            Actor::new(self.reported_by_id, self.reported_by_name).map_err(ApiError::validation)?;
        let mut request = CreateIssueRequest::new(self.title, self.description, self.location, reporter)
            .with_images(self.images);
        if let Some(status) = self.status.as_deref() {
            request = request.with_status(parse_status(status)?);
        }
        if let Some(priority) = parse_priority(self.priority.as_deref())? {
            request = request.with_priority(priority);
        }
        if let Some(issue_type) = parse_issue_type(self.issue_type.as_deref())? {
            request = request.with_issue_type(issue_type);
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                request = request.with_coordinates(latitude, longitude);
            }
            (None, None) => {}
            _ => return Err(coordinates_pair_error()),
        }
        match (self.pin_x, self.pin_y) {
            (Some(x), Some(y)) => {
                request = request.with_pin(FloorplanPin {
                    x,
                    y,
                    is_interior: self.is_interior_pin.unwrap_or(false),
                });
            }
            (None, None) => {}
            _ => return Err(pin_pair_error()),
        }
        if let Some(cost) = self.estimated_cost {
            request = request.with_estimated_cost(cost);
        }
        Ok(request)
    }
}

fn coordinates_pair_error() -> ApiError {
    ApiError::Validation("latitude and longitude must be given together".to_owned())
}

fn pin_pair_error() -> ApiError {
    ApiError::Validation("pinX and pinY must be given together".to_owned())
}

/// Partial update body. Keys outside the descriptive fields, including
/// `status`, are rejected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PatchIssueBody {
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    priority: Option<String>,
    issue_type: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    longitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pin_x: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pin_y: Option<Option<f64>>,
    is_interior_pin: Option<bool>,
    estimated_cost: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    final_cost: Option<Option<f64>>,
}

impl PatchIssueBody {
    fn into_patch(self) -> ApiResult<IssuePatch> {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(Some(latitude)), Some(Some(longitude))) => Some(Some(
                GeoPoint::new(latitude, longitude).map_err(ApiError::validation)?,
            )),
            (Some(None), Some(None)) => Some(None),
            (None, None) => None,
            _ => return Err(coordinates_pair_error()),
        };
        let pin = match (self.pin_x, self.pin_y) {
            (Some(Some(x)), Some(Some(y))) => Some(Some(FloorplanPin {
                x,
                y,
                is_interior: self.is_interior_pin.unwrap_or(false),
            })),
            (Some(None), Some(None)) => Some(None),
            (None, None) if self.is_interior_pin.is_none() => None,
            _ => return Err(pin_pair_error()),
        };

        Ok(IssuePatch {
            title: self.title,
            description: self.description,
            location: self.location,
            priority: parse_priority(self.priority.as_deref())?,
            issue_type: parse_issue_type(self.issue_type.as_deref())?,
            coordinates,
            pin,
            estimated_cost: self.estimated_cost,
            final_cost: self.final_cost,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransitionBody {
    status: Option<String>,
    changed_by_id: Option<UserId>,
    changed_by_name: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixBody {
    fixed_by_id: Option<UserId>,
    fixed_by_name: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody {
    user_id: UserId,
    user_name: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageBody {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    #[serde(rename = "type")]
    issue_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyQuery {
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StatisticsQuery {
    #[serde(rename = "type")]
    issue_type: Option<String>,
}

async fn list_issues<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<IssueView>>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Query(query) = params?;
    let filter = IssueFilter {
        status: query.status.as_deref().map(parse_status).transpose()?,
        issue_type: parse_issue_type(query.issue_type.as_deref())?,
    };
    let issues = service.list(filter).await?;
    Ok(Json(views(&issues)))
}

async fn create_issue<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    payload: Result<Json<CreateIssueBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IssueView>)>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Json(body) = payload?;
    let issue = service.create(body.into_request()?).await?;
    Ok((StatusCode::CREATED, Json(IssueView::from(&issue))))
}

async fn get_issue<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<IssueView>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let issue = service.get(parse_issue_id(&id)?).await?;
    Ok(Json(IssueView::from(&issue)))
}

async fn update_issue<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
    payload: Result<Json<PatchIssueBody>, JsonRejection>,
) -> ApiResult<Json<IssueView>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let issue_id = parse_issue_id(&id)?;
    let Json(body) = payload?;
    let issue = service.update(issue_id, body.into_patch()?).await?;
    Ok(Json(IssueView::from(&issue)))
}

async fn delete_issue<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    service.delete(parse_issue_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn transition_issue<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
    payload: Result<Json<TransitionBody>, JsonRejection>,
) -> ApiResult<Json<IssueView>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let issue_id = parse_issue_id(&id)?;
    let Json(body) = payload?;
    let status = body
        .status
        .ok_or_else(|| ApiError::Validation("status is required".to_owned()))?;
    let actor = Actor::from_optional_parts(body.changed_by_id, body.changed_by_name)
        .map_err(ApiError::validation)?;
    let request = TransitionIssueRequest::new(issue_id, status)
        .with_optional_actor(actor)
        .with_optional_notes(body.notes);
    let issue = service.transition(request).await?;
    Ok(Json(IssueView::from(&issue)))
}

async fn fix_issue<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
    payload: Result<Json<FixBody>, JsonRejection>,
) -> ApiResult<Json<IssueView>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let issue_id = parse_issue_id(&id)?;
    let Json(body) = payload?;
    let request = MarkFixedRequest::new(issue_id, body.fixed_by_id, body.fixed_by_name, body.notes);
    let issue = service.mark_fixed(request).await?;
    Ok(Json(IssueView::from(&issue)))
}

async fn status_history<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<StatusChangeView>>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let history = service.history(parse_issue_id(&id)?).await?;
    Ok(Json(history.iter().map(StatusChangeView::from).collect()))
}

async fn nearby_issues<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    params: Result<Query<NearbyQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<IssueView>>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Query(query) = params?;
    let (Some(latitude), Some(longitude)) = (query.lat, query.lng) else {
        return Err(ApiError::Validation("lat and lng are required".to_owned()));
    };
    let issues = service.nearby(latitude, longitude, query.radius).await?;
    Ok(Json(views(&issues)))
}

async fn statistics<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    params: Result<Query<StatisticsQuery>, QueryRejection>,
) -> ApiResult<Json<IssueStatistics>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Query(query) = params?;
    let issue_type = parse_issue_type(query.issue_type.as_deref())?;
    Ok(Json(service.statistics(issue_type).await?))
}

async fn list_comments<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<CommentView>>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let comments = service.comments(parse_issue_id(&id)?).await?;
    Ok(Json(comments.iter().map(CommentView::from).collect()))
}

async fn add_comment<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommentView>)>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let issue_id = parse_issue_id(&id)?;
    let Json(body) = payload?;
    let author = Actor::new(body.user_id, body.user_name).map_err(ApiError::validation)?;
    let comment = service.add_comment(issue_id, author, body.content).await?;
    Ok((StatusCode::CREATED, Json(CommentView::from(&comment))))
}

async fn list_images<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ImageView>>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let images = service.images(parse_issue_id(&id)?).await?;
    Ok(Json(images.iter().map(ImageView::from).collect()))
}

async fn add_image<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
    payload: Result<Json<ImageBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ImageView>)>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let issue_id = parse_issue_id(&id)?;
    let Json(body) = payload?;
    let image = service.add_image(issue_id, body.filename).await?;
    Ok((StatusCode::CREATED, Json(ImageView::from(&image))))
}

async fn get_image<R, C>(
    State(service): State<IssueLifecycleService<R, C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImageView>>
where
    R: IssueRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let image_id: ImageId = id
        .parse()
        .map_err(|_| ApiError::Validation(format!("invalid image id: {id}")))?;
    let image = service.image(image_id).await?;
    Ok(Json(ImageView::from(&image)))
}
