//! Service layer for reporting issues, moving them through their lifecycle
//! and querying history, proximity and statistics.

use crate::issue::{
    domain::{
        Actor, Comment, FloorplanPin, GeoPoint, ImageId, Issue, IssueDomainError, IssueId,
        IssueImage, IssuePatch, IssuePriority, IssueStatistics, IssueStatus, IssueType,
        NewIssue, SearchRadius, StatusChange,
    },
    ports::{IssueFilter, IssueRepository, IssueRepositoryError},
};
use crate::user::domain::UserId;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Number of optimistic attempts made for one transition before giving up.
pub const MAX_TRANSITION_ATTEMPTS: u32 = 3;

/// Request payload for reporting a new issue.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIssueRequest {
    title: String,
    description: String,
    location: String,
    reported_by: Actor,
    status: IssueStatus,
    priority: IssuePriority,
    issue_type: IssueType,
    coordinates: Option<(f64, f64)>,
    pin: Option<FloorplanPin>,
    estimated_cost: f64,
    images: Vec<String>,
}

impl CreateIssueRequest {
    /// Creates a request with the required fields and default status,
    /// priority and category.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        reported_by: Actor,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            location: location.into(),
            reported_by,
            status: IssueStatus::default(),
            priority: IssuePriority::default(),
            issue_type: IssueType::default(),
            coordinates: None,
            pin: None,
            estimated_cost: 0.0,
            images: Vec::new(),
        }
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: IssueStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: IssuePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the category.
    #[must_use]
    pub const fn with_issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = issue_type;
        self
    }

    /// Sets map coordinates, validated when the issue is created.
    #[must_use]
    pub const fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some((latitude, longitude));
        self
    }

    /// Sets the floorplan pin.
    #[must_use]
    pub const fn with_pin(mut self, pin: FloorplanPin) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Sets the estimated cost.
    #[must_use]
    pub const fn with_estimated_cost(mut self, estimated_cost: f64) -> Self {
        self.estimated_cost = estimated_cost;
        self
    }

    /// Sets image file names recorded together with the issue.
    #[must_use]
    pub fn with_images(mut self, images: impl IntoIterator<Item = String>) -> Self {
        self.images = images.into_iter().collect();
        self
    }
}

/// Request payload for a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionIssueRequest {
    issue_id: IssueId,
    status: String,
    actor: Option<Actor>,
    notes: Option<String>,
}

impl TransitionIssueRequest {
    /// Creates a transition request; `status` is parsed when it is applied.
    #[must_use]
    pub fn new(issue_id: IssueId, status: impl Into<String>) -> Self {
        Self {
            issue_id,
            status: status.into(),
            actor: None,
            notes: None,
        }
    }

    /// Sets the acting user.
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Sets an optional acting user.
    #[must_use]
    pub fn with_optional_actor(mut self, actor: Option<Actor>) -> Self {
        self.actor = actor;
        self
    }

    /// Sets the note recorded with the transition.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets an optional note.
    #[must_use]
    pub fn with_optional_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Request payload for marking an issue fixed.
///
/// Both actor parts are optional here so that a missing actor is reported
/// as a validation error rather than a deserialisation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkFixedRequest {
    issue_id: IssueId,
    fixed_by_id: Option<UserId>,
    fixed_by_name: Option<String>,
    notes: Option<String>,
}

impl MarkFixedRequest {
    /// Creates a request from its raw parts.
    #[must_use]
    pub const fn new(
        issue_id: IssueId,
        fixed_by_id: Option<UserId>,
        fixed_by_name: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            issue_id,
            fixed_by_id,
            fixed_by_name,
            notes,
        }
    }

    /// Creates a request for a known actor.
    #[must_use]
    pub fn by(issue_id: IssueId, actor: &Actor) -> Self {
        Self::new(issue_id, Some(actor.id()), Some(actor.name().to_owned()), None)
    }

    /// Sets the note recorded with the transition.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn actor(&self) -> Result<Actor, IssueDomainError> {
        match (self.fixed_by_id, self.fixed_by_name.as_deref()) {
            (Some(id), Some(name)) if !name.trim().is_empty() => Actor::new(id, name),
            _ => Err(IssueDomainError::MissingFixActor(self.issue_id)),
        }
    }
}

/// Service-level errors for issue lifecycle operations.
#[derive(Debug, Error)]
pub enum IssueLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] IssueDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] IssueRepositoryError),
    /// The issue does not exist.
    #[error("issue not found: {0}")]
    NotFound(IssueId),
    /// The image does not exist.
    #[error("image not found: {0}")]
    ImageNotFound(ImageId),
    /// Concurrent transitions kept invalidating this one.
    #[error("issue {0} was changed concurrently; retry the transition")]
    Conflict(IssueId),
}

impl IssueLifecycleError {
    fn from_repository(err: IssueRepositoryError) -> Self {
        match err {
            IssueRepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for issue lifecycle service operations.
pub type IssueLifecycleResult<T> = Result<T, IssueLifecycleError>;

/// Issue lifecycle orchestration service.
pub struct IssueLifecycleService<R, C>
where
    R: IssueRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for IssueLifecycleService<R, C>
where
    R: IssueRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> IssueLifecycleService<R, C>
where
    R: IssueRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new issue lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Reports a new issue and records its initial images.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Domain`] when input validation fails or
    /// [`IssueLifecycleError::Repository`] when persistence fails.
    #[instrument(skip_all, fields(location = %request.location))]
    pub async fn create(&self, request: CreateIssueRequest) -> IssueLifecycleResult<Issue> {
        let coordinates = request
            .coordinates
            .map(|(latitude, longitude)| GeoPoint::new(latitude, longitude))
            .transpose()?;
        let issue = Issue::report(
            NewIssue {
                title: request.title,
                description: request.description,
                location: request.location,
                reported_by: request.reported_by,
                status: request.status,
                priority: request.priority,
                issue_type: request.issue_type,
                coordinates,
                pin: request.pin,
                estimated_cost: request.estimated_cost,
            },
            &*self.clock,
        )?;
        let images = request
            .images
            .into_iter()
            .map(|filename| IssueImage::new(issue.id(), filename, &*self.clock))
            .collect::<Result<Vec<_>, _>>()?;

        self.repository.store(&issue, &images).await?;
        info!(issue_id = %issue.id(), status = %issue.status(), "issue reported");
        Ok(issue)
    }

    /// Retrieves an issue.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::NotFound`] when the issue does not exist.
    pub async fn get(&self, id: IssueId) -> IssueLifecycleResult<Issue> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(IssueLifecycleError::NotFound(id))
    }

    /// Lists issues matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Repository`] when the lookup fails.
    pub async fn list(&self, filter: IssueFilter) -> IssueLifecycleResult<Vec<Issue>> {
        Ok(self.repository.list(filter).await?)
    }

    /// Applies a typed partial update to an issue's descriptive fields.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::NotFound`] when the issue does not exist
    /// or [`IssueLifecycleError::Domain`] when the patch is invalid.
    #[instrument(skip(self, patch), fields(issue_id = %id))]
    pub async fn update(&self, id: IssueId, patch: IssuePatch) -> IssueLifecycleResult<Issue> {
        let mut issue = self.get(id).await?;
        issue.apply_patch(patch, &*self.clock)?;
        self.repository
            .update(&issue)
            .await
            .map_err(IssueLifecycleError::from_repository)?;
        debug!("issue fields updated");
        self.get(id).await
    }

    /// Deletes an issue together with its history, comments and images.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::NotFound`] when the issue does not exist.
    #[instrument(skip(self), fields(issue_id = %id))]
    pub async fn delete(&self, id: IssueId) -> IssueLifecycleResult<()> {
        if !self.repository.delete(id).await? {
            return Err(IssueLifecycleError::NotFound(id));
        }
        info!("issue deleted");
        Ok(())
    }

    /// Moves an issue to a new status and records the transition.
    ///
    /// Requesting the current status is a no-op that returns the issue
    /// unchanged. A transition that loses a race with a concurrent one is
    /// re-evaluated against the fresh state, up to
    /// [`MAX_TRANSITION_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Domain`] for an unknown status,
    /// [`IssueLifecycleError::NotFound`] when the issue does not exist, or
    /// [`IssueLifecycleError::Conflict`] when every attempt lost a race.
    #[instrument(skip_all, fields(issue_id = %request.issue_id, status = %request.status))]
    pub async fn transition(&self, request: TransitionIssueRequest) -> IssueLifecycleResult<Issue> {
        let new_status = IssueStatus::try_from(request.status.as_str())?;
        self.apply_transition(request.issue_id, new_status, request.actor, request.notes)
            .await
    }

    /// Marks an issue fixed on behalf of `request`'s actor.
    ///
    /// The actor is validated before the repository is touched.
    ///
    /// # Errors
    ///
    /// Returns [`IssueDomainError::MissingFixActor`] (wrapped in
    /// [`IssueLifecycleError::Domain`]) when the actor id or name is missing,
    /// otherwise the same errors as [`Self::transition`].
    #[instrument(skip_all, fields(issue_id = %request.issue_id))]
    pub async fn mark_fixed(&self, request: MarkFixedRequest) -> IssueLifecycleResult<Issue> {
        let actor = request.actor()?;
        self.apply_transition(request.issue_id, IssueStatus::Fixed, Some(actor), request.notes)
            .await
    }

    async fn apply_transition(
        &self,
        issue_id: IssueId,
        new_status: IssueStatus,
        actor: Option<Actor>,
        notes: Option<String>,
    ) -> IssueLifecycleResult<Issue> {
        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let mut issue = self.get(issue_id).await?;
            let Some(change) =
                issue.transition_to(new_status, actor.clone(), notes.clone(), &*self.clock)
            else {
                debug!("status unchanged; no history recorded");
                return Ok(issue);
            };

            match self.repository.commit_transition(&issue, &change).await {
                Ok(()) => {
                    log_transition(&change);
                    return self.get(issue_id).await;
                }
                Err(IssueRepositoryError::StaleStatus { expected, .. }) => {
                    warn!(attempt, %expected, "status changed concurrently; retrying");
                }
                Err(err) => return Err(IssueLifecycleError::from_repository(err)),
            }
        }
        Err(IssueLifecycleError::Conflict(issue_id))
    }

    /// Returns the status history of an issue, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::NotFound`] when the issue does not exist.
    pub async fn history(&self, id: IssueId) -> IssueLifecycleResult<Vec<StatusChange>> {
        self.get(id).await?;
        Ok(self.repository.status_history(id).await?)
    }

    /// Returns issues within `radius_km` of a point, in creation order.
    ///
    /// `None` applies [`SearchRadius::DEFAULT_KM`].
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Domain`] for invalid coordinates or a
    /// negative or non-finite radius.
    pub async fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: Option<f64>,
    ) -> IssueLifecycleResult<Vec<Issue>> {
        let area = SearchRadius::new(
            GeoPoint::new(latitude, longitude)?,
            radius_km.unwrap_or(SearchRadius::DEFAULT_KM),
        )?;
        let candidates = self.repository.find_with_coordinates().await?;
        Ok(candidates
            .into_iter()
            .filter(|issue| issue.coordinates().is_some_and(|point| area.contains(point)))
            .collect())
    }

    /// Aggregates issue statistics, optionally for one category.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Repository`] when aggregation fails.
    pub async fn statistics(
        &self,
        issue_type: Option<IssueType>,
    ) -> IssueLifecycleResult<IssueStatistics> {
        Ok(self.repository.statistics(issue_type).await?)
    }

    /// Adds a comment to an issue.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Domain`] for blank content or
    /// [`IssueLifecycleError::NotFound`] when the issue does not exist.
    pub async fn add_comment(
        &self,
        issue_id: IssueId,
        author: Actor,
        content: impl Into<String> + Send,
    ) -> IssueLifecycleResult<Comment> {
        let comment = Comment::new(issue_id, author, content, &*self.clock)?;
        self.repository
            .store_comment(&comment)
            .await
            .map_err(IssueLifecycleError::from_repository)?;
        debug!(%issue_id, comment_id = %comment.id(), "comment added");
        Ok(comment)
    }

    /// Returns the comments of an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::NotFound`] when the issue does not exist.
    pub async fn comments(&self, issue_id: IssueId) -> IssueLifecycleResult<Vec<Comment>> {
        self.get(issue_id).await?;
        Ok(self.repository.comments(issue_id).await?)
    }

    /// Records an uploaded image against an issue.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Domain`] for a blank file name or
    /// [`IssueLifecycleError::NotFound`] when the issue does not exist.
    pub async fn add_image(
        &self,
        issue_id: IssueId,
        filename: impl Into<String> + Send,
    ) -> IssueLifecycleResult<IssueImage> {
        let image = IssueImage::new(issue_id, filename, &*self.clock)?;
        self.repository
            .store_image(&image)
            .await
            .map_err(IssueLifecycleError::from_repository)?;
        debug!(%issue_id, image_id = %image.id(), "image recorded");
        Ok(image)
    }

    /// Returns the images of an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::NotFound`] when the issue does not exist.
    pub async fn images(&self, issue_id: IssueId) -> IssueLifecycleResult<Vec<IssueImage>> {
        self.get(issue_id).await?;
        Ok(self.repository.images(issue_id).await?)
    }

    /// Looks up a single image.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::ImageNotFound`] when it does not exist.
    pub async fn image(&self, id: ImageId) -> IssueLifecycleResult<IssueImage> {
        self.repository
            .find_image(id)
            .await?
            .ok_or(IssueLifecycleError::ImageNotFound(id))
    }
}

fn log_transition(change: &StatusChange) {
    info!(
        old_status = %change.old_status(),
        new_status = %change.new_status(),
        changed_by = change.changed_by().map(Actor::name),
        "issue status changed"
    );
}
