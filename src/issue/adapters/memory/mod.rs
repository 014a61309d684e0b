//! In-memory repository for issue lifecycle tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::issue::{
    domain::{
        Comment, ImageId, Issue, IssueId, IssueImage, IssueStatistics, IssueType,
        PersistedIssueData, StatusChange,
    },
    ports::{IssueFilter, IssueRepository, IssueRepositoryError, IssueRepositoryResult},
};

/// Thread-safe in-memory issue repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIssueRepository {
    state: Arc<RwLock<InMemoryIssueState>>,
}

#[derive(Debug, Default)]
struct InMemoryIssueState {
    issues: HashMap<IssueId, Issue>,
    creation_order: Vec<IssueId>,
    history: HashMap<IssueId, Vec<StatusChange>>,
    comments: HashMap<IssueId, Vec<Comment>>,
    images: HashMap<IssueId, Vec<IssueImage>>,
    image_index: HashMap<ImageId, IssueId>,
}

impl InMemoryIssueState {
    fn ensure_exists(&self, id: IssueId) -> IssueRepositoryResult<()> {
        if self.issues.contains_key(&id) {
            Ok(())
        } else {
            Err(IssueRepositoryError::NotFound(id))
        }
    }

    fn insert_image(&mut self, image: &IssueImage) {
        self.image_index.insert(image.id(), image.issue_id());
        self.images
            .entry(image.issue_id())
            .or_default()
            .push(image.clone());
    }

    fn issues_in_creation_order(&self) -> impl Iterator<Item = &Issue> {
        self.creation_order
            .iter()
            .filter_map(|id| self.issues.get(id))
    }
}

impl InMemoryIssueRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> IssueRepositoryResult<RwLockReadGuard<'_, InMemoryIssueState>> {
        self.state.read().map_err(|err| {
            IssueRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> IssueRepositoryResult<RwLockWriteGuard<'_, InMemoryIssueState>> {
        self.state.write().map_err(|err| {
            IssueRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Combines the descriptive fields of `incoming` with the lifecycle state of
/// `stored`, so field edits never overwrite a concurrent transition.
fn merge_descriptive_fields(incoming: &Issue, stored: &Issue) -> Issue {
    Issue::from_persisted(PersistedIssueData {
        id: stored.id(),
        title: incoming.title().to_owned(),
        description: incoming.description().to_owned(),
        location: incoming.location().to_owned(),
        status: stored.status(),
        priority: incoming.priority(),
        issue_type: incoming.issue_type(),
        coordinates: incoming.coordinates(),
        pin: incoming.pin(),
        reported_by: stored.reported_by().clone(),
        estimated_cost: incoming.estimated_cost(),
        final_cost: incoming.final_cost(),
        fix: stored.fix().cloned(),
        created_at: stored.created_at(),
        updated_at: incoming.updated_at(),
    })
}

/// Combines the lifecycle state of `transitioned` with the descriptive fields
/// of `stored`, so a transition never reverts a concurrent field edit.
fn merge_lifecycle_fields(transitioned: &Issue, stored: &Issue) -> Issue {
    Issue::from_persisted(PersistedIssueData {
        id: stored.id(),
        title: stored.title().to_owned(),
        description: stored.description().to_owned(),
        location: stored.location().to_owned(),
        status: transitioned.status(),
        priority: stored.priority(),
        issue_type: stored.issue_type(),
        coordinates: stored.coordinates(),
        pin: stored.pin(),
        reported_by: stored.reported_by().clone(),
        estimated_cost: stored.estimated_cost(),
        final_cost: stored.final_cost(),
        fix: transitioned.fix().cloned(),
        created_at: stored.created_at(),
        updated_at: transitioned.updated_at(),
    })
}

/// Orders newest first; ties keep the later insertion first.
fn newest_first<T>(
    items: impl DoubleEndedIterator<Item = T>,
    key: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut ordered: Vec<T> = items.rev().collect();
    ordered.sort_by_key(|item| std::cmp::Reverse(key(item)));
    ordered
}

#[async_trait]
impl IssueRepository for InMemoryIssueRepository {
    async fn store(&self, issue: &Issue, images: &[IssueImage]) -> IssueRepositoryResult<()> {
        let mut state = self.write()?;
        if state.issues.contains_key(&issue.id()) {
            return Err(IssueRepositoryError::DuplicateIssue(issue.id()));
        }

        state.issues.insert(issue.id(), issue.clone());
        state.creation_order.push(issue.id());
        for image in images {
            state.insert_image(image);
        }
        Ok(())
    }

    async fn update(&self, issue: &Issue) -> IssueRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .issues
            .get(&issue.id())
            .ok_or(IssueRepositoryError::NotFound(issue.id()))?;
        let merged = merge_descriptive_fields(issue, stored);
        state.issues.insert(issue.id(), merged);
        Ok(())
    }

    async fn commit_transition(
        &self,
        issue: &Issue,
        change: &StatusChange,
    ) -> IssueRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .issues
            .get(&issue.id())
            .ok_or(IssueRepositoryError::NotFound(issue.id()))?;
        if stored.status() != change.old_status() {
            return Err(IssueRepositoryError::StaleStatus {
                issue_id: issue.id(),
                expected: change.old_status(),
            });
        }

        let merged = merge_lifecycle_fields(issue, stored);
        state.issues.insert(issue.id(), merged);
        state
            .history
            .entry(issue.id())
            .or_default()
            .push(change.clone());
        Ok(())
    }

    async fn delete(&self, id: IssueId) -> IssueRepositoryResult<bool> {
        let mut state = self.write()?;
        if state.issues.remove(&id).is_none() {
            return Ok(false);
        }
        state.creation_order.retain(|existing| *existing != id);
        state.history.remove(&id);
        state.comments.remove(&id);
        state.image_index.retain(|_, issue_id| *issue_id != id);
        state.images.remove(&id);
        Ok(true)
    }

    async fn find_by_id(&self, id: IssueId) -> IssueRepositoryResult<Option<Issue>> {
        let state = self.read()?;
        Ok(state.issues.get(&id).cloned())
    }

    async fn list(&self, filter: IssueFilter) -> IssueRepositoryResult<Vec<Issue>> {
        let state = self.read()?;
        let matching: Vec<Issue> = state
            .issues_in_creation_order()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect();
        Ok(newest_first(matching.into_iter(), Issue::created_at))
    }

    async fn find_with_coordinates(&self) -> IssueRepositoryResult<Vec<Issue>> {
        let state = self.read()?;
        Ok(state
            .issues_in_creation_order()
            .filter(|issue| issue.coordinates().is_some())
            .cloned()
            .collect())
    }

    async fn status_history(&self, id: IssueId) -> IssueRepositoryResult<Vec<StatusChange>> {
        let state = self.read()?;
        let records = state.history.get(&id).cloned().unwrap_or_default();
        Ok(newest_first(records.into_iter(), StatusChange::created_at))
    }

    async fn store_comment(&self, comment: &Comment) -> IssueRepositoryResult<()> {
        let mut state = self.write()?;
        state.ensure_exists(comment.issue_id())?;
        state
            .comments
            .entry(comment.issue_id())
            .or_default()
            .push(comment.clone());
        Ok(())
    }

    async fn comments(&self, id: IssueId) -> IssueRepositoryResult<Vec<Comment>> {
        let state = self.read()?;
        Ok(state.comments.get(&id).cloned().unwrap_or_default())
    }

    async fn store_image(&self, image: &IssueImage) -> IssueRepositoryResult<()> {
        let mut state = self.write()?;
        state.ensure_exists(image.issue_id())?;
        state.insert_image(image);
        Ok(())
    }

    async fn images(&self, id: IssueId) -> IssueRepositoryResult<Vec<IssueImage>> {
        let state = self.read()?;
        Ok(state.images.get(&id).cloned().unwrap_or_default())
    }

    async fn find_image(&self, id: ImageId) -> IssueRepositoryResult<Option<IssueImage>> {
        let state = self.read()?;
        let image = state
            .image_index
            .get(&id)
            .and_then(|issue_id| state.images.get(issue_id))
            .and_then(|images| images.iter().find(|image| image.id() == id))
            .cloned();
        Ok(image)
    }

    async fn statistics(
        &self,
        issue_type: Option<IssueType>,
    ) -> IssueRepositoryResult<IssueStatistics> {
        let state = self.read()?;
        let filter = IssueFilter {
            status: None,
            issue_type,
        };
        Ok(IssueStatistics::from_issues(
            state
                .issues_in_creation_order()
                .filter(|issue| filter.matches(issue)),
        ))
    }
}
