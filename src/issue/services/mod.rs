//! Application services for issue lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    CreateIssueRequest, IssueLifecycleError, IssueLifecycleResult, IssueLifecycleService,
    MAX_TRANSITION_ATTEMPTS, MarkFixedRequest, TransitionIssueRequest,
};
