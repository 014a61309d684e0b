//! HTTP interface for the tracker.
//!
//! All routes live under `/api` and exchange camelCase JSON. Failures are
//! reported as `{"error": message}` with 400, 404, 409 or 500 status codes.

mod error;
pub mod issues;
pub mod users;

pub use error::{ApiError, ApiResult};

use crate::issue::{ports::IssueRepository, services::IssueLifecycleService};
use crate::user::{ports::UserRepository, services::UserDirectoryService};
use axum::Router;
use mockable::Clock;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Builds the application router.
#[must_use]
pub fn router<R, U, C>(
    issues: IssueLifecycleService<R, C>,
    users: UserDirectoryService<U, C>,
) -> Router
where
    R: IssueRepository + 'static,
    U: UserRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let api = issues::routes(issues).merge(users::routes(users));
    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

/// Serves `app` on `listener` until Ctrl-C is received.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!(%address, "listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
