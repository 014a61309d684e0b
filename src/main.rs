//! Twinfix HTTP service binary.

use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultClock;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use twinfix::{
    config::load_config,
    database, http,
    issue::{adapters::sqlite::SqliteIssueRepository, services::IssueLifecycleService},
    telemetry,
    user::{adapters::sqlite::SqliteUserRepository, services::UserDirectoryService},
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = load_config().wrap_err("failed to load configuration")?;
    telemetry::init().wrap_err("failed to initialise tracing")?;

    let pool = database::connect(
        &config.database.url,
        config.database.pool_size,
        config.database.busy_timeout(),
    )
    .wrap_err("failed to open database")?;
    database::run_migrations(&pool).wrap_err("failed to migrate database")?;

    let clock = Arc::new(DefaultClock);
    let issues = IssueLifecycleService::new(
        Arc::new(SqliteIssueRepository::new(pool.clone())),
        Arc::clone(&clock),
    );
    let users = UserDirectoryService::new(Arc::new(SqliteUserRepository::new(pool)), clock);

    let listener = TcpListener::bind(config.server.bind)
        .await
        .wrap_err_with(|| format!("failed to bind {}", config.server.bind))?;
    http::serve(listener, http::router(issues, users)).await?;
    info!("server stopped");
    Ok(())
}
