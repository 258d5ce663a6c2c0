//! Serve command - run the service lifecycle until interrupted.

use std::path::Path;

use async_trait::async_trait;

use crate::app::{self, Service, ServiceResources};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

/// Holds the resources until the process receives Ctrl-C.
#[derive(Debug, Default, Clone, Copy)]
pub struct UntilShutdown;

#[async_trait]
impl Service<Database> for UntilShutdown {
    async fn run(self, config: &Config, db: &Database) -> AppResult<()> {
        db.ping().await?;
        tracing::info!(database = %config.postgres.name, "Service ready");

        tokio::signal::ctrl_c().await.map_err(AppError::Signal)?;
        tracing::info!("Shutdown signal received");
        Ok(())
    }
}

/// Execute the serve command
pub async fn execute(config_path: &Path) -> AppResult<()> {
    app::run(&ServiceResources::new(config_path), UntilShutdown).await
}
