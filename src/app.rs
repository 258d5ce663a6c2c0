//! Resource lifecycle: acquire in order, release in reverse.
//!
//! [`run`] loads the configuration, builds the logger from it, opens the
//! migrated database connection and hands both to a [`Service`]. Whatever
//! happens afterwards, the connection is closed before the logger is synced,
//! and every failure along the way ends up in the returned error.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::{AppResult, ErrorStack};
use crate::infra::{logging, Database, LoggerHandle, SeaOrmConnector};

/// A logger that must be flushed exactly once at shutdown.
pub trait LogSink: Send {
    fn sync(self) -> AppResult<()>;
}

/// A connection that must be released exactly once at shutdown.
#[async_trait]
pub trait ManagedConnection: Send + Sync {
    async fn close(self) -> AppResult<()>;
}

/// Source of the three lifecycle resources.
#[async_trait]
pub trait Resources: Send + Sync {
    type Logger: LogSink;
    type Connection: ManagedConnection;

    fn load_config(&self) -> AppResult<Config>;

    fn init_logger(&self, config: &Config) -> AppResult<Self::Logger>;

    async fn open_connection(&self, config: &Config) -> AppResult<Self::Connection>;
}

/// Work performed while every resource is held.
#[async_trait]
pub trait Service<C: Sync>: Send {
    async fn run(self, config: &Config, connection: &C) -> AppResult<()>;
}

/// Acquire configuration, logger and connection, run `service`, then release
/// the connection and the logger in that order.
///
/// A resource that was acquired is released exactly once, even if a later
/// step or an earlier release failed.
pub async fn run<R, S>(resources: &R, service: S) -> AppResult<()>
where
    R: Resources,
    S: Service<R::Connection>,
{
    let config = resources.load_config()?;
    let logger = resources.init_logger(&config)?;

    let mut errors = ErrorStack::new();

    if let Some(connection) = errors.record(resources.open_connection(&config).await) {
        tracing::info!(status = %config.environment.status, "Resources acquired");

        errors.record(service.run(&config, &connection).await);
        errors.record(connection.close().await);
    }

    // Last chance for the failures to reach the log file.
    if !errors.is_empty() {
        tracing::error!(error = %errors, "Lifecycle finished with errors");
    }

    errors.record(logger.sync());
    errors.into_result()
}

impl LogSink for LoggerHandle {
    fn sync(self) -> AppResult<()> {
        LoggerHandle::sync(self)
    }
}

#[async_trait]
impl ManagedConnection for Database {
    async fn close(self) -> AppResult<()> {
        Database::close(self).await
    }
}

/// Production resources: YAML file, rotating JSON log, PostgreSQL.
#[derive(Debug, Clone)]
pub struct ServiceResources {
    config_path: PathBuf,
    connector: SeaOrmConnector,
}

impl ServiceResources {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            connector: SeaOrmConnector,
        }
    }
}

#[async_trait]
impl Resources for ServiceResources {
    type Logger = LoggerHandle;
    type Connection = Database;

    fn load_config(&self) -> AppResult<Config> {
        Config::load(&self.config_path)
    }

    fn init_logger(&self, config: &Config) -> AppResult<LoggerHandle> {
        let logger = logging::init(config)?;
        logger.install()?;
        tracing::debug!(path = %self.config_path.display(), "Configuration loaded");
        Ok(logger)
    }

    async fn open_connection(&self, config: &Config) -> AppResult<Database> {
        Database::open(&config.postgres, &self.connector).await
    }
}
