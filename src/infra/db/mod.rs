//! Database connection guarded by schema migration.
//!
//! A [`Database`] only exists once forward migrations have been applied, and
//! [`Database::close`] consumes it after reversing them, so `exec` and
//! `begin` are only reachable while the connection is ready.

use sea_orm::{DatabaseTransaction, ExecResult};

use crate::config::PostgresConfig;
use crate::errors::{AppError, AppResult, ErrorStack, MigrationDirection};

mod backend;
pub mod migrations;

pub use backend::{Backend, Connector, SeaOrmBackend, SeaOrmConnector};
pub use migrations::Migrator;

#[cfg(any(test, feature = "test-utils"))]
pub use backend::{MockBackend, MockConnector};

/// Migrated database connection
pub struct Database {
    backend: Box<dyn Backend>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Connect and apply every forward migration.
    ///
    /// If migrating fails the fresh connection is closed before the error is
    /// returned; when that close fails too, both failures are reported.
    pub async fn open(config: &PostgresConfig, connector: &dyn Connector) -> AppResult<Self> {
        let backend = connector
            .connect(&config.uri())
            .await
            .map_err(AppError::Connection)?;

        if let Err(source) = backend.migrate_up().await {
            let migration = AppError::migration(MigrationDirection::Up, source);
            let err = match backend.close().await {
                Ok(()) => migration,
                Err(close) => {
                    let mut errors = ErrorStack::from(migration);
                    errors.push(AppError::Close(close));
                    AppError::Multiple(errors)
                }
            };
            tracing::error!(error = %err, "Failed to apply migrations");
            return Err(err);
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            "Database connected and migrations applied"
        );

        Ok(Self { backend })
    }

    /// Connect without running migrations (for CLI commands).
    pub async fn connect_without_migrations(
        config: &PostgresConfig,
        connector: &dyn Connector,
    ) -> AppResult<Self> {
        let backend = connector
            .connect(&config.uri())
            .await
            .map_err(AppError::Connection)?;
        Ok(Self { backend })
    }

    /// Reverse every migration, then release the connection.
    ///
    /// The connection is released even when reversing fails; every failure
    /// is kept in the returned error.
    pub async fn close(self) -> AppResult<()> {
        let mut errors = ErrorStack::new();

        errors.record(
            self.backend
                .migrate_down(None)
                .await
                .map_err(|source| AppError::migration(MigrationDirection::Down, source)),
        );
        errors.record(self.backend.close().await.map_err(AppError::Close));

        if errors.is_empty() {
            tracing::info!("Migrations reversed and database closed");
        }
        errors.into_result()
    }

    /// Release the connection, leaving the schema as it is.
    pub async fn disconnect(self) -> AppResult<()> {
        self.backend.close().await.map_err(AppError::Close)
    }

    /// Execute a raw statement.
    pub async fn exec(&self, sql: &str) -> AppResult<ExecResult> {
        self.backend.execute(sql).await.map_err(AppError::Query)
    }

    /// Begin a transaction.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.backend.begin().await.map_err(AppError::Transaction)
    }

    /// Check database connectivity by executing a simple query.
    pub async fn ping(&self) -> AppResult<()> {
        self.exec("SELECT 1").await.map(|_| ())
    }

    /// Run pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        self.backend
            .migrate_up()
            .await
            .map_err(|source| AppError::migration(MigrationDirection::Up, source))
    }

    /// Rollback the last migration.
    pub async fn rollback_migration(&self) -> AppResult<()> {
        self.backend
            .migrate_down(Some(1))
            .await
            .map_err(|source| AppError::migration(MigrationDirection::Down, source))
    }

    /// Get migration status (list all migrations with applied status).
    pub async fn migration_status(&self) -> AppResult<Vec<(String, bool)>> {
        self.backend.migration_status().await.map_err(AppError::Query)
    }
}
