//! Connection capabilities the migrated connection is built on.
//!
//! [`Connector`] and [`Backend`] are the seams between the lifecycle logic in
//! [`super::Database`] and SeaORM. Tests replace both with mocks.

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, ExecResult, QueryOrder, TransactionTrait,
};
use sea_orm_migration::{seaql_migrations, MigrationName, MigratorTrait};

use super::migrations::Migrator;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Opens live connections.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `uri` and verify the connection.
    async fn connect(&self, uri: &str) -> Result<Box<dyn Backend>, DbErr>;
}

/// A live connection plus the crate's migration set.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Apply every pending forward migration
    async fn migrate_up(&self) -> Result<(), DbErr>;

    /// Reverse `steps` applied migrations, or all of them when `None`
    async fn migrate_down(&self, steps: Option<u32>) -> Result<(), DbErr>;

    /// Every known migration with whether it is applied
    async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr>;

    /// Run a raw statement
    async fn execute(&self, sql: &str) -> Result<ExecResult, DbErr>;

    /// Start a transaction
    async fn begin(&self) -> Result<DatabaseTransaction, DbErr>;

    /// Release the underlying pool
    async fn close(&self) -> Result<(), DbErr>;
}

/// Connects through SeaORM's sqlx-postgres driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeaOrmConnector;

#[async_trait]
impl Connector for SeaOrmConnector {
    async fn connect(&self, uri: &str) -> Result<Box<dyn Backend>, DbErr> {
        let connection = SeaDatabase::connect(uri).await?;
        Ok(Box::new(SeaOrmBackend::new(connection)))
    }
}

/// SeaORM pool driven by [`Migrator`].
#[derive(Debug, Clone)]
pub struct SeaOrmBackend {
    connection: DatabaseConnection,
}

impl SeaOrmBackend {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl Backend for SeaOrmBackend {
    async fn migrate_up(&self) -> Result<(), DbErr> {
        Migrator::up(&self.connection, None).await
    }

    async fn migrate_down(&self, steps: Option<u32>) -> Result<(), DbErr> {
        Migrator::down(&self.connection, steps).await
    }

    async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        // Get applied migrations from database
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect())
    }

    async fn execute(&self, sql: &str) -> Result<ExecResult, DbErr> {
        self.connection.execute_unprepared(sql).await
    }

    async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.connection.begin().await
    }

    async fn close(&self) -> Result<(), DbErr> {
        // Clones share one pool, so closing a clone closes it for all.
        self.connection.clone().close().await
    }
}
