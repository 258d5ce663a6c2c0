//! Migrate command - Database migration management.

use std::path::Path;

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppResult, ErrorStack};
use crate::infra::{Database, SeaOrmConnector};

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config_path: &Path) -> AppResult<()> {
    let config = Config::load(config_path)?;
    tracing::info!("Running migration command...");

    // Connect without auto-running migrations for manual control
    let db = Database::connect_without_migrations(&config.postgres, &SeaOrmConnector).await?;

    let mut errors = ErrorStack::new();
    errors.record(apply(args.action, &db).await);
    errors.record(db.disconnect().await);
    errors.into_result()
}

async fn apply(action: MigrateAction, db: &Database) -> AppResult<()> {
    match action {
        MigrateAction::Up => {
            tracing::info!("Running pending migrations...");
            db.run_migrations().await?;
            tracing::info!("Migrations completed successfully");
        }
        MigrateAction::Down => {
            tracing::info!("Rolling back last migration...");
            db.rollback_migration().await?;
            tracing::info!("Rollback completed successfully");
        }
        MigrateAction::Status => {
            tracing::info!("Checking migration status...");
            for (name, applied) in db.migration_status().await? {
                let status_str = if applied { "applied" } else { "pending" };
                println!("{}: {}", name, status_str);
            }
        }
    }

    Ok(())
}
