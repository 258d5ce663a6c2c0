//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Run the service lifecycle until interrupted
//! - `migrate` - Database migrations

pub mod args;

pub use args::{Cli, Commands, MigrateAction, MigrateArgs};
