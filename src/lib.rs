//! Task tracker - service bootstrap
//!
//! Loads configuration, initializes structured logging, opens a migrated
//! database connection and tears all of it down again in reverse order.
//!
//! # Modules
//!
//! - **app**: Resource lifecycle (acquire in order, release in reverse)
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: YAML configuration and defaults
//! - **infra**: Database, migrations and logging
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Run the service until Ctrl-C
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod infra;

// Re-export commonly used types at crate root
pub use config::Config;
pub use errors::{AppError, AppResult, ErrorStack};
pub use infra::{Database, LoggerHandle};
