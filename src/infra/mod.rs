//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connection, migrations and their lifecycle
//! - Structured logging to a rotating file

pub mod db;
pub mod logging;

pub use db::{Backend, Connector, Database, Migrator, SeaOrmBackend, SeaOrmConnector};
pub use logging::{LogFormat, LoggerHandle};

#[cfg(any(test, feature = "test-utils"))]
pub use db::{MockBackend, MockConnector};
