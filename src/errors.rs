//! Centralized error handling.
//!
//! Every variant names the operation that failed so a single diagnostic line
//! reads like a trace ("loading config", "applying migrations", "closing db").
//! Teardown failures are collected in an [`ErrorStack`] so that none of them
//! is lost when several happen in the same shutdown.

use std::fmt;
use std::path::PathBuf;

use sea_orm::DbErr;
use thiserror::Error;

/// Direction of a schema migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    Up,
    Down,
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationDirection::Up => f.write_str("up"),
            MigrationDirection::Down => f.write_str("down"),
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration
    #[error("reading config from {path:?}: {source}")]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    // Logging
    #[error("defining log level: unrecognized environment status {0:?}")]
    UnrecognizedEnvironment(String),

    #[error("installing logger: {0}")]
    LoggerInstall(#[source] tracing::dispatcher::SetGlobalDefaultError),

    #[error("during logger synchronization: {0}")]
    LoggerSync(#[source] std::io::Error),

    // Database
    #[error("opening and verifying a new conn: {0}")]
    Connection(#[source] DbErr),

    #[error("applying {direction} migrations: {source}")]
    Migration {
        direction: MigrationDirection,
        #[source]
        source: DbErr,
    },

    #[error("closing db: {0}")]
    Close(#[source] DbErr),

    #[error("executing query: {0}")]
    Query(#[source] DbErr),

    #[error("beginning transaction: {0}")]
    Transaction(#[source] DbErr),

    // Process
    #[error("waiting for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),

    // Aggregate
    #[error("{0}")]
    Multiple(ErrorStack),
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn migration(direction: MigrationDirection, source: DbErr) -> Self {
        AppError::Migration { direction, source }
    }

    /// Every underlying failure carried by this error, flattened.
    pub fn failures(&self) -> Vec<&AppError> {
        match self {
            AppError::Multiple(stack) => stack.iter().collect(),
            other => vec![other],
        }
    }
}

/// Ordered collection of failures from one lifecycle run.
///
/// Pushing an [`AppError::Multiple`] splices its members in place, so the
/// stack never nests and renders every message exactly once.
#[derive(Debug, Default)]
pub struct ErrorStack {
    errors: Vec<AppError>,
}

impl ErrorStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: AppError) {
        match error {
            AppError::Multiple(stack) => self.errors.extend(stack.errors),
            other => self.errors.push(other),
        }
    }

    /// Keep the value of `result`, or remember its error.
    pub fn record<T>(&mut self, result: AppResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppError> {
        self.errors.iter()
    }

    /// `Ok` when nothing failed, the sole error when one did, and
    /// [`AppError::Multiple`] otherwise.
    pub fn into_result(mut self) -> AppResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(AppError::Multiple(self)),
        }
    }
}

impl From<AppError> for ErrorStack {
    fn from(error: AppError) -> Self {
        let mut stack = Self::new();
        stack.push(error);
        stack
    }
}

impl fmt::Display for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorStack {}
