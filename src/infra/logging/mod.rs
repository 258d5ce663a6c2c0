//! Structured JSON logging to a rotating file.
//!
//! The level and record shape are a pure function of the configured status:
//! `debug` logs everything with the verbose shape, `dev` and `prod` log from
//! INFO with the compact shape. Any other status is rejected. Records are
//! handed to a background writer thread, which owns the rotating file.

mod rotating;
mod stacktrace;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{dispatcher::Dispatch, Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::fmt::{
    self,
    format::{JsonFields, Writer},
    time::{ChronoLocal, ChronoUtc, FormatTime},
};

use crate::config::{Config, Environment};
use crate::errors::{AppError, AppResult};

pub use rotating::{RotatingLog, RotationPolicy};
pub use stacktrace::WithStacktrace;

/// Shape of each JSON record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Development shape: thread identity and the full span list
    Verbose,
    /// Production shape: event fields flattened into the record
    Compact,
}

impl Environment {
    pub fn log_level(self) -> Level {
        match self {
            Environment::Debug => Level::DEBUG,
            Environment::Dev | Environment::Prod => Level::INFO,
        }
    }

    pub fn log_format(self) -> LogFormat {
        match self {
            Environment::Debug => LogFormat::Verbose,
            Environment::Dev | Environment::Prod => LogFormat::Compact,
        }
    }
}

/// ISO-8601 record timestamps in UTC or local time.
#[derive(Debug, Clone)]
enum Clock {
    Utc(ChronoUtc),
    Local(ChronoLocal),
}

impl Clock {
    fn new(local_time: bool) -> Self {
        if local_time {
            Clock::Local(ChronoLocal::rfc_3339())
        } else {
            Clock::Utc(ChronoUtc::rfc_3339())
        }
    }
}

impl FormatTime for Clock {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        match self {
            Clock::Utc(clock) => clock.format_time(w),
            Clock::Local(clock) => clock.format_time(w),
        }
    }
}

/// Owns the subscriber and the writer thread behind it.
#[derive(Debug)]
pub struct LoggerHandle {
    level: Level,
    format: LogFormat,
    dispatch: Dispatch,
    guard: WorkerGuard,
    path: PathBuf,
}

impl LoggerHandle {
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Subscriber for scoped use via [`tracing::dispatcher::with_default`].
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Make this logger the process-wide default.
    pub fn install(&self) -> AppResult<()> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(AppError::LoggerInstall)
    }

    /// Drain queued records to disk and fsync the file. Consumes the handle
    /// so it runs once.
    pub fn sync(self) -> AppResult<()> {
        let Self { guard, path, .. } = self;

        // Blocks until the writer thread has flushed everything queued.
        drop(guard);

        fsync(&path).map_err(AppError::LoggerSync)
    }
}

fn fsync(path: &Path) -> io::Result<()> {
    match OpenOptions::new().append(true).open(path) {
        Ok(file) => file.sync_all(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Build the logger described by `config`.
///
/// The log file is not touched here; it is created on the first record.
pub fn init(config: &Config) -> AppResult<LoggerHandle> {
    let environment = config.environment()?;
    let level = environment.log_level();
    let format = environment.log_format();

    let file = RotatingLog::new(
        config.logger.filename.clone(),
        RotationPolicy::from(&config.logger),
    );
    let (writer, guard) = NonBlockingBuilder::default()
        .lossy(false)
        .thread_name("tasktracker-log")
        .finish(file);

    let subscriber = build_subscriber(level, format, Clock::new(config.logger.local_time), writer);

    Ok(LoggerHandle {
        level,
        format,
        dispatch: Dispatch::new(subscriber),
        guard,
        path: config.logger.filename.clone(),
    })
}

fn build_subscriber(
    level: Level,
    format: LogFormat,
    clock: Clock,
    writer: NonBlocking,
) -> Box<dyn Subscriber + Send + Sync> {
    let json = fmt::format()
        .json()
        .with_timer(clock)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let json = match format {
        LogFormat::Verbose => json
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_current_span(true)
            .with_span_list(true),
        LogFormat::Compact => json
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false),
    };

    Box::new(
        fmt::Subscriber::builder()
            .with_max_level(level)
            .with_writer(writer)
            .with_ansi(false)
            .fmt_fields(JsonFields::new())
            .event_format(WithStacktrace::new(json, Level::DEBUG))
            .finish(),
    )
}
