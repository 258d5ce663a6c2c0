//! Lifecycle ordering and error aggregation tests.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::DbErr;
use tempfile::TempDir;

use tasktracker::app::{self, LogSink, ManagedConnection, Resources, Service, ServiceResources};
use tasktracker::commands::serve::UntilShutdown;
use tasktracker::errors::{AppError, AppResult};
use tasktracker::Config;

/// Shared call log for every test double
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<&'static str>>>);

impl Recorder {
    fn push(&self, call: &'static str) {
        self.0.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

/// Which steps of the test lifecycle should fail
#[derive(Clone, Copy, Default)]
struct Failures {
    config: bool,
    logger: bool,
    open: bool,
    service: bool,
    close: bool,
    sync: bool,
}

struct TestLogger {
    recorder: Recorder,
    fail: bool,
}

impl LogSink for TestLogger {
    fn sync(self) -> AppResult<()> {
        self.recorder.push("logger-sync");
        if self.fail {
            return Err(AppError::LoggerSync(io::Error::new(
                io::ErrorKind::Other,
                "disk full",
            )));
        }
        Ok(())
    }
}

struct TestConnection {
    recorder: Recorder,
    fail: bool,
}

#[async_trait]
impl ManagedConnection for TestConnection {
    async fn close(self) -> AppResult<()> {
        self.recorder.push("connection-close");
        if self.fail {
            return Err(AppError::Close(DbErr::Custom("pool gone".to_string())));
        }
        Ok(())
    }
}

struct TestResources {
    recorder: Recorder,
    failures: Failures,
}

impl TestResources {
    fn new(failures: Failures) -> Self {
        Self {
            recorder: Recorder::default(),
            failures,
        }
    }
}

#[async_trait]
impl Resources for TestResources {
    type Logger = TestLogger;
    type Connection = TestConnection;

    fn load_config(&self) -> AppResult<Config> {
        self.recorder.push("config");
        if self.failures.config {
            return Err(AppError::ConfigLoad {
                path: "tools/config.yaml".into(),
                source: config::ConfigError::NotFound("tools/config.yaml".to_string()),
            });
        }
        Ok(Config::default())
    }

    fn init_logger(&self, _config: &Config) -> AppResult<TestLogger> {
        self.recorder.push("logger");
        if self.failures.logger {
            return Err(AppError::UnrecognizedEnvironment("qa".to_string()));
        }
        Ok(TestLogger {
            recorder: self.recorder.clone(),
            fail: self.failures.sync,
        })
    }

    async fn open_connection(&self, _config: &Config) -> AppResult<TestConnection> {
        self.recorder.push("connection");
        if self.failures.open {
            return Err(AppError::Connection(DbErr::Custom(
                "connection refused".to_string(),
            )));
        }
        Ok(TestConnection {
            recorder: self.recorder.clone(),
            fail: self.failures.close,
        })
    }
}

struct TestService {
    recorder: Recorder,
    fail: bool,
}

#[async_trait]
impl Service<TestConnection> for TestService {
    async fn run(self, _config: &Config, _connection: &TestConnection) -> AppResult<()> {
        self.recorder.push("service");
        if self.fail {
            return Err(AppError::Query(DbErr::Custom("service failed".to_string())));
        }
        Ok(())
    }
}

async fn run_with(failures: Failures) -> (AppResult<()>, Vec<&'static str>) {
    let resources = TestResources::new(failures);
    let service = TestService {
        recorder: resources.recorder.clone(),
        fail: failures.service,
    };

    let result = app::run(&resources, service).await;
    (result, resources.recorder.calls())
}

#[tokio::test]
async fn test_releases_in_reverse_acquisition_order() {
    let (result, calls) = run_with(Failures::default()).await;

    assert!(result.is_ok());
    assert_eq!(
        calls,
        vec![
            "config",
            "logger",
            "connection",
            "service",
            "connection-close",
            "logger-sync",
        ]
    );
}

#[tokio::test]
async fn test_config_failure_acquires_nothing() {
    let (result, calls) = run_with(Failures {
        config: true,
        ..Default::default()
    })
    .await;

    assert!(matches!(result, Err(AppError::ConfigLoad { .. })));
    assert_eq!(calls, vec!["config"]);
}

#[tokio::test]
async fn test_logger_failure_releases_nothing() {
    let (result, calls) = run_with(Failures {
        logger: true,
        ..Default::default()
    })
    .await;

    assert!(matches!(result, Err(AppError::UnrecognizedEnvironment(_))));
    assert_eq!(calls, vec!["config", "logger"]);
}

#[tokio::test]
async fn test_open_failure_still_syncs_logger() {
    let (result, calls) = run_with(Failures {
        open: true,
        ..Default::default()
    })
    .await;

    assert!(matches!(result, Err(AppError::Connection(_))));
    assert_eq!(calls, vec!["config", "logger", "connection", "logger-sync"]);
}

#[tokio::test]
async fn test_open_and_sync_failures_are_both_reported() {
    let (result, _) = run_with(Failures {
        open: true,
        sync: true,
        ..Default::default()
    })
    .await;

    let err = result.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("connection refused"));
    assert!(text.contains("disk full"));
    assert_eq!(err.failures().len(), 2);
}

#[tokio::test]
async fn test_close_failure_becomes_the_result() {
    let (result, calls) = run_with(Failures {
        close: true,
        ..Default::default()
    })
    .await;

    assert!(matches!(result, Err(AppError::Close(_))));
    assert_eq!(calls.last(), Some(&"logger-sync"));
}

#[tokio::test]
async fn test_every_failure_is_kept_in_order() {
    let (result, calls) = run_with(Failures {
        service: true,
        close: true,
        sync: true,
        ..Default::default()
    })
    .await;

    assert_eq!(
        calls,
        vec![
            "config",
            "logger",
            "connection",
            "service",
            "connection-close",
            "logger-sync",
        ]
    );

    let err = result.unwrap_err();
    let failures = err.failures();
    assert_eq!(failures.len(), 3);
    assert!(matches!(failures[0], AppError::Query(_)));
    assert!(matches!(failures[1], AppError::Close(_)));
    assert!(matches!(failures[2], AppError::LoggerSync(_)));

    let text = err.to_string();
    assert!(text.contains("service failed"));
    assert!(text.contains("pool gone"));
    assert!(text.contains("disk full"));
}

#[tokio::test]
async fn test_service_resources_report_missing_config() {
    let dir = TempDir::new().unwrap();
    let resources = ServiceResources::new(dir.path().join("config.yaml"));

    let err = app::run(&resources, UntilShutdown).await.unwrap_err();

    assert!(matches!(err, AppError::ConfigLoad { .. }));
    assert!(err.to_string().contains("config.yaml"));
}

#[tokio::test]
async fn test_service_resources_reject_unknown_status() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    let log_path = dir.path().join("logs").join("app.log");
    std::fs::write(
        &config_path,
        format!("status: qa\nfilename: {}\n", log_path.display()),
    )
    .unwrap();

    let err = app::run(&ServiceResources::new(&config_path), UntilShutdown)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnrecognizedEnvironment(ref s) if s == "qa"));
    assert!(!log_path.exists());
}
