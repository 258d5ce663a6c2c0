//! Application-wide constants
//!
//! Centralized location for fixed paths and configuration defaults.

// =============================================================================
// Configuration Source
// =============================================================================

/// Default location of the YAML configuration file
pub const DEFAULT_CONFIG_PATH: &str = "tools/config.yaml";

// =============================================================================
// Environment
// =============================================================================

/// Verbose logging, development encoder
pub const STATUS_DEBUG: &str = "debug";

/// Development environment
pub const STATUS_DEV: &str = "dev";

/// Production environment
pub const STATUS_PROD: &str = "prod";

/// Status used when the file does not set one
pub const DEFAULT_STATUS: &str = STATUS_PROD;

// =============================================================================
// Database
// =============================================================================

pub const DEFAULT_DB_USER: &str = "postgres";

pub const DEFAULT_DB_PASSWORD: &str = "postgres";

pub const DEFAULT_DB_HOST: &str = "localhost";

pub const DEFAULT_DB_PORT: u16 = 5432;

pub const DEFAULT_DB_NAME: &str = "template1";

// =============================================================================
// Logging
// =============================================================================

/// Default log file location
pub const DEFAULT_LOG_FILE: &str = "logs/app.log";

/// Size in megabytes at which the log file is rotated
pub const DEFAULT_LOG_MAX_FILE_SIZE_MB: u64 = 128;

/// Number of rotated files to retain
pub const DEFAULT_LOG_MAX_BACKUPS: usize = 8;

/// Days to retain rotated files
pub const DEFAULT_LOG_MAX_AGE_DAYS: u32 = 28;

/// Bytes per megabyte (for rotation size calculation)
pub const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;
