//! Application configuration module
//!
//! Loads the YAML configuration file once at startup. The resulting
//! [`Config`] is an immutable value passed by reference to every component.

mod constants;
mod settings;

pub use constants::*;
pub use settings::{Config, Environment, EnvironmentConfig, LoggerConfig, PostgresConfig};
