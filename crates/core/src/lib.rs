//! droidpack Core - shared configuration and types
//!
//! This crate holds the project configuration consumed by the toolchain
//! resolver, the build engine and the command-line driver.

pub mod config;
pub mod error;

pub use config::{BuildInfo, DroidpackConfig, ProjectLayout, ToolchainOverrides, CONFIG_FILE_NAME};
pub use error::{ConfigError, Result};

/// droidpack version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "droidpack";
