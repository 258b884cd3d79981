//! Android Build Engine
//!
//! Drives the Gradle wrapper of the SDK's Android project and assembles the
//! Android platform directory of an SDK distribution.

pub mod artifacts;
pub mod babel;
pub mod config;
pub mod gradle_build;
pub mod package;
pub mod pipeline;
pub mod runner;

pub use babel::{babel_options, babel_options_for, BabelOptions};
pub use config::{BuildTask, ConsoleMode};
pub use gradle_build::GradleProject;
pub use package::{read_v8_info, AndroidPackager, V8Info};
pub use pipeline::{PackagingStep, Pipeline};
pub use runner::{ProcessFailure, ProcessOutcome, ProcessRunner};

use std::path::PathBuf;

use droidpack_android_toolchain::ToolchainError;

/// Build errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
    #[error(transparent)]
    Process(#[from] ProcessFailure),
    #[error("Source path does not exist: {0:?}")]
    MissingSource(PathBuf),
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("{path:?} is not inside {root:?}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("Invalid manifest {path:?}: {reason}")]
    Manifest { path: PathBuf, reason: String },
    #[error("Unsupported V8 version {version:?}: {reason}")]
    V8Version { version: String, reason: String },
    #[error("Packaging step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<BuildError>,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Name of the packaging step that failed, if any
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            BuildError::Step { step, .. } => Some(step.as_str()),
            _ => None,
        }
    }

    /// Exit code to report when this error ends the process
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Process(ProcessFailure::Exit { code: Some(code), .. }) => *code,
            BuildError::Step { source, .. } => source.exit_code(),
            _ => 1,
        }
    }
}
