//! Project Configuration
//!
//! Settings read from `droidpack.toml`:
//! - Project layout (Gradle root, dist directory, module names)
//! - Toolchain overrides (explicit SDK/NDK paths)
//! - Build identity (version, tag, git hash, timestamp)

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{info, debug};

use crate::error::{ConfigError, Result};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "droidpack.toml";

/// Where the Android sources and build outputs live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectLayout {
    /// Gradle root project (contains `gradlew` and `local.properties`)
    pub android_dir: PathBuf,
    /// Distribution directory; platform outputs live under `<dist_dir>/android`
    pub dist_dir: PathBuf,
    /// Gradle subproject producing the SDK library
    pub library_module: String,
    /// Gradle subproject producing the annotation processor jar
    pub annotation_processor_module: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            android_dir: PathBuf::from("android"),
            dist_dir: PathBuf::from("dist"),
            library_module: "titanium".to_string(),
            annotation_processor_module: "kroll-apt".to_string(),
        }
    }
}

impl ProjectLayout {
    /// Platform-specific distribution directory
    pub fn dist_android_dir(&self) -> PathBuf {
        self.dist_dir.join("android")
    }

    /// Build outputs directory of the library module
    pub fn library_outputs_dir(&self) -> PathBuf {
        self.android_dir
            .join(&self.library_module)
            .join("build")
            .join("outputs")
    }

    /// Make relative paths absolute against `base`
    pub fn rebase(&mut self, base: &Path) {
        if self.android_dir.is_relative() {
            self.android_dir = base.join(&self.android_dir);
        }
        if self.dist_dir.is_relative() {
            self.dist_dir = base.join(&self.dist_dir);
        }
    }
}

/// Explicit toolchain locations (highest-priority candidates)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolchainOverrides {
    pub sdk_path: Option<PathBuf>,
    pub ndk_path: Option<PathBuf>,
}

/// Identity of the SDK being built, injected into the build tool's environment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildInfo {
    /// SDK version, e.g. `9.0.0`
    pub version: String,
    /// Version of the package folder/zip, e.g. `9.0.0.v20200101`
    pub version_tag: String,
    /// Source-control revision of the SDK sources
    pub git_hash: String,
    /// Build date value exposed to the runtime
    pub timestamp: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: "0.0.0".to_string(),
            version_tag: "0.0.0".to_string(),
            git_hash: "unknown".to_string(),
            timestamp: default_timestamp(),
        }
    }
}

/// Current time in the build-date format the runtime expects
pub fn default_timestamp() -> String {
    chrono::Local::now().format("%m/%d/%Y %H:%M").to_string()
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DroidpackConfig {
    pub project: ProjectLayout,
    pub toolchain: ToolchainOverrides,
    pub build: BuildInfo,
}

impl DroidpackConfig {
    /// Parse configuration text; relative project paths resolve against `base`
    pub fn from_toml_str(contents: &str, path: &Path, base: &Path) -> Result<Self> {
        let mut config: DroidpackConfig = toml::from_str(contents).map_err(|source| {
            ConfigError::TomlParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        config.project.rebase(base);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults when it is absent
    pub async fn load(path: &Path) -> Result<Self> {
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base = std::path::absolute(&base).map_err(|source| ConfigError::Io {
            path: base.clone(),
            source,
        })?;

        let exists = tokio::fs::try_exists(path).await.map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if exists {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            Self::from_toml_str(&contents, path, &base)
        } else {
            info!("Config file {:?} not found, using defaults", path);
            let mut config = DroidpackConfig::default();
            config.project.rebase(&base);
            Ok(config)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.project.library_module.trim().is_empty() {
            return Err(ConfigError::Invalid("project.library_module must not be empty".into()));
        }
        if self.project.annotation_processor_module.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "project.annotation_processor_module must not be empty".into(),
            ));
        }
        Ok(())
    }
}
