//! `local.properties` generation
//!
//! The Android Gradle plugin refuses to build unless the root project has a
//! `local.properties` file pointing at the SDK (and optionally the NDK). The
//! file is regenerated before every Gradle invocation and doubles as the
//! last-known-good toolchain configuration.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::detector::{ToolchainError, ToolchainPaths};

/// File name expected by the Android Gradle plugin
pub const FILE_NAME: &str = "local.properties";

/// First line of every generated file
pub const HEADER: &str = "# This file was generated by droidpack's build tools.";

const SDK_KEY: &str = "sdk.dir";
const NDK_KEY: &str = "ndk.dir";

/// Handle to the `local.properties` file of a Gradle root project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalProperties {
    path: PathBuf,
}

impl LocalProperties {
    /// The properties file inside a Gradle root project directory
    pub fn in_dir(gradle_root: impl AsRef<Path>) -> Self {
        Self {
            path: gradle_root.as_ref().join(FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a previously generated file is present
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Render file contents for the given toolchain
    pub fn render(paths: &ToolchainPaths) -> String {
        let mut lines = vec![
            HEADER.to_string(),
            format!("{}={}", SDK_KEY, escape(&paths.sdk_path)),
        ];
        if let Some(ref ndk) = paths.ndk_path {
            lines.push(format!("{}={}", NDK_KEY, escape(ndk)));
        }
        lines.join("\n") + "\n"
    }

    /// Overwrite the file with the given toolchain
    pub async fn write(&self, paths: &ToolchainPaths) -> Result<(), ToolchainError> {
        tokio::fs::write(&self.path, Self::render(paths))
            .await
            .map_err(|source| ToolchainError::Io {
                path: self.path.clone(),
                source,
            })?;
        info!("Wrote {:?}", self.path);
        Ok(())
    }

    /// Read back the toolchain recorded in an existing file
    pub async fn read(&self) -> Result<Option<ToolchainPaths>, ToolchainError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ToolchainError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!("Parsing {:?}", self.path);
        Ok(Self::parse(&contents))
    }

    /// Parse file contents. Returns `None` when no `sdk.dir` entry is present.
    pub fn parse(contents: &str) -> Option<ToolchainPaths> {
        let mut sdk_path = None;
        let mut ndk_path = None;

        for line in contents.lines() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = PathBuf::from(unescape(value.trim()));
            match key.trim() {
                SDK_KEY => sdk_path = Some(value),
                NDK_KEY => ndk_path = Some(value),
                _ => {}
            }
        }

        sdk_path.map(|sdk_path| ToolchainPaths { sdk_path, ndk_path })
    }
}

/// Backslashes are escape characters in properties files
fn escape(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
