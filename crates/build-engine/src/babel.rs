//! Transpiler options for the SDK's JavaScript
//!
//! The Babel target is the Chrome release matching the bundled V8, plus the
//! compile-time `Ti` globals substituted into the common JS sources.

use std::path::Path;
use regex::Regex;
use serde::Serialize;

use droidpack_core::BuildInfo;

use crate::package::{read_v8_info, V8Info};
use crate::BuildError;

const V8_VERSION_PATTERN: &str = r"(\d+)\.(\d+)\.\d+\.\d+";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BabelOptions {
    pub targets: BabelTargets,
    pub transform: TransformOptions,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BabelTargets {
    pub chrome: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransformOptions {
    pub platform: String,
    #[serde(rename = "Ti")]
    pub ti: TiGlobals,
}

/// Values inlined for `Ti.*` references
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TiGlobals {
    pub version: String,
    pub build_hash: String,
    pub build_date: String,
    #[serde(rename = "Platform")]
    pub platform: PlatformGlobals,
    #[serde(rename = "Filesystem")]
    pub filesystem: FilesystemGlobals,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlatformGlobals {
    pub osname: String,
    pub name: String,
    pub runtime: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemGlobals {
    pub line_ending: String,
    pub separator: String,
}

/// Chrome release shipping the given V8: major and minor digits joined,
/// so V8 `8.8.278.17` maps to Chrome `88`
pub fn chrome_target(v8_version: &str) -> Result<u32, BuildError> {
    let invalid = |reason: &str| BuildError::V8Version {
        version: v8_version.to_string(),
        reason: reason.to_string(),
    };

    let re = Regex::new(V8_VERSION_PATTERN).map_err(|e| invalid(&e.to_string()))?;
    let caps = re
        .captures(v8_version)
        .ok_or_else(|| invalid("expected major.minor.build.patch"))?;
    format!("{}{}", &caps[1], &caps[2])
        .parse()
        .map_err(|_| invalid("major.minor out of range"))
}

/// Options for the given build and V8 release
pub fn babel_options(info: &BuildInfo, v8: &V8Info) -> Result<BabelOptions, BuildError> {
    Ok(BabelOptions {
        targets: BabelTargets {
            chrome: chrome_target(&v8.version)?,
        },
        transform: TransformOptions {
            platform: "android".to_string(),
            ti: TiGlobals {
                version: info.version.clone(),
                build_hash: info.git_hash.clone(),
                build_date: info.timestamp.clone(),
                platform: PlatformGlobals {
                    osname: "android".to_string(),
                    name: "android".to_string(),
                    runtime: "v8".to_string(),
                },
                filesystem: FilesystemGlobals {
                    line_ending: "\n".to_string(),
                    separator: "/".to_string(),
                },
            },
        },
    })
}

/// Options for the V8 release recorded in `<android_dir>/package.json`
pub async fn babel_options_for(android_dir: &Path, info: &BuildInfo) -> Result<BabelOptions, BuildError> {
    let v8 = read_v8_info(android_dir).await?;
    babel_options(info, &v8)
}
