//! Toolchain Detection
//!
//! Resolves the Android SDK and NDK roots from, in priority order:
//! 1. Explicit paths given by the caller
//! 2. Vendor-specific environment variables
//! 3. Google's official environment variables
//! 4. Conventional install locations of the host OS
//!
//! A candidate is accepted as soon as it exists on disk; its contents are not
//! inspected.

use std::path::{Path, PathBuf};
use tracing::{info, debug, warn};

use droidpack_core::ToolchainOverrides;

use crate::env::{self, EnvSnapshot, HostPlatform};
use crate::local_properties::LocalProperties;
use crate::ndk;

/// Resolved toolchain locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainPaths {
    pub sdk_path: PathBuf,
    pub ndk_path: Option<PathBuf>,
}

/// Outcome of preparing the toolchain for a Gradle invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainResolution {
    /// Discovery succeeded and `local.properties` was rewritten
    Fresh(ToolchainPaths),
    /// Discovery failed; the previously generated file was left untouched
    Stale { properties_file: PathBuf },
}

/// Toolchain detection errors
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("Failed to find Android SDK directory path ({searched} locations checked)")]
    NotFound { searched: usize },
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How a candidate path is interpreted once it exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// The path itself is the toolchain root
    Direct,
    /// The path contains one directory per installed version
    SideBySide,
}

/// One entry of a prioritized search list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Where the path came from, for logging
    pub source: &'static str,
    pub path: Option<PathBuf>,
    pub kind: CandidateKind,
}

impl Candidate {
    pub fn direct(source: &'static str, path: Option<PathBuf>) -> Self {
        Self {
            source,
            path,
            kind: CandidateKind::Direct,
        }
    }
}

/// Ordered candidates; earlier entries take priority
pub type CandidateList = Vec<Candidate>;

/// Explicit and environment-provided SDK candidates
pub fn sdk_env_candidates(explicit: Option<&Path>, env: &EnvSnapshot) -> CandidateList {
    vec![
        Candidate::direct("explicit argument", explicit.map(Path::to_path_buf)),
        Candidate::direct(env::ANDROID_SDK, env.path(env::ANDROID_SDK)),
        Candidate::direct(env::ANDROID_HOME, env.path(env::ANDROID_HOME)),
        Candidate::direct(env::ANDROID_SDK_ROOT, env.path(env::ANDROID_SDK_ROOT)),
    ]
}

/// Conventional SDK install locations for a platform
pub fn sdk_install_locations(platform: HostPlatform, env: &EnvSnapshot) -> CandidateList {
    let mut candidates = Vec::new();

    match platform {
        HostPlatform::Windows => {
            // Android Studio's default install location
            if let Some(local) = env.get(env::LOCAL_APP_DATA) {
                candidates.push(Candidate::direct(
                    "Android Studio default",
                    Some(platform.join(local, &["Android", "Sdk"])),
                ));
            }
            for fixed in [r"C:\android-sdk", r"C:\android"] {
                candidates.push(Candidate::direct("fixed location", Some(PathBuf::from(fixed))));
            }
            for var in [env::PROGRAM_FILES, env::PROGRAM_FILES_X86] {
                if let Some(base) = env.get(var) {
                    candidates.push(Candidate::direct(var, Some(platform.join(base, &["android-sdk"]))));
                    candidates.push(Candidate::direct(var, Some(platform.join(base, &["android"]))));
                }
            }
        }
        HostPlatform::Unix => {
            if let Some(home) = env.get(env::HOME) {
                // Android Studio's default install locations on macOS, then Linux
                candidates.push(Candidate::direct(
                    "Android Studio default (macOS)",
                    Some(platform.join(home, &["Library", "Android", "sdk"])),
                ));
                candidates.push(Candidate::direct(
                    "Android Studio default (Linux)",
                    Some(platform.join(home, &["Android", "sdk"])),
                ));
            }
            for fixed in ["/opt/android", "/opt/android-sdk", "/usr/android", "/usr/android-sdk"] {
                candidates.push(Candidate::direct("fixed location", Some(PathBuf::from(fixed))));
            }
        }
    }

    candidates
}

/// Full SDK search list for a platform
pub fn sdk_candidates(platform: HostPlatform, explicit: Option<&Path>, env: &EnvSnapshot) -> CandidateList {
    let mut candidates = sdk_env_candidates(explicit, env);
    candidates.extend(sdk_install_locations(platform, env));
    candidates
}

/// NDK search list relative to a resolved SDK
pub fn ndk_candidates(explicit: Option<&Path>, env: &EnvSnapshot, sdk_path: &Path) -> CandidateList {
    vec![
        Candidate::direct("explicit argument", explicit.map(Path::to_path_buf)),
        Candidate::direct(env::ANDROID_NDK, env.path(env::ANDROID_NDK)),
        Candidate::direct(env::ANDROID_NDK_HOME, env.path(env::ANDROID_NDK_HOME)),
        Candidate {
            source: "side-by-side NDK directory",
            path: Some(sdk_path.join(ndk::SIDE_BY_SIDE_DIR)),
            kind: CandidateKind::SideBySide,
        },
        Candidate::direct("legacy NDK bundle", Some(sdk_path.join(ndk::LEGACY_BUNDLE_DIR))),
    ]
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// First candidate whose path exists, returned unmodified
pub async fn first_existing(candidates: &[Candidate]) -> Option<PathBuf> {
    for candidate in candidates {
        let Some(ref path) = candidate.path else {
            continue;
        };
        if exists(path).await {
            debug!("Using {:?} from {}", path, candidate.source);
            return Some(path.clone());
        }
        debug!("Skipping missing {:?} from {}", path, candidate.source);
    }
    None
}

/// Caller-supplied toolchain paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainRequest {
    pub sdk_path: Option<PathBuf>,
    pub ndk_path: Option<PathBuf>,
}

impl From<&ToolchainOverrides> for ToolchainRequest {
    fn from(overrides: &ToolchainOverrides) -> Self {
        Self {
            sdk_path: overrides.sdk_path.clone(),
            ndk_path: overrides.ndk_path.clone(),
        }
    }
}

/// Toolchain resolver
#[derive(Debug, Clone)]
pub struct ToolchainResolver {
    platform: HostPlatform,
    env: EnvSnapshot,
    install_locations: bool,
}

impl ToolchainResolver {
    /// Create a resolver for the given platform and environment
    pub fn new(platform: HostPlatform, env: EnvSnapshot) -> Self {
        Self {
            platform,
            env,
            install_locations: true,
        }
    }

    /// Resolver for the running host and its current environment
    pub fn from_environment() -> Self {
        Self::new(HostPlatform::current(), EnvSnapshot::capture())
    }

    /// Whether conventional install locations are searched (default: yes)
    pub fn with_install_locations(mut self, enabled: bool) -> Self {
        self.install_locations = enabled;
        self
    }

    pub fn platform(&self) -> HostPlatform {
        self.platform
    }

    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    /// SDK search list this resolver walks
    pub fn sdk_candidates(&self, explicit: Option<&Path>) -> CandidateList {
        if self.install_locations {
            sdk_candidates(self.platform, explicit, &self.env)
        } else {
            sdk_env_candidates(explicit, &self.env)
        }
    }

    /// Resolve the SDK root
    pub async fn resolve_sdk(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        first_existing(&self.sdk_candidates(explicit)).await
    }

    /// Resolve the NDK root. Finding no NDK is not an error.
    pub async fn resolve_ndk(&self, explicit: Option<&Path>, sdk_path: &Path) -> Result<Option<PathBuf>, ToolchainError> {
        for candidate in ndk_candidates(explicit, &self.env, sdk_path) {
            let Some(path) = candidate.path else {
                continue;
            };
            if !exists(&path).await {
                continue;
            }

            match candidate.kind {
                CandidateKind::Direct => {
                    debug!("Using NDK {:?} from {}", path, candidate.source);
                    return Ok(Some(path));
                }
                CandidateKind::SideBySide => {
                    let is_dir = tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false);
                    if !is_dir {
                        continue;
                    }
                    let newest = ndk::select_newest(&path)
                        .await
                        .map_err(|source| ToolchainError::Io { path: path.clone(), source })?;
                    if let Some(newest) = newest {
                        return Ok(Some(newest));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Resolve both roots. `None` when no SDK candidate exists.
    pub async fn resolve(&self, request: &ToolchainRequest) -> Result<Option<ToolchainPaths>, ToolchainError> {
        let Some(sdk_path) = self.resolve_sdk(request.sdk_path.as_deref()).await else {
            return Ok(None);
        };
        let ndk_path = self.resolve_ndk(request.ndk_path.as_deref(), &sdk_path).await?;
        Ok(Some(ToolchainPaths { sdk_path, ndk_path }))
    }

    /// Resolve the toolchain and record it in `local.properties`.
    ///
    /// When no SDK can be found but a previously generated file exists, that
    /// file is reused unchanged and a warning is logged.
    pub async fn prepare(
        &self,
        request: &ToolchainRequest,
        properties: &LocalProperties,
    ) -> Result<ToolchainResolution, ToolchainError> {
        match self.resolve(request).await? {
            Some(paths) => {
                info!("Android SDK: {:?}", paths.sdk_path);
                match paths.ndk_path {
                    Some(ref ndk) => info!("Android NDK: {:?}", ndk),
                    None => info!("Android NDK not found"),
                }
                properties.write(&paths).await?;
                Ok(ToolchainResolution::Fresh(paths))
            }
            None if properties.exists().await => {
                warn!(
                    "Failed to find Android SDK directory path. Will use last generated {:?} file.",
                    properties.path()
                );
                Ok(ToolchainResolution::Stale {
                    properties_file: properties.path().to_path_buf(),
                })
            }
            None => Err(ToolchainError::NotFound {
                searched: self
                    .sdk_candidates(request.sdk_path.as_deref())
                    .iter()
                    .filter(|c| c.path.is_some())
                    .count(),
            }),
        }
    }
}
