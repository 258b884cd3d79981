//! Android Toolchain Discovery
//!
//! Locates the toolchain a Gradle build needs:
//! - Android SDK root
//! - Android NDK root, including side-by-side versioned installs
//! - `local.properties` generation for the Android Gradle plugin

pub mod detector;
pub mod env;
pub mod local_properties;
pub mod ndk;
pub mod version;

pub use detector::{
    Candidate, CandidateKind, CandidateList, ToolchainError, ToolchainPaths, ToolchainRequest,
    ToolchainResolution, ToolchainResolver,
};
pub use env::{EnvSnapshot, HostPlatform};
pub use local_properties::LocalProperties;
pub use version::{compare_tokens, compare_versions, version_delta};
