//! Environment Snapshot
//!
//! Captures the environment variables consulted during toolchain discovery
//! once, so that resolution never reads process-wide state directly and can be
//! driven from fixed values in tests.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::PathBuf;

/// Vendor-specific SDK variable
pub const ANDROID_SDK: &str = "ANDROID_SDK";
/// Google's deprecated SDK variable; outranks `ANDROID_SDK_ROOT`
pub const ANDROID_HOME: &str = "ANDROID_HOME";
/// Google's officially supported SDK variable
pub const ANDROID_SDK_ROOT: &str = "ANDROID_SDK_ROOT";
/// Vendor-specific NDK variable
pub const ANDROID_NDK: &str = "ANDROID_NDK";
/// Google's officially supported NDK variable
pub const ANDROID_NDK_HOME: &str = "ANDROID_NDK_HOME";

pub const HOME: &str = "HOME";
pub const LOCAL_APP_DATA: &str = "LOCALAPPDATA";
pub const PROGRAM_FILES: &str = "ProgramFiles";
pub const PROGRAM_FILES_X86: &str = "ProgramFiles(x86)";

/// Any of these being set means output goes to a CI log
pub const CI_VARIABLES: &[&str] = &["TRAVIS", "JENKINS", "CI"];

/// Operating system family used to build candidate paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    /// macOS and Linux
    Unix,
}

impl HostPlatform {
    /// The platform this binary runs on
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else {
            HostPlatform::Unix
        }
    }

    pub fn separator(&self) -> char {
        match self {
            HostPlatform::Windows => '\\',
            HostPlatform::Unix => '/',
        }
    }

    /// Join path components with this platform's separator.
    ///
    /// Unlike `Path::join`, the result does not depend on the host, so Windows
    /// candidate paths can be computed and compared on Unix.
    pub fn join(&self, base: &str, parts: &[&str]) -> PathBuf {
        let sep = self.separator();
        let mut joined = base.to_string();
        for part in parts {
            if !joined.is_empty() && !joined.ends_with(sep) {
                joined.push(sep);
            }
            joined.push_str(part);
        }
        PathBuf::from(joined)
    }
}

/// Immutable view of environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
    /// Every defined name, including those whose value is not Unicode
    defined: HashSet<String>,
    case_insensitive: bool,
}

impl EnvSnapshot {
    /// Capture the current process environment
    pub fn capture() -> Self {
        let mut env = Self::from_os_pairs(std::env::vars_os());
        env.case_insensitive = cfg!(windows);
        env
    }

    /// Build a snapshot from raw OS values.
    ///
    /// Variables whose value is not valid Unicode cannot be looked up but
    /// still count as defined for [`EnvSnapshot::contains`].
    pub fn from_os_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut env = Self::default();
        for (key, value) in pairs {
            let key = key.to_string_lossy().into_owned();
            env.defined.insert(key.clone());
            if let Ok(value) = value.into_string() {
                env.vars.insert(key, value);
            }
        }
        env
    }

    /// Build a snapshot from fixed values
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::default(), |env, (k, v)| env.with(k, v))
    }

    /// Add or replace a variable
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.defined.insert(key.clone());
        self.vars.insert(key, value.into());
        self
    }

    /// Look up a variable. Empty values are treated as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match self.vars.get(key) {
            Some(v) => Some(v),
            None if self.case_insensitive => self
                .vars
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v),
            None => None,
        };
        value.map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Look up a variable as a path
    pub fn path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    /// Whether the variable is defined at all, even if empty
    pub fn contains(&self, key: &str) -> bool {
        self.defined.contains(key)
            || (self.case_insensitive && self.defined.iter().any(|k| k.eq_ignore_ascii_case(key)))
    }

    /// Whether the variable is set to a non-empty value
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether any recognized CI signal is present
    pub fn is_ci(&self) -> bool {
        CI_VARIABLES.iter().any(|key| self.is_set(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_unset() {
        let env = EnvSnapshot::from_pairs([(ANDROID_HOME, ""), (ANDROID_SDK, "/sdk")]);
        assert_eq!(env.get(ANDROID_HOME), None);
        assert_eq!(env.path(ANDROID_SDK), Some(PathBuf::from("/sdk")));
        assert!(!env.is_set("MISSING"));
        assert!(env.contains(ANDROID_HOME));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_value_is_still_defined() {
        use std::os::unix::ffi::OsStringExt;

        let env = EnvSnapshot::from_os_pairs([
            (OsString::from("TI_SDK_BUILD_REQUIRES_V8_SNAPSHOTS"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from(ANDROID_SDK), OsString::from("/sdk")),
        ]);

        assert!(env.contains("TI_SDK_BUILD_REQUIRES_V8_SNAPSHOTS"));
        assert_eq!(env.get("TI_SDK_BUILD_REQUIRES_V8_SNAPSHOTS"), None);
        assert_eq!(env.get(ANDROID_SDK), Some("/sdk"));
        assert!(!env.contains("MISSING"));
    }

    #[test]
    fn test_ci_detection() {
        assert!(EnvSnapshot::default().with("JENKINS", "1").is_ci());
        assert!(EnvSnapshot::default().with("CI", "true").is_ci());
        assert!(!EnvSnapshot::default().with("CI", "").is_ci());
        assert!(!EnvSnapshot::default().is_ci());
    }

    #[test]
    fn test_platform_join() {
        assert_eq!(
            HostPlatform::Windows.join(r"C:\Users\dev\AppData\Local", &["Android", "Sdk"]),
            PathBuf::from(r"C:\Users\dev\AppData\Local\Android\Sdk")
        );
        assert_eq!(
            HostPlatform::Unix.join("/home/dev/", &["Android", "sdk"]),
            PathBuf::from("/home/dev/Android/sdk")
        );
    }
}
