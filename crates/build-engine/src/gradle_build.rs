//! Gradle Wrapper Invocation
//!
//! Every task run regenerates `local.properties` first, because the Android
//! Gradle plugin reads the SDK/NDK locations from it directly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use droidpack_android_toolchain::{
    HostPlatform, LocalProperties, ToolchainRequest, ToolchainResolution, ToolchainResolver,
};
use droidpack_core::BuildInfo;

use crate::config::{BuildTask, ConsoleMode};
use crate::runner::ProcessRunner;
use crate::BuildError;

pub const BUILD_VERSION_VAR: &str = "TI_SDK_BUILD_VERSION";
pub const BUILD_GIT_HASH_VAR: &str = "TI_SDK_BUILD_GIT_HASH";
pub const BUILD_TIMESTAMP_VAR: &str = "TI_SDK_BUILD_TIMESTAMP";
pub const VERSION_TAG_VAR: &str = "TI_SDK_VERSION_TAG";
/// Makes the build fail when no V8 startup snapshot can be generated
pub const REQUIRES_V8_SNAPSHOTS_VAR: &str = "TI_SDK_BUILD_REQUIRES_V8_SNAPSHOTS";

/// Gradle root project driven through its wrapper script
#[derive(Debug, Clone)]
pub struct GradleProject {
    root: PathBuf,
    resolver: ToolchainResolver,
    request: ToolchainRequest,
    console: ConsoleMode,
}

impl GradleProject {
    /// Create a project handle; the console mode is derived from the
    /// resolver's environment
    pub fn new(root: impl Into<PathBuf>, resolver: ToolchainResolver, request: ToolchainRequest) -> Self {
        let console = ConsoleMode::detect(resolver.env());
        Self {
            root: root.into(),
            resolver,
            request,
            console,
        }
    }

    /// Override the detected console mode
    pub fn with_console_mode(mut self, console: ConsoleMode) -> Self {
        self.console = console;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn console_mode(&self) -> ConsoleMode {
        self.console
    }

    /// `gradlew.bat` on Windows, `gradlew` elsewhere
    pub fn wrapper_path(&self) -> PathBuf {
        let wrapper_name = match self.resolver.platform() {
            HostPlatform::Windows => "gradlew.bat",
            HostPlatform::Unix => "gradlew",
        };
        self.root.join(wrapper_name)
    }

    pub fn local_properties(&self) -> LocalProperties {
        LocalProperties::in_dir(&self.root)
    }

    /// Build the invocation for a task.
    ///
    /// Without explicit arguments the console mode and full warning output
    /// are requested.
    pub fn task(&self, name: &str, args: Option<&[String]>, env: BTreeMap<String, String>) -> BuildTask {
        let task = BuildTask::new(name, &self.root).with_env(env);
        match args {
            Some(args) => task.with_args(args.iter().cloned()),
            None => task.with_args(["--console", self.console.as_str(), "--warning-mode", "all"]),
        }
    }

    /// Write `local.properties` without running Gradle
    pub async fn prepare_toolchain(&self) -> Result<ToolchainResolution, BuildError> {
        Ok(self.resolver.prepare(&self.request, &self.local_properties()).await?)
    }

    /// Prepare the toolchain, then run a Gradle task
    pub async fn run_task(
        &self,
        name: &str,
        args: Option<&[String]>,
        env: BTreeMap<String, String>,
    ) -> Result<(), BuildError> {
        self.prepare_toolchain().await?;
        let task = self.task(name, args, env);
        ProcessRunner::run(&self.wrapper_path(), &task).await?;
        Ok(())
    }

    /// Clean all Gradle subprojects
    pub async fn clean(&self) -> Result<(), BuildError> {
        info!("Cleaning Android projects...");
        self.run_task("clean", None, BTreeMap::new()).await
    }

    /// Assemble the release build of the library module only
    pub async fn assemble_release(&self, module: &str, info: &BuildInfo) -> Result<(), BuildError> {
        info!("Building {} library...", module);
        let env = self.release_environment(info);
        self.run_task(&format!(":{}:assembleRelease", module), None, env).await
    }

    /// Variables for `assembleRelease`, honoring a snapshot requirement the
    /// caller already defined
    pub fn release_environment(&self, info: &BuildInfo) -> BTreeMap<String, String> {
        build_environment(info, self.resolver.env().contains(REQUIRES_V8_SNAPSHOTS_VAR))
    }

    /// Publish the library module as a local maven repository
    pub async fn publish(&self, module: &str, info: &BuildInfo) -> Result<(), BuildError> {
        info!("Publishing {} library...", module);
        self.run_task(&format!(":{}:publish", module), None, publish_environment(info))
            .await
    }
}

/// Variables for a release build.
///
/// The V8 snapshot requirement is only set when the caller's environment does
/// not already define it.
pub fn build_environment(info: &BuildInfo, snapshot_var_defined: bool) -> BTreeMap<String, String> {
    let mut env = publish_environment(info);
    env.insert(BUILD_TIMESTAMP_VAR.to_string(), info.timestamp.clone());
    if !snapshot_var_defined {
        env.insert(REQUIRES_V8_SNAPSHOTS_VAR.to_string(), "1".to_string());
    }
    env
}

/// Variables for publishing the library
pub fn publish_environment(info: &BuildInfo) -> BTreeMap<String, String> {
    BTreeMap::from([
        (BUILD_VERSION_VAR.to_string(), info.version.clone()),
        (BUILD_GIT_HASH_VAR.to_string(), info.git_hash.clone()),
        (VERSION_TAG_VAR.to_string(), info.version_tag.clone()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidpack_android_toolchain::EnvSnapshot;

    fn project(platform: HostPlatform, env: EnvSnapshot) -> GradleProject {
        let resolver = ToolchainResolver::new(platform, env).with_install_locations(false);
        GradleProject::new("/work/android", resolver, ToolchainRequest::default())
    }

    fn info() -> BuildInfo {
        BuildInfo {
            version: "9.0.0".into(),
            version_tag: "9.0.0.v2020".into(),
            git_hash: "abc1234".into(),
            timestamp: "01/02/2020 03:04".into(),
        }
    }

    #[test]
    fn test_wrapper_path_per_platform() {
        let unix = project(HostPlatform::Unix, EnvSnapshot::default());
        let windows = project(HostPlatform::Windows, EnvSnapshot::default());
        assert_eq!(unix.wrapper_path(), Path::new("/work/android").join("gradlew"));
        assert_eq!(windows.wrapper_path(), Path::new("/work/android").join("gradlew.bat"));
    }

    #[test]
    fn test_default_arguments() {
        let gradle = project(HostPlatform::Unix, EnvSnapshot::default().with("CI", "1"));
        let task = gradle.task("clean", None, BTreeMap::new());
        assert_eq!(task.argv(), vec!["clean", "--console", "plain", "--warning-mode", "all"]);
        assert_eq!(task.working_directory, PathBuf::from("/work/android"));
    }

    #[test]
    fn test_explicit_arguments_replace_defaults() {
        let gradle = project(HostPlatform::Unix, EnvSnapshot::default());
        let args = vec!["--offline".to_string()];
        let task = gradle.task(":titanium:publish", Some(&args), BTreeMap::new());
        assert_eq!(task.argv(), vec![":titanium:publish", "--offline"]);
    }

    #[test]
    fn test_build_environment() {
        let env = build_environment(&info(), false);
        assert_eq!(env[BUILD_VERSION_VAR], "9.0.0");
        assert_eq!(env[BUILD_GIT_HASH_VAR], "abc1234");
        assert_eq!(env[BUILD_TIMESTAMP_VAR], "01/02/2020 03:04");
        assert_eq!(env[VERSION_TAG_VAR], "9.0.0.v2020");
        assert_eq!(env[REQUIRES_V8_SNAPSHOTS_VAR], "1");

        let inherited = build_environment(&info(), true);
        assert!(!inherited.contains_key(REQUIRES_V8_SNAPSHOTS_VAR));
    }

    #[cfg(unix)]
    #[test]
    fn test_release_environment_keeps_caller_snapshot_setting() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let env = EnvSnapshot::from_os_pairs([(
            OsString::from(REQUIRES_V8_SNAPSHOTS_VAR),
            OsString::from_vec(vec![0x80]),
        )]);
        let gradle = project(HostPlatform::Unix, env);
        assert!(!gradle.release_environment(&info()).contains_key(REQUIRES_V8_SNAPSHOTS_VAR));

        let gradle = project(HostPlatform::Unix, EnvSnapshot::default());
        assert_eq!(gradle.release_environment(&info())[REQUIRES_V8_SNAPSHOTS_VAR], "1");
    }

    #[test]
    fn test_publish_environment_has_no_timestamp() {
        let env = publish_environment(&info());
        assert_eq!(env.len(), 3);
        assert!(!env.contains_key(BUILD_TIMESTAMP_VAR));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_task_writes_properties_then_runs_wrapper() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("android");
        let sdk = dir.path().join("sdk");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&sdk).unwrap();

        let wrapper = root.join("gradlew");
        std::fs::write(
            &wrapper,
            "#!/bin/sh\ntest -f local.properties || exit 3\necho \"$@\" > invoked.txt\necho \"$TI_SDK_BUILD_VERSION\" >> invoked.txt\n",
        )
        .unwrap();
        std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755)).unwrap();

        let resolver = ToolchainResolver::new(HostPlatform::Unix, EnvSnapshot::default())
            .with_install_locations(false);
        let request = ToolchainRequest {
            sdk_path: Some(sdk),
            ndk_path: None,
        };
        let gradle = GradleProject::new(&root, resolver, request);

        gradle.publish("titanium", &info()).await.unwrap();

        let invoked = std::fs::read_to_string(root.join("invoked.txt")).unwrap();
        let mut lines = invoked.lines();
        assert_eq!(lines.next(), Some(":titanium:publish --console rich --warning-mode all"));
        assert_eq!(lines.next(), Some("9.0.0"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_task_propagates_exit_code() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let sdk = dir.path().join("sdk");
        std::fs::create_dir_all(&sdk).unwrap();
        let wrapper = dir.path().join("gradlew");
        std::fs::write(&wrapper, "#!/bin/sh\nexit 7\n").unwrap();
        std::fs::set_permissions(&wrapper, std::fs::Permissions::from_mode(0o755)).unwrap();

        let resolver = ToolchainResolver::new(HostPlatform::Unix, EnvSnapshot::default())
            .with_install_locations(false);
        let request = ToolchainRequest {
            sdk_path: Some(sdk),
            ndk_path: None,
        };
        let gradle = GradleProject::new(dir.path(), resolver, request);

        let err = gradle.clean().await.unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}
