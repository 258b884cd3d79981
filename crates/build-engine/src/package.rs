//! Android platform packaging
//!
//! Assembles `<sdk-zip-dir>/android` from the Gradle build outputs:
//!
//! ```text
//! android/
//! ├── m2repository/        maven tree of the published library
//! ├── package.json         version-stamped platform manifest
//! ├── titanium.bindings.json
//! ├── cli/  templates/     copied verbatim
//! ├── templates/gradle/    the wrapper used to build the SDK itself
//! ├── native/include/      merged C/C++ headers (runtime, generated, V8)
//! ├── native/libs/         *.so files per ABI
//! └── kroll-apt.jar        annotation processor
//! ```

use std::path::{Path, PathBuf};
use serde::Deserialize;
use tracing::info;

use droidpack_core::{BuildInfo, ProjectLayout};

use crate::artifacts::{self, directories_and_extension};
use crate::gradle_build::GradleProject;
use crate::pipeline::Pipeline;
use crate::BuildError;

const PACKAGE_MANIFEST: &str = "package.json";
const VERSION_PLACEHOLDER: &str = "__VERSION__";
const BINDINGS_FILE: &str = "titanium.bindings.json";
const HEADER_PATTERN: &str = "**/*.h";
const NATIVE_LIBRARY_EXTENSION: &str = ".so";

/// V8 build the runtime links against, from the `v8` object of `package.json`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct V8Info {
    pub version: String,
    pub mode: String,
}

#[derive(Deserialize)]
struct PlatformManifest {
    v8: V8Info,
}

/// Read the V8 version and build mode from the Android `package.json`
pub async fn read_v8_info(android_dir: &Path) -> Result<V8Info, BuildError> {
    let path = android_dir.join(PACKAGE_MANIFEST);
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| BuildError::io(&path, e))?;
    let manifest: PlatformManifest = serde_json::from_str(&contents).map_err(|e| BuildError::Manifest {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    Ok(manifest.v8)
}

/// Packages the Android platform of an SDK distribution
pub struct AndroidPackager {
    layout: ProjectLayout,
    info: BuildInfo,
    gradle: GradleProject,
}

impl AndroidPackager {
    pub fn new(layout: ProjectLayout, info: BuildInfo, gradle: GradleProject) -> Self {
        Self { layout, info, gradle }
    }

    /// Platform directory inside the SDK zip staging directory
    pub fn destination(zip_sdk_dir: &Path) -> PathBuf {
        zip_sdk_dir.join("android")
    }

    /// The ordered packaging steps for a staging directory
    pub fn plan(&self, zip_sdk_dir: &Path) -> Pipeline<'_> {
        let dest = Self::destination(zip_sdk_dir);
        let android = self.layout.android_dir.clone();
        let dist = self.layout.dist_android_dir();
        let outputs = self.layout.library_outputs_dir();

        Pipeline::new("Packaging Android platform")
            .step("create-destination", {
                let dest = dest.clone();
                move || async move { artifacts::ensure_dir(&dest).await }
            })
            .step("publish-library", move || async move {
                self.gradle.publish(&self.layout.library_module, &self.info).await
            })
            .step("copy-maven-repository", {
                let (outputs, dest) = (outputs.clone(), dest.clone());
                move || async move { artifacts::copy_entry(&outputs, &dest, "m2repository").await }
            })
            .step("copy-package-manifest", {
                let (android, dest) = (android.clone(), dest.clone());
                move || async move {
                    let substitutions = [(VERSION_PLACEHOLDER, self.info.version.as_str())];
                    artifacts::copy_and_substitute(&android, &dest, PACKAGE_MANIFEST, &substitutions).await
                }
            })
            .step("copy-api-bindings", {
                let (dist, dest) = (dist.clone(), dest.clone());
                move || async move { artifacts::copy_entry(&dist, &dest, BINDINGS_FILE).await }
            })
            .step("copy-cli-and-templates", {
                let (android, dest) = (android.clone(), dest.clone());
                move || async move { artifacts::copy_entries(&android, &dest, &["cli", "templates"]).await }
            })
            .step("copy-gradle-template", {
                let (android, dest) = (android.clone(), dest.clone());
                move || async move {
                    let template = dest.join("templates").join("gradle");
                    artifacts::ensure_dir(&template).await?;
                    artifacts::copy_entries(&android, &template, &["gradle", "gradlew", "gradlew.bat"]).await
                }
            })
            .step("copy-native-headers", {
                let (android, dist, dest) = (android.clone(), dist.clone(), dest.clone());
                move || async move { copy_native_headers(&android, &dist, &dest).await }
            })
            .step("copy-native-libraries", {
                let (outputs, dest) = (outputs.clone(), dest.clone());
                move || async move {
                    let libs = dest.join("native").join("libs");
                    artifacts::ensure_dir(&libs).await?;
                    let copied = artifacts::copy_tree(
                        &outputs.join("jniLibs"),
                        &libs,
                        directories_and_extension(NATIVE_LIBRARY_EXTENSION),
                    )
                    .await?;
                    info!("Copied {} native libraries", copied);
                    Ok(())
                }
            })
            .step("copy-annotation-processor", move || async move {
                let module = &self.layout.annotation_processor_module;
                let libs = android.join(module).join("build").join("libs");
                artifacts::copy_entry(&libs, &dest, &format!("{}.jar", module)).await
            })
    }

    /// Run the full packaging pipeline
    pub async fn package(&self, zip_sdk_dir: &Path) -> Result<(), BuildError> {
        info!("Packaging Android platform into {:?}", Self::destination(zip_sdk_dir));
        self.plan(zip_sdk_dir).run().await
    }
}

/// Merge runtime, generated and V8 headers into `<dest>/native/include`
async fn copy_native_headers(android: &Path, dist: &Path, dest: &Path) -> Result<(), BuildError> {
    let include = dest.join("native").join("include");
    artifacts::ensure_dir(&include).await?;

    let v8 = read_v8_info(android).await?;
    let roots = [
        android.join("runtime").join("v8").join("src").join("native"),
        android.join("runtime").join("v8").join("generated"),
        dist.join("libv8").join(&v8.version).join(&v8.mode).join("include"),
    ];

    for root in &roots {
        let copied = artifacts::glob_copy(HEADER_PATTERN, root, &include).await?;
        info!("Copied {} headers from {:?}", copied, root);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidpack_android_toolchain::{EnvSnapshot, HostPlatform, ToolchainRequest, ToolchainResolver};
    use std::fs;

    fn touch(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn packager(root: &Path) -> AndroidPackager {
        let layout = ProjectLayout {
            android_dir: root.join("android"),
            dist_dir: root.join("dist"),
            ..Default::default()
        };
        let resolver = ToolchainResolver::new(HostPlatform::Unix, EnvSnapshot::default())
            .with_install_locations(false);
        let request = ToolchainRequest {
            sdk_path: Some(root.join("sdk")),
            ndk_path: None,
        };
        let gradle = GradleProject::new(&layout.android_dir, resolver, request);
        let info = BuildInfo {
            version: "9.0.0".into(),
            ..Default::default()
        };
        AndroidPackager::new(layout, info, gradle)
    }

    #[test]
    fn test_plan_order() {
        let dir = tempfile::tempdir().unwrap();
        let packager = packager(dir.path());
        let plan = packager.plan(dir.path());
        assert_eq!(
            plan.step_names(),
            vec![
                "create-destination",
                "publish-library",
                "copy-maven-repository",
                "copy-package-manifest",
                "copy-api-bindings",
                "copy-cli-and-templates",
                "copy-gradle-template",
                "copy-native-headers",
                "copy-native-libraries",
                "copy-annotation-processor",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_v8_info() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            &dir.path().join("package.json"),
            r#"{"name": "android", "v8": {"version": "8.8.278.17", "mode": "release", "integrity": "x"}}"#,
        );
        let v8 = read_v8_info(dir.path()).await.unwrap();
        assert_eq!(v8, V8Info { version: "8.8.278.17".into(), mode: "release".into() });
    }

    #[tokio::test]
    async fn test_read_v8_info_rejects_missing_section() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("package.json"), r#"{"name": "android"}"#);
        let err = read_v8_info(dir.path()).await.unwrap_err();
        assert!(matches!(err, BuildError::Manifest { .. }));
    }

    /// Source tree of a built SDK with an executable no-op Gradle wrapper
    #[cfg(unix)]
    fn write_fixture(root: &Path) {
        use std::os::unix::fs::PermissionsExt;

        let android = root.join("android");
        let outputs = android.join("titanium").join("build").join("outputs");
        fs::create_dir_all(root.join("sdk")).unwrap();

        touch(&android.join("gradlew"), "#!/bin/sh\nexit 0\n");
        fs::set_permissions(android.join("gradlew"), fs::Permissions::from_mode(0o755)).unwrap();
        touch(&android.join("gradlew.bat"), "@echo off");
        touch(&android.join("gradle/wrapper/gradle-wrapper.properties"), "distributionUrl=x");
        touch(
            &android.join("package.json"),
            r#"{"version": "__VERSION__", "v8": {"version": "8.8.0", "mode": "release"}}"#,
        );
        touch(&android.join("cli/hooks/run.js"), "");
        touch(&android.join("templates/app/AndroidManifest.xml"), "");
        touch(&android.join("runtime/v8/src/native/V8Runtime.h"), "");
        touch(&android.join("runtime/v8/generated/KrollBindings.h"), "");
        touch(&android.join("kroll-apt/build/libs/kroll-apt.jar"), "jar");
        touch(&outputs.join("m2repository/org/appcelerator/titanium.pom"), "<pom/>");
        touch(&outputs.join("jniLibs/arm64-v8a/libtitanium.so"), "elf");
        touch(&outputs.join("jniLibs/arm64-v8a/libtitanium.map"), "");
        touch(&root.join("dist/android/titanium.bindings.json"), "{}");
        touch(&root.join("dist/android/libv8/8.8.0/release/include/v8.h"), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_package_assembles_platform_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let android = root.join("android");
        write_fixture(root);

        let zip = root.join("zip");
        packager(root).package(&zip).await.unwrap();

        let dest = zip.join("android");
        assert!(dest.join("m2repository/org/appcelerator/titanium.pom").is_file());
        assert_eq!(
            fs::read_to_string(dest.join("package.json")).unwrap(),
            r#"{"version": "9.0.0", "v8": {"version": "8.8.0", "mode": "release"}}"#
        );
        assert!(dest.join("titanium.bindings.json").is_file());
        assert!(dest.join("cli/hooks/run.js").is_file());
        assert!(dest.join("templates/app/AndroidManifest.xml").is_file());
        assert!(dest.join("templates/gradle/gradlew").is_file());
        assert!(dest.join("templates/gradle/gradle/wrapper/gradle-wrapper.properties").is_file());
        assert!(dest.join("native/include/V8Runtime.h").is_file());
        assert!(dest.join("native/include/KrollBindings.h").is_file());
        assert!(dest.join("native/include/v8.h").is_file());
        assert!(dest.join("native/libs/arm64-v8a/libtitanium.so").is_file());
        assert!(!dest.join("native/libs/arm64-v8a/libtitanium.map").exists());
        assert!(dest.join("kroll-apt.jar").is_file());
        assert!(android.join("local.properties").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_package_with_config_in_relative_directory() {
        let work = tempfile::tempdir_in(".").unwrap();
        let root = work.path();
        write_fixture(root);
        fs::write(root.join(droidpack_core::CONFIG_FILE_NAME), "[build]\nversion = \"9.0.0\"\n").unwrap();

        let config = droidpack_core::DroidpackConfig::load(&root.join(droidpack_core::CONFIG_FILE_NAME))
            .await
            .unwrap();
        let resolver = ToolchainResolver::new(HostPlatform::Unix, EnvSnapshot::default())
            .with_install_locations(false);
        let request = ToolchainRequest {
            sdk_path: Some(root.join("sdk")),
            ndk_path: None,
        };
        let gradle = GradleProject::new(&config.project.android_dir, resolver, request);
        let zip = root.join("zip");

        AndroidPackager::new(config.project, config.build, gradle)
            .package(&zip)
            .await
            .unwrap();

        let include = zip.join("android/native/include");
        assert!(include.join("V8Runtime.h").is_file());
        assert!(include.join("KrollBindings.h").is_file());
        assert!(include.join("v8.h").is_file());
        assert!(!include.join("android").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_maven_repository_stops_packaging() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let android = root.join("android");
        fs::create_dir_all(root.join("sdk")).unwrap();
        touch(&android.join("gradlew"), "#!/bin/sh\nexit 0\n");
        fs::set_permissions(android.join("gradlew"), fs::Permissions::from_mode(0o755)).unwrap();
        touch(&android.join("package.json"), r#"{"version": "__VERSION__"}"#);

        let zip = root.join("zip");
        let err = packager(root).package(&zip).await.unwrap_err();

        assert_eq!(err.failed_step(), Some("copy-maven-repository"));
        assert!(zip.join("android").is_dir());
        assert!(!zip.join("android/package.json").exists());
    }
}
