//! CLI commands for droidpack
//!
//! Provides command-line interface functionality for automation and scripting.

use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use droidpack_android_toolchain::{ToolchainRequest, ToolchainResolution, ToolchainResolver};
use droidpack_build_engine::{babel_options_for, AndroidPackager, GradleProject};
use droidpack_core::{DroidpackConfig, CONFIG_FILE_NAME};

/// Build and package the Android platform of the SDK
#[derive(Debug, Parser)]
#[command(name = "droidpack", version, about)]
pub struct Cli {
    /// Configuration file
    #[arg(long, short, env = "DROIDPACK_CONFIG", default_value = CONFIG_FILE_NAME, global = true)]
    pub config: PathBuf,

    /// Android SDK root, checked before any environment variable
    #[arg(long, value_name = "DIR", global = true)]
    pub android_sdk: Option<PathBuf>,

    /// Android NDK root, checked before any environment variable
    #[arg(long, value_name = "DIR", global = true)]
    pub android_ndk: Option<PathBuf>,

    /// Only consider explicit paths and environment variables
    #[arg(long, global = true)]
    pub skip_install_locations: bool,

    #[arg(long, value_name = "VERSION", global = true)]
    pub sdk_version: Option<String>,

    #[arg(long, value_name = "TAG", global = true)]
    pub version_tag: Option<String>,

    #[arg(long, value_name = "HASH", global = true)]
    pub git_hash: Option<String>,

    #[arg(long, value_name = "TIMESTAMP", global = true)]
    pub timestamp: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean all Gradle projects
    Clean,
    /// Assemble the release build of the library module
    Build,
    /// Publish the library and assemble the platform directory
    Package {
        /// SDK zip staging directory; output goes to `<DIR>/android`
        #[arg(long, value_name = "DIR")]
        dest: PathBuf,
    },
    /// Resolve the SDK/NDK and write local.properties
    Toolchain,
    /// Print the JavaScript transpiler options as JSON
    BabelOptions,
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply_overrides(&self, config: &mut DroidpackConfig) {
        if let Some(ref sdk) = self.android_sdk {
            config.toolchain.sdk_path = Some(sdk.clone());
        }
        if let Some(ref ndk) = self.android_ndk {
            config.toolchain.ndk_path = Some(ndk.clone());
        }
        if let Some(ref version) = self.sdk_version {
            config.build.version = version.clone();
        }
        if let Some(ref tag) = self.version_tag {
            config.build.version_tag = tag.clone();
        }
        if let Some(ref hash) = self.git_hash {
            config.build.git_hash = hash.clone();
        }
        if let Some(ref timestamp) = self.timestamp {
            config.build.timestamp = timestamp.clone();
        }
    }

    /// Load the configuration this invocation runs with
    pub async fn load_config(&self) -> Result<DroidpackConfig> {
        let mut config = DroidpackConfig::load(&self.config).await?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn gradle_project(&self, config: &DroidpackConfig) -> GradleProject {
        let resolver = ToolchainResolver::from_environment()
            .with_install_locations(!self.skip_install_locations);
        GradleProject::new(
            &config.project.android_dir,
            resolver,
            ToolchainRequest::from(&config.toolchain),
        )
    }

    /// Execute the selected command
    pub async fn execute(&self) -> Result<()> {
        let config = self.load_config().await?;
        let gradle = self.gradle_project(&config);

        match self.command {
            Command::Clean => gradle.clean().await?,
            Command::Build => {
                gradle
                    .assemble_release(&config.project.library_module, &config.build)
                    .await?
            }
            Command::Package { ref dest } => {
                let packager = AndroidPackager::new(config.project.clone(), config.build.clone(), gradle);
                packager.package(dest).await?;
                info!("Android platform packaged to {:?}", AndroidPackager::destination(dest));
            }
            Command::Toolchain => report_toolchain(&gradle).await?,
            Command::BabelOptions => {
                let options = babel_options_for(&config.project.android_dir, &config.build).await?;
                println!("{}", serde_json::to_string_pretty(&options)?);
            }
        }
        Ok(())
    }
}

async fn report_toolchain(gradle: &GradleProject) -> Result<()> {
    let properties = gradle.local_properties();
    let paths = match gradle.prepare_toolchain().await? {
        ToolchainResolution::Fresh(paths) => Some(paths),
        ToolchainResolution::Stale { properties_file } => {
            println!("Reusing {}", properties_file.display());
            properties.read().await?
        }
    };

    match paths {
        Some(paths) => {
            println!("sdk.dir = {}", paths.sdk_path.display());
            match paths.ndk_path {
                Some(ndk) => println!("ndk.dir = {}", ndk.display()),
                None => println!("ndk.dir = (not found)"),
            }
        }
        None => println!("{} has no sdk.dir entry", properties.path().display()),
    }
    Ok(())
}
