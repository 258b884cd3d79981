//! droidpack - Android platform builder for the SDK
//!
//! Drives the Gradle wrapper of the SDK's Android project and packages its
//! outputs into the SDK distribution.
//!
//! ## Architecture
//!
//! - `droidpack-core`: configuration and shared build metadata
//! - `droidpack-android-toolchain`: SDK/NDK discovery and `local.properties`
//! - `droidpack-build-engine`: Gradle invocation and platform packaging

#![warn(clippy::all)]

pub mod commands;

pub use droidpack_core as core;
pub use droidpack_android_toolchain as toolchain;
pub use droidpack_build_engine as build;

pub use commands::{Cli, Command};
