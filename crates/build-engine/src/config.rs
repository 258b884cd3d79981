//! Build Configuration
//!
//! Defines a single invocation of the build tool and its console mode.

use std::collections::BTreeMap;
use std::path::PathBuf;

use droidpack_android_toolchain::EnvSnapshot;

/// Gradle console output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleMode {
    /// No progress bars; suited to CI logs
    Plain,
    #[default]
    Rich,
}

impl ConsoleMode {
    /// Plain output on CI servers, rich output for local development
    pub fn detect(env: &EnvSnapshot) -> Self {
        if env.is_ci() {
            ConsoleMode::Plain
        } else {
            ConsoleMode::Rich
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleMode::Plain => "plain",
            ConsoleMode::Rich => "rich",
        }
    }
}

/// One build tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    /// Task name, always the first argument
    pub name: String,
    /// Arguments following the task name
    pub args: Vec<String>,
    pub working_directory: PathBuf,
    /// Variables set on top of the inherited environment
    pub env: BTreeMap<String, String>,
}

impl BuildTask {
    pub fn new(name: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            working_directory: working_directory.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    /// Full argument list passed to the executable
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_mode_detection() {
        assert_eq!(ConsoleMode::detect(&EnvSnapshot::default().with("CI", "true")), ConsoleMode::Plain);
        assert_eq!(ConsoleMode::detect(&EnvSnapshot::default().with("TRAVIS", "1")), ConsoleMode::Plain);
        assert_eq!(ConsoleMode::detect(&EnvSnapshot::default()), ConsoleMode::Rich);
    }

    #[test]
    fn test_argv_starts_with_task() {
        let task = BuildTask::new(":titanium:publish", "/work/android").with_args(["--offline"]);
        assert_eq!(task.argv(), vec![":titanium:publish", "--offline"]);
    }
}
