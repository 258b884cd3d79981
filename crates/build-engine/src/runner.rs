//! Process Runner
//!
//! Launches the build tool and waits for it. The child shares this process's
//! stdin, stdout and stderr, so its progress output appears exactly as the
//! tool prints it.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, debug};

use crate::config::BuildTask;

/// Why a child process did not succeed
#[derive(Debug, thiserror::Error)]
pub enum ProcessFailure {
    #[error("Failed to launch {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program:?} returned exit code: {}", describe_code(.code))]
    Exit { program: PathBuf, code: Option<i32> },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

/// `Ok` when the process exited with code 0
pub type ProcessOutcome = Result<(), ProcessFailure>;

/// Runs external executables to completion
pub struct ProcessRunner;

impl ProcessRunner {
    /// Run `program` with the task's arguments, directory and environment
    pub async fn run(program: &Path, task: &BuildTask) -> ProcessOutcome {
        info!("Running {} {}", program.display(), task.argv().join(" "));
        debug!("Working directory {:?}, env overrides {:?}", task.working_directory, task.env);

        let mut cmd = Command::new(program);
        cmd.args(task.argv())
            .current_dir(&task.working_directory)
            .envs(&task.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd
            .status()
            .await
            .map_err(|source| ProcessFailure::Spawn {
                program: program.to_path_buf(),
                source,
            })?;

        if status.success() {
            debug!("{} finished successfully", program.display());
            Ok(())
        } else {
            Err(ProcessFailure::Exit {
                program: program.to_path_buf(),
                code: status.code(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio_test::{assert_err, assert_ok};

    fn shell(script: &str, dir: &Path) -> BuildTask {
        BuildTask::new("-c", dir).with_args([script])
    }

    #[tokio::test]
    async fn test_exit_zero_is_success() {
        let dir = tempfile::tempdir().unwrap();
        assert_ok!(ProcessRunner::run(Path::new("/bin/sh"), &shell("exit 0", dir.path())).await);
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_code() {
        let dir = tempfile::tempdir().unwrap();
        let err = assert_err!(ProcessRunner::run(Path::new("/bin/sh"), &shell("exit 1", dir.path())).await);
        assert!(matches!(err, ProcessFailure::Exit { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gradlew");
        let err = assert_err!(ProcessRunner::run(&missing, &BuildTask::new("clean", dir.path())).await);
        assert!(matches!(err, ProcessFailure::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_environment_and_directory_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = BTreeMap::new();
        env.insert("DROIDPACK_TEST_VALUE".to_string(), "42".to_string());
        let task = shell("test \"$DROIDPACK_TEST_VALUE\" = 42 && pwd > cwd.txt", dir.path()).with_env(env);

        assert_ok!(ProcessRunner::run(Path::new("/bin/sh"), &task).await);
        let cwd = std::fs::read_to_string(dir.path().join("cwd.txt")).unwrap();
        assert_eq!(
            std::fs::canonicalize(cwd.trim()).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }
}
