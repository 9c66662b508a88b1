//! External package-manager command execution

use crate::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, if the process was not killed by a signal
    pub code: Option<i32>,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

/// Platform executable name for a package-manager program
pub fn executable(program: &str) -> String {
    if cfg!(windows) {
        format!("{program}.cmd")
    } else {
        program.to_string()
    }
}

/// Run `program args...` in `cwd`, killing it once `timeout` elapses.
///
/// # Errors
/// Returns [`Error::Command`] if the program cannot be spawned or times out.
/// A non-zero exit is not an error; check [`CommandOutput::success`].
pub async fn run(program: &str, args: &[&str], cwd: &Path, timeout: Duration) -> Result<CommandOutput> {
    let executable = executable(program);
    tracing::debug!(program = %executable, ?args, cwd = %cwd.display(), "Running command");

    let child = Command::new(&executable)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Command {
            program: executable.clone(),
            message: e.to_string(),
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output.map_err(|e| Error::Command {
            program: executable.clone(),
            message: e.to_string(),
        })?,
        Err(_) => {
            return Err(Error::Command {
                program: executable,
                message: format!("timed out after {}s", timeout.as_secs()),
            })
        }
    };

    Ok(CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout_and_status() {
        let dir = std::env::temp_dir();
        let output = run("sh", &["-c", "echo hello; exit 3"], &dir, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let dir = std::env::temp_dir();
        let err = run("sh", &["-c", "sleep 5"], &dir, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let dir = std::env::temp_dir();
        let err = run("depscout-no-such-program", &[], &dir, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command { .. }));
    }
}
