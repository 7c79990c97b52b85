//! External command execution and build tool checks.
//!
//! Source builds shell out to `go` and `git`, and smoke tests run the
//! installed binary. Every child process goes through [`CommandExecutor`] so
//! that tests can script the exchange without touching the host.

use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use log::debug;
use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default timeout for external commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// `cwd` selects the working directory; `None` inherits the installer's.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the
    /// command, or [`InstallerError::CommandTimeout`] if it overruns.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use domaindetails_installer::deps::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor::default();
    /// let output = executor.run("go", &["version"], None)?;
    /// assert!(output.status.success());
    /// # Ok::<(), domaindetails_installer::error::InstallerError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str], cwd: Option<&Utf8Path>) -> Result<Output>;
}

/// Executes commands on the host system, killing them after a timeout.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl SystemCommandExecutor {
    /// Create an executor that kills commands running longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: Option<&Utf8Path>) -> Result<Output> {
        debug!("running {cmd} {}", args.join(" "));
        let mut command = Command::new(cmd);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            command.current_dir(dir.as_std_path());
        }

        let mut child = command.spawn()?;
        // Both pipes are drained while waiting so a chatty child cannot fill
        // a pipe buffer and stall.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match child.wait_timeout(self.timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: join_drain(stdout)?,
                stderr: join_drain(stderr)?,
            }),
            None => {
                if let Err(err) = child.kill() {
                    debug!("failed to kill {cmd}: {err}");
                }
                if let Err(err) = child.wait() {
                    debug!("failed to reap {cmd}: {err}");
                }
                Err(InstallerError::CommandTimeout {
                    program: cmd.to_owned(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

type DrainHandle = Option<JoinHandle<io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> DrainHandle {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            reader.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn join_drain(handle: DrainHandle) -> Result<Vec<u8>> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))??;
    Ok(bytes)
}

/// Return the arguments used to probe whether `tool` is installed.
///
/// Go reports its version through a subcommand rather than a flag.
#[must_use]
pub fn probe_args(tool: &str) -> &'static [&'static str] {
    match tool {
        "go" => &["version"],
        _ => &["--version"],
    }
}

/// Verify that every build dependency can be executed.
///
/// # Errors
///
/// Returns [`InstallerError::MissingBuildDependency`] for the first tool that
/// cannot be spawned or exits unsuccessfully.
pub fn check_build_dependencies(executor: &dyn CommandExecutor, tools: &[String]) -> Result<()> {
    for tool in tools {
        let output = executor
            .run(tool, probe_args(tool), None)
            .map_err(|err| InstallerError::MissingBuildDependency {
                tool: tool.clone(),
                reason: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(InstallerError::MissingBuildDependency {
                tool: tool.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        debug!(
            "{tool} available: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, output_with_stdout};
    use rstest::rstest;

    #[rstest]
    #[case::go("go", &["version"])]
    #[case::git("git", &["--version"])]
    fn probe_args_match_tool_conventions(#[case] tool: &str, #[case] expected: &[&str]) {
        assert_eq!(probe_args(tool), expected);
    }

    #[test]
    fn all_tools_present_passes() {
        let executor = StubExecutor::new(vec![
            ExpectedCall::new(
                "go",
                &["version"],
                Ok(output_with_stdout("go version go1.22.0 linux/amd64")),
            ),
            ExpectedCall::new(
                "git",
                &["--version"],
                Ok(output_with_stdout("git version 2.43.0")),
            ),
        ]);
        let tools = vec!["go".to_owned(), "git".to_owned()];

        check_build_dependencies(&executor, &tools).expect("tools available");
        executor.assert_finished();
    }

    #[test]
    fn spawn_failure_names_missing_tool() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "go",
            &["version"],
            Err(InstallerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No such file or directory",
            ))),
        )]);

        let err = check_build_dependencies(&executor, &["go".to_owned()]).expect_err("missing");
        match err {
            InstallerError::MissingBuildDependency { tool, reason } => {
                assert_eq!(tool, "go");
                assert!(reason.contains("No such file"));
            }
            other => panic!("expected MissingBuildDependency, got {other:?}"),
        }
    }

    #[test]
    fn failing_probe_stops_at_first_tool() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "go",
            &["version"],
            Ok(failure_output("go: broken installation")),
        )]);
        let tools = vec!["go".to_owned(), "git".to_owned()];

        let err = check_build_dependencies(&executor, &tools).expect_err("broken");
        assert!(err.to_string().contains("broken installation"));
        executor.assert_finished();
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_captures_output() {
        let executor = SystemCommandExecutor::default();
        let output = executor
            .run("sh", &["-c", "echo out; echo err >&2"], None)
            .expect("sh runs");
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "out");
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_honours_working_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cwd = Utf8Path::from_path(dir.path()).expect("utf8 temp dir");
        let output = SystemCommandExecutor::default()
            .run("sh", &["-c", "ls"], Some(cwd))
            .expect("sh runs");
        assert!(output.stdout.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_collects_output_larger_than_pipe_buffer() {
        let executor = SystemCommandExecutor::with_timeout(Duration::from_secs(30));
        let output = executor
            .run(
                "sh",
                &[
                    "-c",
                    "head -c 200000 /dev/zero | tr '\\0' x; head -c 100000 /dev/zero | tr '\\0' e >&2",
                ],
                None,
            )
            .expect("large output is drained");
        assert!(output.status.success());
        assert_eq!(output.stdout.len(), 200_000);
        assert_eq!(output.stderr.len(), 100_000);
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_kills_overrunning_command() {
        let executor = SystemCommandExecutor::with_timeout(Duration::from_millis(100));
        let err = executor
            .run("sleep", &["5"], None)
            .expect_err("should time out");
        assert!(matches!(err, InstallerError::CommandTimeout { .. }));
    }
}
