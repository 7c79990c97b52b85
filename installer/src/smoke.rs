//! Post-install smoke tests.
//!
//! Each test runs the installed binary with fixed arguments and checks that
//! the combined output contains every expected substring. A missing binary,
//! a non-zero exit, or a missing substring fails the installation check.

use crate::deps::CommandExecutor;
use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use domaindetails_formula::smoke::SmokeTest;
use log::debug;

/// Values substituted into smoke test expectations.
#[derive(Debug, Clone, Copy)]
pub struct SmokeContext<'a> {
    /// Installed version (`{version}`).
    pub version: &'a str,
    /// Program name (`{name}`).
    pub name: &'a str,
}

/// Run every test in `tests` against the binary at `binary`.
///
/// # Errors
///
/// Returns [`InstallerError::BinaryMissing`] if `binary` is not a file, and
/// [`InstallerError::SmokeTestFailed`] for the first failing test.
pub fn run_smoke_tests(
    executor: &dyn CommandExecutor,
    binary: &Utf8Path,
    tests: &[SmokeTest],
    context: SmokeContext<'_>,
) -> Result<usize> {
    if !binary.is_file() {
        return Err(InstallerError::BinaryMissing {
            path: binary.to_owned(),
        });
    }

    for test in tests {
        run_one(executor, binary, test, context)?;
    }
    Ok(tests.len())
}

fn run_one(
    executor: &dyn CommandExecutor,
    binary: &Utf8Path,
    test: &SmokeTest,
    context: SmokeContext<'_>,
) -> Result<()> {
    let command = test.command_line(binary.as_str());
    let args: Vec<&str> = test.args.iter().map(String::as_str).collect();
    let failed = |reason: String| InstallerError::SmokeTestFailed {
        command: command.clone(),
        reason,
    };

    let output = executor
        .run(binary.as_str(), &args, None)
        .map_err(|err| failed(err.to_string()))?;
    if !output.status.success() {
        return Err(failed(format!("exited with {}", output.status)));
    }

    // Many CLIs print --help to stderr; search both streams.
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    test.check_output(&combined, context.version, context.name)
        .map_err(|missing| failed(missing.to_string()))?;

    debug!("smoke test passed: {command}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, output_with_stdout};
    use camino::Utf8PathBuf;

    const CONTEXT: SmokeContext<'static> = SmokeContext {
        version: "1.0.0",
        name: "domaindetails",
    };

    fn installed() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().join("domaindetails")).expect("UTF-8 path");
        std::fs::write(&path, b"binary").expect("write binary");
        (temp, path)
    }

    #[test]
    fn default_tests_pass_against_banner_and_help() {
        let (_temp, binary) = installed();
        let executor = StubExecutor::new(vec![
            ExpectedCall::new(
                binary.as_str(),
                &["--version"],
                Ok(output_with_stdout(
                    "domaindetails 1.0.0 (commit: abc1234, built: 2024-12-01T00:00:00Z)\n",
                )),
            ),
            ExpectedCall::new(
                binary.as_str(),
                &["--help"],
                Ok(output_with_stdout("Usage:\n  domaindetails [command]\n")),
            ),
        ]);

        let passed = run_smoke_tests(&executor, &binary, &SmokeTest::defaults(), CONTEXT)
            .expect("smoke tests pass");
        assert_eq!(passed, 2);
        executor.assert_finished();
    }

    #[test]
    fn wrong_version_fails() {
        let (_temp, binary) = installed();
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            binary.as_str(),
            &["--version"],
            Ok(output_with_stdout("domaindetails dev (commit: none, built: unknown)")),
        )]);

        let err = run_smoke_tests(&executor, &binary, &[SmokeTest::version_check()], CONTEXT)
            .expect_err("version mismatch");
        match err {
            InstallerError::SmokeTestFailed { command, reason } => {
                assert!(command.ends_with("domaindetails --version"));
                assert!(reason.contains("1.0.0"));
            }
            other => panic!("expected SmokeTestFailed, got {other:?}"),
        }
    }

    #[test]
    fn non_zero_exit_fails() {
        let (_temp, binary) = installed();
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            binary.as_str(),
            &["--version"],
            Ok(failure_output("segmentation fault")),
        )]);

        let err = run_smoke_tests(&executor, &binary, &[SmokeTest::version_check()], CONTEXT)
            .expect_err("exit status");
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn missing_binary_fails_without_running_anything() {
        let executor = StubExecutor::new(Vec::new());
        let err = run_smoke_tests(
            &executor,
            Utf8Path::new("/nonexistent/bin/domaindetails"),
            &SmokeTest::defaults(),
            CONTEXT,
        )
        .expect_err("missing binary");
        assert!(matches!(err, InstallerError::BinaryMissing { .. }));
    }

    #[test]
    fn help_on_stderr_is_accepted() {
        let (_temp, binary) = installed();
        let output = std::process::Output {
            status: crate::test_utils::exit_status(0),
            stdout: Vec::new(),
            stderr: b"domaindetails - Domain RDAP and WHOIS lookup".to_vec(),
        };
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            binary.as_str(),
            &["--help"],
            Ok(output),
        )]);

        run_smoke_tests(&executor, &binary, &[SmokeTest::help_check()], CONTEXT)
            .expect("help on stderr passes");
    }

    #[cfg(unix)]
    #[test]
    fn real_script_passes_version_check() {
        use crate::deps::SystemCommandExecutor;
        use std::os::unix::fs::PermissionsExt;

        let (_temp, binary) = installed();
        std::fs::write(
            &binary,
            "#!/bin/sh\necho \"domaindetails 1.0.0 (commit: none, built: unknown)\"\n",
        )
        .expect("write script");
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
            .expect("chmod");

        run_smoke_tests(
            &SystemCommandExecutor::default(),
            &binary,
            &[SmokeTest::version_check()],
            CONTEXT,
        )
        .expect("script prints version");
    }
}
