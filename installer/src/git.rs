//! Git operations for head builds.
//!
//! A head build clones the tip of the declared branch instead of downloading
//! the tagged tarball. The clone is shallow; only the working tree and the
//! current commit hash are needed.

use crate::deps::CommandExecutor;
use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use domaindetails_formula::recipe::HeadSource;
use log::debug;
use std::process::Output;

/// Clones `head.branch` of `head.url` into `target`.
///
/// Creates the parent directories if they do not exist.
///
/// # Errors
///
/// Returns `InstallerError::Git` if the clone fails.
pub fn clone_head(executor: &dyn CommandExecutor, head: &HeadSource, target: &Utf8Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    debug!("cloning {} ({}) into {target}", head.url, head.branch);

    let output = executor.run(
        "git",
        &[
            "clone",
            "--depth",
            "1",
            "--branch",
            &head.branch,
            &head.url,
            target.as_str(),
        ],
        None,
    )?;
    ensure_success(&output, "clone")
}

/// Returns the abbreviated hash of `HEAD` in `repo`.
///
/// # Errors
///
/// Returns `InstallerError::Git` if the query fails or prints nothing.
pub fn short_commit(executor: &dyn CommandExecutor, repo: &Utf8Path) -> Result<String> {
    let output = executor.run("git", &["rev-parse", "--short", "HEAD"], Some(repo))?;
    ensure_success(&output, "rev-parse")?;

    let commit = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if commit.is_empty() {
        return Err(InstallerError::Git {
            operation: "rev-parse",
            message: "no commit hash printed".to_owned(),
        });
    }
    Ok(commit)
}

fn ensure_success(output: &Output, operation: &'static str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(InstallerError::Git {
        operation,
        message: stderr.trim().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, output_with_stdout};

    fn head() -> HeadSource {
        HeadSource {
            url: "https://github.com/simplebytes-com/domaindetails-cli.git".to_owned(),
            branch: "main".to_owned(),
        }
    }

    fn clone_call(target: &Utf8Path, result: Output) -> ExpectedCall {
        ExpectedCall::new(
            "git",
            &[
                "clone",
                "--depth",
                "1",
                "--branch",
                "main",
                "https://github.com/simplebytes-com/domaindetails-cli.git",
                target.as_str(),
            ],
            Ok(result),
        )
    }

    #[test]
    fn clone_head_requests_shallow_branch_clone() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = Utf8Path::from_path(dir.path())
            .expect("utf8 temp dir")
            .join("checkout/src");
        let executor = StubExecutor::new(vec![clone_call(&target, output_with_stdout(""))]);

        clone_head(&executor, &head(), &target).expect("clone succeeds");
        executor.assert_finished();
        assert!(target.parent().is_some_and(Utf8Path::is_dir));
    }

    #[test]
    fn clone_failure_carries_git_stderr() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = Utf8Path::from_path(dir.path())
            .expect("utf8 temp dir")
            .join("src");
        let executor = StubExecutor::new(vec![clone_call(
            &target,
            failure_output("fatal: Remote branch main not found"),
        )]);

        let err = clone_head(&executor, &head(), &target).expect_err("clone fails");
        match err {
            InstallerError::Git { operation, message } => {
                assert_eq!(operation, "clone");
                assert!(message.contains("Remote branch main not found"));
            }
            other => panic!("expected Git error, got {other:?}"),
        }
    }

    #[test]
    fn short_commit_trims_output() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "git",
            &["rev-parse", "--short", "HEAD"],
            Ok(output_with_stdout("abc1234\n")),
        )]);

        let commit = short_commit(&executor, Utf8Path::new("/tmp")).expect("commit");
        assert_eq!(commit, "abc1234");
    }

    #[test]
    fn short_commit_rejects_empty_output() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "git",
            &["rev-parse", "--short", "HEAD"],
            Ok(output_with_stdout("")),
        )]);

        let err = short_commit(&executor, Utf8Path::new("/tmp")).expect_err("empty");
        assert!(matches!(err, InstallerError::Git { operation: "rev-parse", .. }));
    }

    #[test]
    fn git_error_includes_operation() {
        let err = InstallerError::Git {
            operation: "clone",
            message: "not a git repository".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("clone"));
        assert!(msg.contains("not a git repository"));
    }
}
