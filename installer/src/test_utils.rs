//! Shared test utilities for the installer crate.

use crate::deps::CommandExecutor;
use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    output_with_stdout("")
}

/// Creates a successful command `Output` printing `stdout`.
pub fn output_with_stdout(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "go").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `cmd` with `args`, answering with `result`.
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
/// Mismatches are returned as [`InstallerError::StubMismatch`] so that a
/// failing pipeline surfaces the unexpected call in its error.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining = self.expected.borrow();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, {} left: {:?}",
            remaining.len(),
            remaining.iter().map(|call| call.cmd.as_str()).collect::<Vec<_>>()
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str], _cwd: Option<&Utf8Path>) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let Some(call) = expected.pop_front() else {
            return Err(InstallerError::StubMismatch {
                message: format!("unexpected command: {cmd} {}", args.join(" ")),
            });
        };

        if call.cmd != cmd || call.args.iter().map(String::as_str).ne(args.iter().copied()) {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{cmd} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        call.result
    }
}

/// A file to place in a fabricated archive.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveEntry<'a> {
    /// Path inside the archive.
    pub path: &'a str,
    /// File contents.
    pub contents: &'a [u8],
    /// Unix permission bits.
    pub mode: u32,
}

impl<'a> ArchiveEntry<'a> {
    /// A regular, non-executable file.
    pub const fn file(path: &'a str, contents: &'a [u8]) -> Self {
        Self {
            path,
            contents,
            mode: 0o644,
        }
    }

    /// An executable file.
    pub const fn executable(path: &'a str, contents: &'a [u8]) -> Self {
        Self {
            path,
            contents,
            mode: 0o755,
        }
    }
}

/// Write a `.tar.gz` archive containing `entries` to `path`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn tar_gz_with(path: &Path, entries: &[ArchiveEntry<'_>]) {
    let file = std::fs::File::create(path).expect("create archive");
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(entry.contents.len() as u64);
        header.set_mode(entry.mode);
        header.set_cksum();
        builder
            .append_data(&mut header, entry.path, entry.contents)
            .expect("append entry");
    }
    let encoder = builder.into_inner().expect("tar finish");
    encoder.finish().expect("gzip finish");
}

/// Return the lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Return the lowercase hex SHA-256 digest of the file at `path`.
///
/// # Panics
///
/// Panics if the file cannot be read.
pub fn sha256_file(path: &Path) -> String {
    sha256_hex(&std::fs::read(path).expect("read file to hash"))
}
