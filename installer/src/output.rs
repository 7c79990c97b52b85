//! Output formatting for the installer CLI.
//!
//! Progress lines go to stderr so that stdout stays reserved for command
//! results (`url`, `formula`, `status --json`). This module also builds the
//! shell snippets shown when the install directory is not on `PATH`, and the
//! dry-run summary.

use camino::Utf8Path;
use std::fmt::Display;
use std::io::Write;

/// Write `message` and a newline to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Progress reporter honouring `--quiet`.
pub struct Progress<'a> {
    stderr: &'a mut dyn Write,
    quiet: bool,
}

impl<'a> Progress<'a> {
    /// Create a reporter writing to `stderr`.
    pub fn new(stderr: &'a mut dyn Write, quiet: bool) -> Self {
        Self { stderr, quiet }
    }

    /// Report a progress step unless quiet.
    pub fn step(&mut self, message: impl Display) {
        if !self.quiet {
            write_stderr_line(self.stderr, message);
        }
    }

    /// Report a warning; shown even when quiet.
    pub fn warn(&mut self, message: impl Display) {
        write_stderr_line(self.stderr, format!("warning: {message}"));
    }
}

/// Shell configuration snippets that add a directory to `PATH`.
#[derive(Debug, Clone)]
pub struct ShellSnippet {
    /// Export line for bash/zsh.
    pub bash: String,
    /// Command for fish shell.
    pub fish: String,
}

impl ShellSnippet {
    /// Create shell snippets for the given bin directory.
    ///
    /// # Example
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use domaindetails_installer::output::ShellSnippet;
    ///
    /// let snippet = ShellSnippet::new(&Utf8PathBuf::from("/home/user/.local/bin"));
    /// assert_eq!(snippet.bash, "export PATH=\"/home/user/.local/bin:$PATH\"");
    /// ```
    #[must_use]
    pub fn new(bin_dir: &Utf8Path) -> Self {
        Self {
            bash: format!("export PATH=\"{bin_dir}:$PATH\""),
            fish: format!("fish_add_path \"{bin_dir}\""),
        }
    }

    /// Format the snippet for display to the user.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!(
            concat!(
                "Add the following to your shell configuration:\n\n",
                "  # bash/zsh (~/.bashrc, ~/.zshrc)\n",
                "  {}\n\n",
                "  # fish (~/.config/fish/config.fish)\n",
                "  {}"
            ),
            self.bash, self.fish
        )
    }
}

/// Whether `bin_dir` is one of the entries of a `PATH`-style value.
#[must_use]
pub fn dir_on_path(bin_dir: &Utf8Path, path_var: Option<&std::ffi::OsStr>) -> bool {
    path_var.is_some_and(|value| {
        std::env::split_paths(value).any(|entry| entry.as_path() == bin_dir.as_std_path())
    })
}

/// Format a success message after installation.
#[must_use]
pub fn success_message(binary: &str, version: &str, path: &Utf8Path) -> String {
    format!("Installed {binary} {version} to {path}")
}

/// Information printed by `install --dry-run`.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use domaindetails_installer::output::DryRunInfo;
///
/// let target = Utf8PathBuf::from("/home/user/.local/bin/domaindetails");
/// let info = DryRunInfo {
///     method: "prebuilt",
///     version: "1.0.0",
///     platform: "linux-amd64",
///     source: "https://example.test/domaindetails.tar.gz",
///     target: &target,
///     run_tests: true,
///     force: false,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("linux-amd64"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Install method name.
    pub method: &'a str,
    /// Version that would be installed.
    pub version: &'a str,
    /// Host platform key.
    pub platform: &'a str,
    /// Archive URL or clone URL.
    pub source: &'a str,
    /// Final binary path.
    pub target: &'a Utf8Path,
    /// Whether smoke tests would run.
    pub run_tests: bool,
    /// Whether an existing binary would be replaced.
    pub force: bool,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        [
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Method: {}", self.method),
            format!("Version: {}", self.version),
            format!("Platform: {}", self.platform),
            format!("Source: {}", self.source),
            format!("Install path: {}", self.target),
            format!("Run smoke tests: {}", self.run_tests),
            format!("Replace existing: {}", self.force),
        ]
        .join("\n")
    }
}
