//! Post-install smoke tests.
//!
//! A smoke test is a command line for the installed binary plus substrings
//! that must appear in its output. Expectations may reference `{version}`
//! and `{name}`, which are substituted before matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One smoke-test invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmokeTest {
    /// Arguments passed to the binary.
    pub args: Vec<String>,
    /// Substrings that must all appear in stdout or stderr.
    pub expect: Vec<String>,
}

/// An expectation that did not appear in the command output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingExpectation {
    /// The expanded substring that was not found.
    pub expected: String,
}

impl fmt::Display for MissingExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output does not contain \"{}\"", self.expected)
    }
}

impl SmokeTest {
    /// The `--version` check: output must contain the version.
    #[must_use]
    pub fn version_check() -> Self {
        Self {
            args: vec!["--version".to_owned()],
            expect: vec!["{version}".to_owned()],
        }
    }

    /// The `--help` check: output must contain the program name.
    #[must_use]
    pub fn help_check() -> Self {
        Self {
            args: vec!["--help".to_owned()],
            expect: vec!["{name}".to_owned()],
        }
    }

    /// The checks run when a manifest declares none.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::version_check(), Self::help_check()]
    }

    /// Return the expectations with placeholders expanded.
    #[must_use]
    pub fn expanded_expectations(&self, version: &str, name: &str) -> Vec<String> {
        self.expect
            .iter()
            .map(|pattern| pattern.replace("{version}", version).replace("{name}", name))
            .collect()
    }

    /// Check captured output against every expectation.
    ///
    /// # Errors
    ///
    /// Returns the first expectation that does not occur in `output`.
    ///
    /// # Examples
    ///
    /// ```
    /// use domaindetails_formula::smoke::SmokeTest;
    ///
    /// let test = SmokeTest::version_check();
    /// let banner = "domaindetails 1.0.0 (commit: none, built: unknown)";
    /// assert!(test.check_output(banner, "1.0.0", "domaindetails").is_ok());
    /// assert!(test.check_output(banner, "1.0.1", "domaindetails").is_err());
    /// ```
    pub fn check_output(
        &self,
        output: &str,
        version: &str,
        name: &str,
    ) -> Result<(), MissingExpectation> {
        match self
            .expanded_expectations(version, name)
            .into_iter()
            .find(|expected| !output.contains(expected.as_str()))
        {
            Some(expected) => Err(MissingExpectation { expected }),
            None => Ok(()),
        }
    }

    /// Render the command line for display.
    #[must_use]
    pub fn command_line(&self, binary: &str) -> String {
        std::iter::once(binary)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
