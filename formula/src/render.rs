//! Homebrew formula rendering.
//!
//! Produces the Ruby formula text for the two publication channels:
//!
//! - the tap formula, which downloads a prebuilt archive chosen by OS and
//!   CPU (`on_macos`/`on_linux` with `Hardware::CPU.arm?`);
//! - the core formula, which builds the tagged source tarball with Go and
//!   supports `--HEAD` builds from the configured branch.
//!
//! Only text is produced here. Nothing in this module evaluates formulas.

use crate::error::Result;
use crate::manifest::FormulaManifest;
use crate::platform::{Arch, Os, Platform};
use crate::recipe::BuildStamp;
use crate::release::ReleaseArtefact;
use crate::smoke::SmokeTest;
use std::fmt::{self, Write as _};

/// Which formula file to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaKind {
    /// Prebuilt binaries, published to the project's tap.
    Tap,
    /// Source build, as submitted to homebrew-core.
    Core,
}

/// Render the requested formula.
///
/// # Errors
///
/// See [`render_tap_formula`] and [`render_core_formula`].
pub fn render(manifest: &FormulaManifest, kind: FormulaKind) -> Result<String> {
    match kind {
        FormulaKind::Tap => render_tap_formula(manifest),
        FormulaKind::Core => render_core_formula(manifest),
    }
}

/// Render the prebuilt-binary tap formula.
///
/// # Errors
///
/// Returns an error if a platform lacks a checksum or the URL template is
/// malformed.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::manifest::FormulaManifest;
/// use domaindetails_formula::render::render_tap_formula;
///
/// let manifest = FormulaManifest::bundled().expect("bundled manifest parses");
/// let formula = render_tap_formula(&manifest).expect("renders");
/// assert!(formula.contains("class Domaindetails < Formula"));
/// assert!(formula.contains("if Hardware::CPU.arm?"));
/// ```
pub fn render_tap_formula(manifest: &FormulaManifest) -> Result<String> {
    let mut formula = String::new();
    let binary = manifest.binary_name();

    writeln!(formula, "# Homebrew formula for {} CLI", manifest.name)?;
    if let Some(tap) = &manifest.tap {
        let short_tap = tap.name().strip_prefix("homebrew-").unwrap_or(tap.name());
        writeln!(
            formula,
            "# To install: brew install {}/{short_tap}/{}",
            tap.owner(),
            manifest.name
        )?;
        writeln!(formula, "#\n# This formula is published to: {}", tap.github_url())?;
    }
    writeln!(formula)?;

    write_header(&mut formula, manifest)?;
    writeln!(
        formula,
        "  version {}",
        ruby_string(manifest.prebuilt.version.as_str())
    )?;
    writeln!(formula, "  license {}", ruby_string(&manifest.license))?;

    for (os, block) in [(Os::Darwin, "on_macos"), (Os::Linux, "on_linux")] {
        let arm = manifest.prebuilt_artefact(Platform::new(os, Arch::Arm64))?;
        let other = manifest.prebuilt_artefact(Platform::new(os, Arch::Amd64))?;
        writeln!(formula, "\n  {block} do")?;
        writeln!(formula, "    if Hardware::CPU.arm?")?;
        write_artefact(&mut formula, &arm)?;
        writeln!(formula, "    else")?;
        write_artefact(&mut formula, &other)?;
        writeln!(formula, "    end\n  end")?;
    }

    writeln!(formula, "\n  def install")?;
    writeln!(formula, "    bin.install {}", ruby_string(binary))?;
    writeln!(formula, "  end")?;

    write_tests(&mut formula, manifest)?;
    writeln!(formula, "end")?;
    Ok(formula)
}

/// Render the build-from-source core formula.
///
/// # Errors
///
/// Returns [`crate::error::FormulaError::NoSourceRecipe`] if the manifest
/// declares no source recipe.
///
/// # Examples
///
/// ```
/// use domaindetails_formula::manifest::FormulaManifest;
/// use domaindetails_formula::render::render_core_formula;
///
/// let manifest = FormulaManifest::bundled().expect("bundled manifest parses");
/// let formula = render_core_formula(&manifest).expect("renders");
/// assert!(formula.contains("depends_on \"go\" => :build"));
/// assert!(formula.contains("branch: \"main\""));
/// ```
pub fn render_core_formula(manifest: &FormulaManifest) -> Result<String> {
    let recipe = manifest.source_recipe()?;
    let mut formula = String::new();

    write_header(&mut formula, manifest)?;
    writeln!(formula, "  url {}", ruby_string(&recipe.url))?;
    writeln!(formula, "  sha256 {}", ruby_string(&recipe.sha256))?;
    writeln!(formula, "  license {}", ruby_string(&manifest.license))?;
    if let Some(head) = &recipe.head {
        writeln!(
            formula,
            "  head {}, branch: {}",
            ruby_string(&head.url),
            ruby_string(&head.branch)
        )?;
    }

    writeln!(formula)?;
    for dependency in &recipe.build_dependencies {
        writeln!(formula, "  depends_on {} => :build", ruby_string(dependency))?;
    }

    let ldflags = recipe.ldflags.render(&BuildStamp {
        version: "#{version}",
        commit: "#{tap.user}",
        date: "#{time.iso8601}",
    });
    writeln!(formula, "\n  def install")?;
    writeln!(formula, "    ldflags = {}", ruby_string(&ldflags))?;
    writeln!(
        formula,
        "    system \"go\", \"build\", *std_go_args(ldflags:), {}",
        ruby_string(&recipe.package)
    )?;
    writeln!(formula, "  end")?;

    write_tests(&mut formula, manifest)?;
    writeln!(formula, "end")?;
    Ok(formula)
}

fn write_header(formula: &mut String, manifest: &FormulaManifest) -> fmt::Result {
    writeln!(formula, "class {} < Formula", manifest.class_name())?;
    writeln!(formula, "  desc {}", ruby_string(&manifest.desc))?;
    writeln!(formula, "  homepage {}", ruby_string(&manifest.homepage))
}

fn write_artefact(formula: &mut String, artefact: &ReleaseArtefact) -> fmt::Result {
    writeln!(formula, "      url {}", ruby_string(&artefact.url))?;
    writeln!(formula, "      sha256 {}", ruby_string(&artefact.sha256))
}

fn write_tests(formula: &mut String, manifest: &FormulaManifest) -> fmt::Result {
    let binary = manifest.binary_name();
    writeln!(formula, "\n  test do")?;
    for test in manifest.smoke_tests() {
        write_test(formula, &test, binary, &manifest.name)?;
    }
    writeln!(formula, "  end")
}

fn write_test(formula: &mut String, test: &SmokeTest, binary: &str, name: &str) -> fmt::Result {
    if test.expect.is_empty() {
        write!(formula, "    system \"#{{bin}}/{binary}\"")?;
        for arg in &test.args {
            write!(formula, ", {}", ruby_string(arg))?;
        }
        return writeln!(formula);
    }

    let command = std::iter::once(format!("#{{bin}}/{binary}"))
        .chain(test.args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    for expected in &test.expect {
        let matcher = match expected.as_str() {
            "{version}" => "version.to_s".to_owned(),
            other => ruby_string(&other.replace("{name}", name)),
        };
        writeln!(
            formula,
            "    assert_match {matcher}, shell_output({})",
            ruby_string(&command)
        )?;
    }
    Ok(())
}

/// Quote `value` as a double-quoted Ruby string literal.
///
/// Backslashes and double quotes are escaped; `#{...}` interpolation is
/// left intact because formulas rely on it.
fn ruby_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
