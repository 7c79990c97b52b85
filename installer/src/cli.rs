//! CLI argument definitions for the domaindetails installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::CliOverrides;
use crate::pipeline::InstallMethod;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use domaindetails_formula::render::FormulaKind;

/// Install and package the domaindetails CLI.
#[derive(Parser, Debug)]
#[command(name = "domaindetails-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install and package the domaindetails CLI.\n\n",
    "domaindetails looks up domain registration data over RDAP and WHOIS. ",
    "This installer downloads the prebuilt release archive for the host ",
    "platform, verifies its SHA-256 checksum, and installs the binary under ",
    "a prefix. It can instead build the tagged source release or the head ",
    "branch with Go.\n\n",
    "It also validates the release manifest and renders the Homebrew tap and ",
    "core formulae from it.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the prebuilt binary into ~/.local/bin:\n",
    "    $ domaindetails-installer install\n\n",
    "  Build the tagged release from source into /usr/local:\n",
    "    $ domaindetails-installer install --build-from-source --prefix /usr/local\n\n",
    "  Build the latest commit on the head branch:\n",
    "    $ domaindetails-installer install --head\n\n",
    "  Preview an installation:\n",
    "    $ domaindetails-installer install --dry-run\n\n",
    "  Check the release manifest before publishing:\n",
    "    $ domaindetails-installer check --manifest domaindetails.toml\n\n",
    "  Render the tap formula:\n",
    "    $ domaindetails-installer formula tap > Formula/domaindetails.rb\n\n",
    "For more information, see: https://domaindetails.com/kb/cli",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors and warnings still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Install the binary.
    Install(InstallArgs),

    /// Remove the installed binary and its receipt.
    Uninstall(TargetArgs),

    /// Run the smoke tests against the installed binary.
    Test(TargetArgs),

    /// Show what is installed under the prefix.
    Status(StatusArgs),

    /// Validate the release manifest.
    Check(ManifestArgs),

    /// Print the prebuilt archive URL for a platform.
    Url(UrlArgs),

    /// Render a Homebrew formula to stdout.
    Formula(FormulaArgs),
}

/// Where to install and which manifest to use.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Install prefix; the binary goes to PREFIX/bin [default: ~/.local].
    #[arg(short, long, value_name = "DIR")]
    pub prefix: Option<Utf8PathBuf>,

    /// Release manifest to use instead of the bundled one.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,
}

/// Arguments for the install command.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Install location and manifest.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Build the tagged source release instead of downloading a binary.
    #[arg(long)]
    pub build_from_source: bool,

    /// Build the latest commit on the head branch.
    #[arg(long, conflicts_with = "build_from_source")]
    pub head: bool,

    /// Skip the post-install smoke tests.
    #[arg(long)]
    pub skip_test: bool,

    /// Show what would be installed and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Replace an existing installation.
    #[arg(short, long)]
    pub force: bool,
}

impl InstallArgs {
    /// The install path selected by the flags.
    #[must_use]
    pub const fn method(&self) -> InstallMethod {
        InstallMethod::from_flags(self.build_from_source, self.head)
    }
}

/// Arguments for the status command.
#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    /// Install location and manifest.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for commands that only read the manifest.
#[derive(Args, Debug, Clone, Default)]
pub struct ManifestArgs {
    /// Release manifest to use instead of the bundled one.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,
}

/// Arguments for the url command.
#[derive(Args, Debug, Clone, Default)]
pub struct UrlArgs {
    /// Operating system (`darwin` or `linux`) [default: host].
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// CPU architecture; arm values select arm64, others amd64 [default: host].
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

/// Formula flavours accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaKindArg {
    /// Prebuilt binaries for the project tap.
    Tap,
    /// Source build for homebrew-core.
    Core,
}

impl From<FormulaKindArg> for FormulaKind {
    fn from(kind: FormulaKindArg) -> Self {
        match kind {
            FormulaKindArg::Tap => Self::Tap,
            FormulaKindArg::Core => Self::Core,
        }
    }
}

/// Arguments for the formula command.
#[derive(Args, Debug, Clone)]
pub struct FormulaArgs {
    /// Which formula to render.
    #[arg(value_enum)]
    pub kind: FormulaKindArg,

    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

impl Command {
    /// The configuration values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        let (prefix, manifest) = match self {
            Self::Install(args) => (args.target.prefix.clone(), args.target.manifest.clone()),
            Self::Uninstall(target) | Self::Test(target) => {
                (target.prefix.clone(), target.manifest.clone())
            }
            Self::Status(args) => (args.target.prefix.clone(), args.target.manifest.clone()),
            Self::Check(args) => (None, args.manifest.clone()),
            Self::Url(args) => (None, args.manifest.manifest.clone()),
            Self::Formula(args) => (None, args.manifest.manifest.clone()),
        };
        CliOverrides { prefix, manifest }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
