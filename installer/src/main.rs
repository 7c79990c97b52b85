//! domaindetails installer CLI entrypoint.
//!
//! This binary installs the domaindetails CLI from a prebuilt archive or from
//! source, and validates and renders the release manifest. Progress goes to
//! stderr; command results (`url`, `formula`, `status`, `check`) go to
//! stdout.

use camino::Utf8Path;
use clap::Parser;
use domaindetails_formula::manifest::FormulaManifest;
use domaindetails_formula::platform::Platform;
use domaindetails_formula::render::render;
use domaindetails_formula::validation::validate;
use domaindetails_installer::cli::{Cli, Command, FormulaArgs, InstallArgs, StatusArgs, UrlArgs};
use domaindetails_installer::config::{InstallerConfig, Settings, resolve_manifest};
use domaindetails_installer::deps::SystemCommandExecutor;
use domaindetails_installer::dirs::SystemBaseDirs;
use domaindetails_installer::download::HttpDownloader;
use domaindetails_installer::error::{InstallerError, Result};
use domaindetails_installer::extraction::TarGzExtractor;
use domaindetails_installer::output::{
    DryRunInfo, Progress, ShellSnippet, dir_on_path, success_message, write_stderr_line,
};
use domaindetails_installer::pipeline::{
    Collaborators, InstallOptions, install, plan, status, test_installed, uninstall,
};
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Map `-v` occurrences to a default log level; `RUST_LOG` overrides it.
fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));
    // Fails only when a subscriber is already installed.
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        write_stderr_line(&mut std::io::stderr(), format!("logging unavailable: {err}"));
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let dirs = SystemBaseDirs;
    let config = InstallerConfig::load(&dirs)?;
    let overrides = cli.command.overrides();

    match &cli.command {
        Command::Install(args) => {
            let settings = Settings::resolve(&overrides, &config, &dirs)?;
            let manifest = load_manifest(settings.manifest.as_deref())?;
            run_install(&manifest, &settings, args, cli.quiet, stderr)
        }
        Command::Uninstall(_) => {
            let settings = Settings::resolve(&overrides, &config, &dirs)?;
            let manifest = load_manifest(settings.manifest.as_deref())?;
            let removed = uninstall(&manifest, &settings.prefix)?;
            Progress::new(stderr, cli.quiet).step(format!("Removed {removed}"));
            Ok(())
        }
        Command::Test(_) => {
            let settings = Settings::resolve(&overrides, &config, &dirs)?;
            let manifest = load_manifest(settings.manifest.as_deref())?;
            let executor = SystemCommandExecutor::with_timeout(settings.command_timeout);
            let passed = test_installed(&manifest, &settings.prefix, &executor)?;
            Progress::new(stderr, cli.quiet).step(format!("{passed} smoke test(s) passed"));
            Ok(())
        }
        Command::Status(args) => {
            let settings = Settings::resolve(&overrides, &config, &dirs)?;
            let manifest = load_manifest(settings.manifest.as_deref())?;
            print_status(&manifest, &settings.prefix, args, stdout)
        }
        Command::Check(_) => {
            let manifest = load_manifest(resolve_manifest(&overrides, &config).as_deref())?;
            check_manifest(&manifest, stdout)
        }
        Command::Url(args) => {
            let manifest = load_manifest(resolve_manifest(&overrides, &config).as_deref())?;
            print_url(&manifest, args, stdout)
        }
        Command::Formula(args) => {
            let manifest = load_manifest(resolve_manifest(&overrides, &config).as_deref())?;
            print_formula(&manifest, args, stdout)
        }
    }
}

/// Load the manifest at `path`, or the bundled one.
fn load_manifest(path: Option<&Utf8Path>) -> Result<FormulaManifest> {
    let manifest = match path {
        Some(path) => FormulaManifest::load(path)?,
        None => FormulaManifest::bundled()?,
    };
    Ok(manifest)
}

fn run_install(
    manifest: &FormulaManifest,
    settings: &Settings,
    args: &InstallArgs,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<()> {
    let platform = Platform::current()?;
    let method = args.method();

    if args.dry_run {
        let plan = plan(manifest, method, platform, &settings.prefix)?;
        let method_name = plan.method.to_string();
        let platform_key = plan.platform.key();
        let info = DryRunInfo {
            method: &method_name,
            version: &plan.version,
            platform: &platform_key,
            source: &plan.source,
            target: &plan.target,
            run_tests: !args.skip_test,
            force: args.force,
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    let downloader = HttpDownloader::with_timeout(settings.download_timeout);
    let executor = SystemCommandExecutor::with_timeout(settings.command_timeout);
    let collaborators = Collaborators {
        downloader: &downloader,
        extractor: &TarGzExtractor,
        executor: &executor,
    };
    let options = InstallOptions {
        method,
        run_tests: !args.skip_test,
        force: args.force,
    };

    let mut progress = Progress::new(stderr, quiet);
    progress.step(format!(
        "Installing {} ({method}) for {platform}...",
        manifest.name
    ));
    let outcome = install(
        manifest,
        platform,
        &settings.prefix,
        options,
        collaborators,
        &mut progress,
    )?;

    progress.step("");
    progress.step(success_message(
        manifest.binary_name(),
        &outcome.receipt.version,
        &outcome.receipt.binary_path,
    ));
    let bin_dir = settings.prefix.join("bin");
    if !dir_on_path(&bin_dir, std::env::var_os("PATH").as_deref()) {
        progress.step("");
        progress.step(format!("{bin_dir} is not on your PATH."));
        progress.step(ShellSnippet::new(&bin_dir).display_text());
    }
    Ok(())
}

fn print_status(
    manifest: &FormulaManifest,
    prefix: &Utf8Path,
    args: &StatusArgs,
    stdout: &mut dyn Write,
) -> Result<()> {
    let status = status(manifest, prefix)?;
    if args.json {
        serde_json::to_writer_pretty(&mut *stdout, &status)
            .map_err(|e| InstallerError::WriteFailed { source: e.into() })?;
        write_stdout_line(stdout, "")
    } else {
        write_stdout_line(stdout, status.display_text())
    }
}

/// Print validation findings; fail when any is an error.
fn check_manifest(manifest: &FormulaManifest, stdout: &mut dyn Write) -> Result<()> {
    let report = validate(manifest);
    for finding in report.findings() {
        write_stdout_line(stdout, finding)?;
    }
    write_stdout_line(
        stdout,
        format!(
            "{}: {} error(s), {} warning(s)",
            manifest.name,
            report.error_count(),
            report.warning_count()
        ),
    )?;
    if report.is_valid() {
        Ok(())
    } else {
        Err(InstallerError::InvalidManifest {
            errors: report.error_count(),
        })
    }
}

fn print_url(manifest: &FormulaManifest, args: &UrlArgs, stdout: &mut dyn Write) -> Result<()> {
    let platform = Platform::from_parts(
        args.os.as_deref().unwrap_or(std::env::consts::OS),
        args.arch.as_deref().unwrap_or(std::env::consts::ARCH),
    )?;
    write_stdout_line(stdout, manifest.prebuilt_url(platform)?)
}

fn print_formula(
    manifest: &FormulaManifest,
    args: &FormulaArgs,
    stdout: &mut dyn Write,
) -> Result<()> {
    let formula = render(manifest, args.kind.into())?;
    stdout
        .write_all(formula.as_bytes())
        .map_err(|source| InstallerError::WriteFailed { source })
}

fn write_stdout_line(stdout: &mut dyn Write, message: impl std::fmt::Display) -> Result<()> {
    writeln!(stdout, "{message}").map_err(|source| InstallerError::WriteFailed { source })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domaindetails_installer::cli::{FormulaKindArg, ManifestArgs, TargetArgs};
    use rstest::{fixture, rstest};

    #[fixture]
    fn manifest() -> FormulaManifest {
        FormulaManifest::bundled().expect("bundled manifest parses")
    }

    fn text(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).expect("output was not UTF-8")
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = InstallerError::BinaryMissing {
            path: "/home/user/.local/bin/domaindetails".into(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);
        assert!(text(stderr).contains("error: no executable found at"));
    }

    #[rstest]
    #[case(0, "warn")]
    #[case(1, "info")]
    #[case(2, "debug")]
    #[case(3, "trace")]
    #[case(9, "trace")]
    fn verbosity_selects_log_level(#[case] verbosity: u8, #[case] level: &str) {
        assert_eq!(level_for_verbosity(verbosity), level);
    }

    #[rstest]
    fn bundled_manifest_checks_with_placeholder_warnings(manifest: FormulaManifest) {
        let mut stdout = Vec::new();
        check_manifest(&manifest, &mut stdout).expect("bundled manifest is valid");

        let output = text(stdout);
        assert!(output.contains("warning:"));
        assert!(output.contains("domaindetails: 0 error(s), 4 warning(s)"));
    }

    #[rstest]
    fn invalid_checksum_fails_check(mut manifest: FormulaManifest) {
        manifest
            .prebuilt
            .checksums
            .insert("linux-amd64".to_owned(), "not-a-digest".to_owned());
        let mut stdout = Vec::new();

        let err = check_manifest(&manifest, &mut stdout).expect_err("malformed checksum");
        assert!(matches!(err, InstallerError::InvalidManifest { errors } if errors >= 1));
        assert!(text(stdout).contains("error:"));
    }

    #[rstest]
    #[case("darwin", "arm64", "domaindetails-1.0.0-darwin-arm64.tar.gz")]
    #[case("darwin", "x86_64", "domaindetails-1.0.0-darwin-amd64.tar.gz")]
    #[case("linux", "aarch64", "domaindetails-1.0.0-linux-arm64.tar.gz")]
    fn url_names_platform_archive(
        manifest: FormulaManifest,
        #[case] os: &str,
        #[case] arch: &str,
        #[case] archive: &str,
    ) {
        let args = UrlArgs {
            os: Some(os.to_owned()),
            arch: Some(arch.to_owned()),
            manifest: ManifestArgs::default(),
        };
        let mut stdout = Vec::new();
        print_url(&manifest, &args, &mut stdout).expect("url resolves");

        let url = text(stdout);
        assert!(url.starts_with("https://github.com/simplebytes-com/domaindetails-cli/releases/download/v1.0.0/"));
        assert!(url.trim_end().ends_with(archive), "{url}");
    }

    #[rstest]
    fn url_rejects_unsupported_os(manifest: FormulaManifest) {
        let args = UrlArgs {
            os: Some("windows".to_owned()),
            arch: Some("amd64".to_owned()),
            manifest: ManifestArgs::default(),
        };
        let err = print_url(&manifest, &args, &mut Vec::new()).expect_err("windows");
        assert!(err.to_string().contains("unsupported platform"));
    }

    #[rstest]
    #[case::tap(FormulaKindArg::Tap, "on_macos do")]
    #[case::core(FormulaKindArg::Core, "depends_on \"go\" => :build")]
    fn formula_renders_to_stdout(
        manifest: FormulaManifest,
        #[case] kind: FormulaKindArg,
        #[case] marker: &str,
    ) {
        let args = FormulaArgs {
            kind,
            manifest: ManifestArgs::default(),
        };
        let mut stdout = Vec::new();
        print_formula(&manifest, &args, &mut stdout).expect("renders");

        let formula = text(stdout);
        assert!(formula.contains("class Domaindetails < Formula"));
        assert!(formula.contains(marker), "{formula}");
    }

    #[rstest]
    fn status_json_reports_missing_install(manifest: FormulaManifest) {
        let temp = tempfile::tempdir().expect("temp dir");
        let prefix = camino::Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8");
        let args = StatusArgs {
            target: TargetArgs::default(),
            json: true,
        };
        let mut stdout = Vec::new();
        print_status(&manifest, &prefix, &args, &mut stdout).expect("status");

        let json: serde_json::Value = serde_json::from_slice(&stdout).expect("valid JSON");
        assert_eq!(json["name"], "domaindetails");
        assert_eq!(json["installed"], false);
        assert!(json["receipt"].is_null());
    }
}
