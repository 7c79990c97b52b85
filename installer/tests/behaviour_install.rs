//! Behaviour-driven tests for the install pipeline.
//!
//! These scenarios cover checksum verification, missing binaries, smoke
//! test failures, and placeholder checksums on the prebuilt path. Archives
//! are real `.tar.gz` files served from memory; the installed binary is
//! exercised through a stub executor.

use camino::{Utf8Path, Utf8PathBuf};
use domaindetails_formula::FormulaError;
use domaindetails_formula::manifest::FormulaManifest;
use domaindetails_formula::platform::{Arch, Os, Platform};
use domaindetails_installer::download::{ArtefactDownloader, DownloadError};
use domaindetails_installer::error::InstallerError;
use domaindetails_installer::extraction::TarGzExtractor;
use domaindetails_installer::output::Progress;
use domaindetails_installer::pipeline::{
    Collaborators, InstallMethod, InstallOptions, InstallOutcome, install,
};
use domaindetails_installer::receipt::{InstallReceipt, receipt_path};
use domaindetails_installer::test_utils::{
    ArchiveEntry, ExpectedCall, StubExecutor, output_with_stdout, sha256_hex, tar_gz_with,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::Cell;
use std::path::Path;
use tempfile::TempDir;

const PLATFORM: Platform = Platform::new(Os::Linux, Arch::Amd64);

/// Serves a fixed archive from memory and counts requests.
struct InMemoryDownloader<'a> {
    bytes: &'a [u8],
    requests: &'a Cell<usize>,
}

impl ArtefactDownloader for InMemoryDownloader<'_> {
    fn download(&self, _url: &str, dest: &Path) -> Result<(), DownloadError> {
        self.requests.set(self.requests.get() + 1);
        std::fs::write(dest, self.bytes).map_err(DownloadError::Io)
    }
}

// ---------------------------------------------------------------------------
// Install world
// ---------------------------------------------------------------------------

struct InstallWorld {
    temp: TempDir,
    prefix: Utf8PathBuf,
    archive: Vec<u8>,
    checksum: String,
    reported_version: String,
    requests: Cell<usize>,
    result: Option<Result<InstallOutcome, InstallerError>>,
}

#[fixture]
fn world() -> InstallWorld {
    let temp = tempfile::tempdir().expect("temp dir");
    let prefix = Utf8PathBuf::try_from(temp.path().join("prefix")).expect("UTF-8 temp dir");
    InstallWorld {
        temp,
        prefix,
        archive: Vec::new(),
        checksum: String::new(),
        reported_version: "1.0.0".to_owned(),
        requests: Cell::new(0),
        result: None,
    }
}

fn manifest(checksum: &str) -> FormulaManifest {
    FormulaManifest::from_toml_str(&format!(
        concat!(
            "name = \"domaindetails\"\n",
            "desc = \"Domain RDAP and WHOIS lookup CLI tool\"\n",
            "homepage = \"https://domaindetails.com\"\n",
            "license = \"MIT\"\n",
            "repository = \"simplebytes-com/domaindetails-cli\"\n",
            "\n",
            "[prebuilt]\n",
            "version = \"1.0.0\"\n",
            "\n",
            "[prebuilt.checksums]\n",
            "linux-amd64 = \"{}\"\n",
        ),
        checksum
    ))
    .expect("test manifest parses")
}

fn smoke_executor(binary: &Utf8Path, version: &str) -> StubExecutor {
    StubExecutor::new(vec![
        ExpectedCall::new(
            binary.as_str(),
            &["--version"],
            Ok(output_with_stdout(&format!(
                "domaindetails {version} (commit: abc1234, built: 2024-12-01T00:00:00Z)\n"
            ))),
        ),
        ExpectedCall::new(
            binary.as_str(),
            &["--help"],
            Ok(output_with_stdout("Usage:\n  domaindetails [command]\n")),
        ),
    ])
}

fn error(world: &InstallWorld) -> &InstallerError {
    match world.result.as_ref().expect("install was attempted") {
        Ok(outcome) => panic!("expected installation to fail, got {outcome:?}"),
        Err(err) => err,
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a release archive containing \"{name}\"")]
fn given_release_archive(world: &mut InstallWorld, name: String) {
    let path = world.temp.path().join("release.tar.gz");
    tar_gz_with(
        &path,
        &[
            ArchiveEntry::file("LICENSE", b"MIT"),
            ArchiveEntry::executable(&name, b"#!/bin/sh\n"),
        ],
    );
    world.archive = std::fs::read(&path).expect("read archive");
}

#[given("a manifest whose checksum matches the archive")]
fn given_matching_checksum(world: &mut InstallWorld) {
    world.checksum = sha256_hex(&world.archive);
}

#[given("a manifest whose checksum does not match the archive")]
fn given_mismatched_checksum(world: &mut InstallWorld) {
    world.checksum = sha256_hex(b"a different release");
}

#[given("a manifest with a placeholder checksum")]
fn given_placeholder_checksum(world: &mut InstallWorld) {
    world.checksum = "REPLACE_WITH_ACTUAL_SHA256_FOR_LINUX_AMD64".to_owned();
}

#[given("the installed binary reports version \"{version}\"")]
fn given_reported_version(world: &mut InstallWorld, version: String) {
    world.reported_version = version;
}

#[when("the prebuilt binary is installed")]
fn when_prebuilt_installed(world: &mut InstallWorld) {
    let manifest = manifest(&world.checksum);
    let downloader = InMemoryDownloader {
        bytes: &world.archive,
        requests: &world.requests,
    };
    let executor = smoke_executor(&world.prefix.join("bin/domaindetails"), &world.reported_version);
    let mut sink = Vec::new();
    let mut progress = Progress::new(&mut sink, true);

    let result = install(
        &manifest,
        PLATFORM,
        &world.prefix,
        InstallOptions {
            method: InstallMethod::Prebuilt,
            run_tests: true,
            force: false,
        },
        Collaborators {
            downloader: &downloader,
            extractor: &TarGzExtractor,
            executor: &executor,
        },
        &mut progress,
    );
    world.result = Some(result);
}

#[then("the binary is installed at \"{relative}\"")]
fn then_binary_installed(world: &mut InstallWorld, relative: String) {
    let outcome = match world.result.as_ref().expect("install was attempted") {
        Ok(outcome) => outcome,
        Err(err) => panic!("expected installation to succeed, got {err}"),
    };
    let expected = world.prefix.join(relative);
    assert_eq!(outcome.receipt.binary_path, expected);
    assert!(expected.is_file());
}

#[then("the install receipt records method \"{method}\"")]
fn then_receipt_records_method(world: &mut InstallWorld, method: String) {
    let receipt = InstallReceipt::read(&receipt_path(&world.prefix, "domaindetails"))
        .expect("read receipt")
        .expect("receipt written");
    assert_eq!(receipt.method.to_string(), method);
    assert_eq!(receipt.sha256.as_deref(), Some(world.checksum.as_str()));
}

#[then("installation fails with a checksum mismatch")]
fn then_checksum_mismatch(world: &mut InstallWorld) {
    let err = error(world);
    assert!(
        matches!(err, InstallerError::Verification(_)),
        "expected a verification error, got {err:?}"
    );
}

#[then("installation fails because the archive lacks the binary")]
fn then_binary_not_in_archive(world: &mut InstallWorld) {
    let err = error(world);
    assert!(
        matches!(err, InstallerError::BinaryNotInArchive { name } if name == "domaindetails"),
        "expected BinaryNotInArchive, got {err:?}"
    );
}

#[then("installation fails with a smoke test error")]
fn then_smoke_test_fails(world: &mut InstallWorld) {
    let err = error(world);
    assert!(
        matches!(err, InstallerError::SmokeTestFailed { .. }),
        "expected SmokeTestFailed, got {err:?}"
    );
    assert!(err.to_string().contains("1.0.0"));
}

#[then("installation is refused because the checksum is a placeholder")]
fn then_placeholder_refused(world: &mut InstallWorld) {
    let err = error(world);
    assert!(
        matches!(
            err,
            InstallerError::Formula(FormulaError::PlaceholderChecksum { .. })
        ),
        "expected PlaceholderChecksum, got {err:?}"
    );
}

#[then("nothing is installed")]
fn then_nothing_installed(world: &mut InstallWorld) {
    assert!(!world.prefix.join("bin/domaindetails").exists());
    assert!(!receipt_path(&world.prefix, "domaindetails").exists());
}

#[then("no download was attempted")]
fn then_no_download(world: &mut InstallWorld) {
    assert_eq!(world.requests.get(), 0);
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/install.feature", index = 0)]
fn scenario_prebuilt_install(world: InstallWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/install.feature", index = 1)]
fn scenario_checksum_mismatch(world: InstallWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/install.feature", index = 2)]
fn scenario_missing_binary(world: InstallWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/install.feature", index = 3)]
fn scenario_wrong_version(world: InstallWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/install.feature", index = 4)]
fn scenario_placeholder_checksum(world: InstallWorld) {
    let _ = world;
}
