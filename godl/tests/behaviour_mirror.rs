//! BDD tests for mirroring releases into a destination tree.

use camino::Utf8PathBuf;
use godl::config::MirrorConfig;
use godl::error::{MirrorError, describe};
use godl::mirror::run_mirror_with;
use godl::output::Console;
use godl::reconcile::RunSummary;
use godl::test_utils::{
    StubDownloader, StubResponse, artefact_json, catalog_json, release_json, sha256_hex,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const ARCHIVE: &[u8] = b"fake go source archive";

#[derive(Default)]
struct MirrorWorld {
    _temp_dir: Option<tempfile::TempDir>,
    root: Option<Utf8PathBuf>,
    version: Option<String>,
    listing: Option<StubResponse>,
    artefact_response: Option<StubResponse>,
    dry_run: bool,
    requested: Vec<String>,
    result: Option<Result<RunSummary, MirrorError>>,
    stdout: String,
    stderr: String,
}

impl MirrorWorld {
    fn root(&self) -> &Utf8PathBuf {
        self.root.as_ref().expect("root set")
    }

    fn version(&self) -> &str {
        self.version.as_deref().expect("version set")
    }

    fn filename(&self) -> String {
        format!("{}.src.tar.gz", self.version())
    }

    fn url(&self) -> String {
        format!("https://golang.org/dl/{}", self.filename())
    }

    fn target(&self) -> Utf8PathBuf {
        self.root().join(self.version()).join(self.filename())
    }

    fn sidecar(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}.sha", self.target()))
    }

    fn seed_artefact(&self) {
        std::fs::create_dir_all(self.root().join(self.version())).expect("create version dir");
        std::fs::write(self.target(), ARCHIVE).expect("write artefact");
    }
}

#[fixture]
fn world() -> MirrorWorld {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 path");
    MirrorWorld {
        _temp_dir: Some(temp_dir),
        root: Some(root),
        ..Default::default()
    }
}

#[given("a listing with release \"{version}\" and one artefact")]
fn given_listing(world: &mut MirrorWorld, version: String) {
    let filename = format!("{version}.src.tar.gz");
    let listing = catalog_json(&[release_json(
        &version,
        true,
        &[artefact_json(
            &version,
            &filename,
            &sha256_hex(ARCHIVE),
            ARCHIVE.len() as u64,
        )],
    )]);
    world.version = Some(version);
    world.listing = Some(StubResponse::Body(listing.into_bytes()));
    world.artefact_response = Some(StubResponse::Body(ARCHIVE.to_vec()));
}

#[given("the listing cannot be reached")]
fn given_unreachable_listing(world: &mut MirrorWorld) {
    world.listing = Some(StubResponse::Transport("connection refused".to_owned()));
}

#[given("the artefact and its sidecar are already mirrored")]
fn given_mirrored(world: &mut MirrorWorld) {
    world.seed_artefact();
    std::fs::write(world.sidecar(), sha256_hex(ARCHIVE)).expect("write sidecar");
}

#[given("the artefact is present without a sidecar")]
fn given_present_without_sidecar(world: &mut MirrorWorld) {
    world.seed_artefact();
}

#[given("the server answers {status} for the artefact")]
fn given_status(world: &mut MirrorWorld, status: u16) {
    world.artefact_response = Some(StubResponse::Status(status));
}

#[given("a dry run is requested")]
fn given_dry_run(world: &mut MirrorWorld) {
    world.dry_run = true;
}

#[when("the mirror runs")]
fn when_mirror_runs(world: &mut MirrorWorld) {
    let listing = world.listing.take().expect("listing behaviour set");
    let mut downloader = StubDownloader::with_catalog_response(listing);
    if let Some(response) = world.artefact_response.take() {
        downloader = downloader.respond(world.url(), response);
    }
    let config = MirrorConfig {
        destination: world.root().clone(),
        ..MirrorConfig::default()
    };

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let result = {
        let mut console = Console::new(&mut stdout, &mut stderr);
        run_mirror_with(&config, &downloader, world.dry_run, &mut console)
    };
    world.requested = downloader.requested();
    world.result = Some(result);
    world.stdout = String::from_utf8(stdout).expect("UTF-8 stdout");
    world.stderr = String::from_utf8(stderr).expect("UTF-8 stderr");
}

#[then("the run succeeds")]
fn then_run_succeeds(world: &mut MirrorWorld) {
    let result = world.result.as_ref().expect("result set");
    assert!(result.is_ok(), "expected success, got {result:?}");
}

#[then("the run fails with \"{text}\"")]
fn then_run_fails(world: &mut MirrorWorld, text: String) {
    match world.result.as_ref().expect("result set") {
        Err(err) => {
            let message = describe(err);
            assert!(message.contains(&text), "expected '{text}' in: {message}");
        }
        Ok(summary) => panic!("expected failure, got {summary:?}"),
    }
}

#[then("the directory \"{version}\" exists")]
fn then_directory_exists(world: &mut MirrorWorld, version: String) {
    assert!(world.root().join(version).is_dir());
}

#[then("the directory \"{version}\" does not exist")]
fn then_directory_absent(world: &mut MirrorWorld, version: String) {
    assert!(!world.root().join(version).exists());
}

#[then("the artefact is saved with the published hash")]
fn then_saved_with_hash(world: &mut MirrorWorld) {
    assert_eq!(std::fs::read(world.target()).expect("artefact"), ARCHIVE);
    assert_eq!(
        std::fs::read_to_string(world.sidecar()).expect("sidecar"),
        sha256_hex(ARCHIVE)
    );
}

#[then("no artefact is requested")]
fn then_nothing_requested(world: &mut MirrorWorld) {
    assert!(
        world.requested.is_empty(),
        "unexpected requests: {:?}",
        world.requested
    );
}

#[then("no artefact file or sidecar exists")]
fn then_nothing_saved(world: &mut MirrorWorld) {
    assert!(!world.target().exists());
    assert!(!world.sidecar().exists());
}

#[then("stdout mentions \"{text}\"")]
fn then_stdout_mentions(world: &mut MirrorWorld, text: String) {
    assert!(
        world.stdout.contains(&text),
        "expected '{text}' in stdout: {}",
        world.stdout
    );
}

#[then("stderr mentions \"{text}\"")]
fn then_stderr_mentions(world: &mut MirrorWorld, text: String) {
    assert!(
        world.stderr.contains(&text),
        "expected '{text}' in stderr: {}",
        world.stderr
    );
}

#[scenario(
    path = "tests/features/mirror.feature",
    name = "Fresh release is downloaded"
)]
fn scenario_fresh_release(world: MirrorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/mirror.feature",
    name = "Mirrored artefact is not downloaded again"
)]
fn scenario_already_mirrored(world: MirrorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/mirror.feature",
    name = "Missing sidecar is rebuilt from the file"
)]
fn scenario_missing_sidecar(world: MirrorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/mirror.feature",
    name = "Pre-release is skipped"
)]
fn scenario_prerelease(world: MirrorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/mirror.feature",
    name = "Server error leaves nothing behind"
)]
fn scenario_server_error(world: MirrorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/mirror.feature",
    name = "Unreachable listing fails the run"
)]
fn scenario_unreachable_listing(world: MirrorWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/mirror.feature",
    name = "Dry run writes nothing"
)]
fn scenario_dry_run(world: MirrorWorld) {
    let _ = world;
}
