//! Tests for sidecar-backed verification.

use super::*;
use crate::test_utils::{artefact_for, artefact_json, sha256_hex};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const CONTENT: &[u8] = b"go release archive bytes";

struct Workspace {
    _temp: TempDir,
    dir: Utf8PathBuf,
    artefact: Artefact,
}

impl Workspace {
    fn target(&self) -> Utf8PathBuf {
        artefact_path(&self.dir, &self.artefact)
    }

    fn write_target(&self, bytes: &[u8]) {
        fs::write(self.target(), bytes).expect("write artefact");
    }

    fn write_sidecar_text(&self, text: &str) {
        fs::write(sidecar_path(&self.target()), text).expect("write sidecar");
    }

    fn read_sidecar(&self) -> Option<String> {
        fs::read_to_string(sidecar_path(&self.target())).ok()
    }
}

#[fixture]
fn workspace() -> Workspace {
    let temp = tempfile::tempdir().expect("temp dir");
    let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    Workspace {
        _temp: temp,
        dir,
        artefact: artefact_for("go1.21.0", "go1.21.0.src.tar.gz", CONTENT),
    }
}

fn verify_with(verifier: &mut Verifier, ws: &Workspace) -> (Verdict, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let verdict = {
        let mut console = Console::new(&mut stdout, &mut stderr);
        verifier.verify(&ws.dir, &ws.artefact, &mut console)
    };
    assert!(stdout.is_empty(), "verification never writes results");
    (verdict, String::from_utf8(stderr).expect("UTF-8 stderr"))
}

fn verify(ws: &Workspace) -> (Verdict, String) {
    verify_with(&mut Verifier::new(), ws)
}

#[rstest]
fn missing_file_is_reported_quietly(workspace: Workspace) {
    let (verdict, stderr) = verify(&workspace);
    assert_eq!(verdict, Verdict::Missing);
    assert!(stderr.is_empty());
    assert!(workspace.read_sidecar().is_none());
}

#[rstest]
fn size_mismatch_is_unsatisfied(workspace: Workspace) {
    workspace.write_target(b"short");
    let (verdict, stderr) = verify(&workspace);
    assert_eq!(
        verdict,
        Verdict::SizeMismatch {
            expected: CONTENT.len() as u64,
            actual: 5,
        }
    );
    assert!(stderr.contains("should be"), "stderr: {stderr}");
    assert!(workspace.read_sidecar().is_none(), "no hashing on size mismatch");
}

#[rstest]
fn missing_sidecar_is_recomputed_and_saved(workspace: Workspace) {
    workspace.write_target(CONTENT);
    let (verdict, stderr) = verify(&workspace);
    assert_eq!(verdict, Verdict::Satisfied);
    assert!(stderr.is_empty());
    assert_eq!(workspace.read_sidecar(), Some(sha256_hex(CONTENT)));
}

#[rstest]
fn read_only_verifier_leaves_no_sidecar(workspace: Workspace) {
    workspace.write_target(CONTENT);
    let (verdict, _) = verify_with(&mut Verifier::read_only(), &workspace);
    assert!(verdict.is_satisfied());
    assert!(workspace.read_sidecar().is_none());
}

#[rstest]
fn matching_sidecar_is_trusted_without_hashing(workspace: Workspace) {
    let same_size = vec![b'x'; CONTENT.len()];
    workspace.write_target(&same_size);
    workspace.write_sidecar_text(&sha256_hex(CONTENT));
    let (verdict, _) = verify(&workspace);
    assert_eq!(verdict, Verdict::Satisfied);
}

#[rstest]
#[case::trailing_newline("\n")]
#[case::crlf("\r\n")]
fn sidecar_whitespace_is_ignored(workspace: Workspace, #[case] suffix: &str) {
    workspace.write_target(CONTENT);
    workspace.write_sidecar_text(&format!("{}{suffix}", sha256_hex(CONTENT)));
    let (verdict, _) = verify(&workspace);
    assert_eq!(verdict, Verdict::Satisfied);
}

#[rstest]
#[case::not_hex("not a digest")]
#[case::odd_length("abc")]
fn malformed_sidecar_forces_download(workspace: Workspace, #[case] text: &str) {
    workspace.write_target(CONTENT);
    workspace.write_sidecar_text(text);
    let (verdict, stderr) = verify(&workspace);
    assert_eq!(verdict, Verdict::MalformedSidecar);
    assert!(stderr.contains("malformed hash file"), "stderr: {stderr}");
}

#[rstest]
fn stale_sidecar_is_a_mismatch(workspace: Workspace) {
    workspace.write_target(CONTENT);
    workspace.write_sidecar_text(&"ab".repeat(32));
    let (verdict, stderr) = verify(&workspace);
    assert!(matches!(verdict, Verdict::HashMismatch { .. }));
    assert!(stderr.contains("sha does not match"), "stderr: {stderr}");
}

#[rstest]
fn tampered_file_is_detected_when_rehashing(workspace: Workspace) {
    let mut tampered = CONTENT.to_vec();
    tampered[0] ^= 0xff;
    workspace.write_target(&tampered);

    let (verdict, _) = verify(&workspace);
    assert_eq!(
        verdict,
        Verdict::HashMismatch {
            expected: HexDigest::from(sha256_hex(CONTENT)),
            actual: HexDigest::from(sha256_hex(&tampered)),
        }
    );
    assert_eq!(workspace.read_sidecar(), Some(sha256_hex(&tampered)));

    let (second, _) = verify(&workspace);
    assert!(!second.is_satisfied(), "recorded digest still disagrees");
}

#[rstest]
fn digest_comparison_ignores_case(workspace: Workspace) {
    let json = artefact_json(
        "go1.21.0",
        "go1.21.0.src.tar.gz",
        &sha256_hex(CONTENT).to_ascii_uppercase(),
        CONTENT.len() as u64,
    );
    let ws = Workspace {
        artefact: serde_json::from_str(&json).expect("artefact JSON"),
        ..workspace
    };
    ws.write_target(CONTENT);
    ws.write_sidecar_text(&sha256_hex(CONTENT));
    let (verdict, _) = verify(&ws);
    assert_eq!(verdict, Verdict::Satisfied);
}

#[rstest]
fn written_sidecar_is_lowercase_without_newline(workspace: Workspace) {
    workspace.write_target(CONTENT);
    let digest = HexDigest::from("ABCDEF0123");
    let path = write_sidecar(&workspace.target(), &digest).expect("write sidecar");
    assert_eq!(path, sidecar_path(&workspace.target()));
    assert_eq!(fs::read_to_string(path).expect("read"), "abcdef0123");
}

#[test]
fn hashing_with_a_small_buffer_matches_one_shot_digest() {
    let data = vec![7u8; 10_000];
    let mut buffer = [0u8; 7];
    let digest = sha256_reader(&mut data.as_slice(), &mut buffer).expect("hash");
    assert_eq!(HexDigest::from_bytes(&digest).as_str(), sha256_hex(&data));
}

#[test]
fn verdicts_explain_themselves() {
    let verdict = Verdict::SizeMismatch {
        expected: 10,
        actual: 4,
    };
    assert_eq!(verdict.to_string(), "size is 4, should be 10");
    assert_eq!(Verdict::MalformedSidecar.to_string(), "malformed hash file");
}

#[rstest]
fn unreadable_sidecar_is_reported(workspace: Workspace) {
    workspace.write_target(CONTENT);
    fs::create_dir(sidecar_path(&workspace.target())).expect("sidecar as directory");

    let (verdict, stderr) = verify(&workspace);
    assert_eq!(verdict, Verdict::Unreadable);
    assert!(stderr.contains("could not read"), "stderr: {stderr}");
}

#[cfg(unix)]
#[rstest]
fn sidecar_write_failure_keeps_the_verdict(workspace: Workspace) {
    workspace.write_target(CONTENT);
    let dangling = workspace.dir.join("missing").join("target.sha");
    std::os::unix::fs::symlink(&dangling, sidecar_path(&workspace.target()))
        .expect("dangling sidecar link");

    let (verdict, stderr) = verify(&workspace);
    assert_eq!(verdict, Verdict::Satisfied);
    assert!(stderr.contains("could not write hash to"), "stderr: {stderr}");
    assert!(!dangling.exists());
}

/// Yields one `Interrupted` error before each chunk of data.
struct FlakyReader<'a> {
    data: &'a [u8],
    interrupt_next: bool,
}

impl Read for FlakyReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt_next && !self.data.is_empty() {
            self.interrupt_next = false;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.interrupt_next = true;
        let n = self.data.len().min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[test]
fn interrupted_reads_are_retried() {
    let data = vec![3u8; 1_000];
    let mut reader = FlakyReader {
        data: &data,
        interrupt_next: true,
    };
    let mut buffer = [0u8; 64];
    let digest = sha256_reader(&mut reader, &mut buffer).expect("interruptions are retried");
    assert_eq!(HexDigest::from_bytes(&digest).as_str(), sha256_hex(&data));
}

#[test]
fn other_read_errors_are_returned() {
    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk gone"))
        }
    }
    let err = sha256_reader(&mut Broken, &mut [0u8; 8]).expect_err("error surfaces");
    assert_eq!(err.to_string(), "disk gone");
}
