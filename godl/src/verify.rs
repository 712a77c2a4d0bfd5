//! Local integrity checks backed by hash sidecars.
//!
//! Each mirrored artefact `<dir>/<filename>` may have a sidecar
//! `<dir>/<filename>.sha` holding its lowercase hex SHA-256. The verifier
//! trusts a readable sidecar as-is and only hashes the artefact when the
//! sidecar is missing, writing one afterwards so the next run can skip the
//! work.
//!
//! Verification never fails: every problem becomes a [`Verdict`] other than
//! [`Verdict::Satisfied`] and is reported as a warning, which makes the
//! caller download the artefact again.
//!
//! Sidecars are read leniently: surrounding ASCII whitespace is trimmed, so a
//! digest followed by a newline verifies. Older mirrors treated any such
//! trailing byte as a malformed sidecar and fetched the artefact again.

use crate::catalog::{Artefact, HexDigest};
use crate::output::Console;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Read};

/// Suffix appended to an artefact path to name its sidecar.
pub const SIDECAR_SUFFIX: &str = ".sha";

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of checking one artefact against the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Size and digest match the catalog.
    Satisfied,
    /// No file exists at the target path.
    Missing,
    /// The file exists with the wrong size.
    SizeMismatch {
        /// Size declared by the catalog.
        expected: u64,
        /// Size found on disk.
        actual: u64,
    },
    /// The sidecar does not contain valid hex.
    MalformedSidecar,
    /// The recorded or computed digest differs from the catalog.
    HashMismatch {
        /// Digest published by the catalog.
        expected: HexDigest,
        /// Digest found in the sidecar or computed from the file.
        actual: HexDigest,
    },
    /// The file or its sidecar could not be read.
    Unreadable,
}

impl Verdict {
    /// Return true when no download is needed.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satisfied => f.write_str("satisfied"),
            Self::Missing => f.write_str("missing"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size is {actual}, should be {expected}")
            }
            Self::MalformedSidecar => f.write_str("malformed hash file"),
            Self::HashMismatch { expected, actual } => {
                write!(f, "sha does not match; expected {expected}, got {actual}")
            }
            Self::Unreadable => f.write_str("unreadable"),
        }
    }
}

/// Local path of an artefact inside a version directory.
#[must_use]
pub fn artefact_path(dir: &Utf8Path, artefact: &Artefact) -> Utf8PathBuf {
    dir.join(artefact.filename())
}

/// Sidecar path for an artefact path.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use godl::verify::sidecar_path;
///
/// let sidecar = sidecar_path(Utf8Path::new("go1.21.0/go1.21.0.src.tar.gz"));
/// assert_eq!(sidecar, "go1.21.0/go1.21.0.src.tar.gz.sha");
/// ```
#[must_use]
pub fn sidecar_path(target: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{target}{SIDECAR_SUFFIX}"))
}

/// Write `digest` as the sidecar for `target`, lowercased, no newline.
///
/// # Errors
///
/// Returns the underlying I/O error if the sidecar cannot be written.
pub fn write_sidecar(target: &Utf8Path, digest: &HexDigest) -> io::Result<Utf8PathBuf> {
    let path = sidecar_path(target);
    fs::write(&path, digest.as_str().to_ascii_lowercase())?;
    Ok(path)
}

/// Stream `reader` through SHA-256 using the caller's buffer.
///
/// # Errors
///
/// Returns the first read error other than [`io::ErrorKind::Interrupted`],
/// which is retried.
pub fn sha256_reader(reader: &mut dyn Read, buffer: &mut [u8]) -> io::Result<Vec<u8>> {
    let mut hasher = Sha256::new();
    loop {
        match reader.read(buffer) {
            Ok(0) => break,
            Ok(bytes_read) => hasher.update(&buffer[..bytes_read]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(hasher.finalize().to_vec())
}

/// Compute the SHA-256 of a file with a freshly allocated buffer.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn sha256_file(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    sha256_reader(&mut fs::File::open(path)?, &mut buffer)
}

/// Checks local artefacts against catalog metadata.
///
/// Holds one hashing buffer reused across every artefact of a run.
pub struct Verifier {
    buffer: Vec<u8>,
    persist_sidecars: bool,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    /// A verifier that records freshly computed digests as sidecars.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; HASH_BUFFER_SIZE],
            persist_sidecars: true,
        }
    }

    /// A verifier that never writes to disk.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            persist_sidecars: false,
            ..Self::new()
        }
    }

    /// Return true when `dir` already holds a verified copy of `artefact`.
    pub fn is_satisfied(
        &mut self,
        dir: &Utf8Path,
        artefact: &Artefact,
        console: &mut Console<'_>,
    ) -> bool {
        self.verify(dir, artefact, console).is_satisfied()
    }

    /// Check `artefact` inside `dir` and explain the outcome.
    pub fn verify(
        &mut self,
        dir: &Utf8Path,
        artefact: &Artefact,
        console: &mut Console<'_>,
    ) -> Verdict {
        let target = artefact_path(dir, artefact);
        let metadata = match fs::metadata(&target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{target} not present");
                return Verdict::Missing;
            }
            Err(e) => {
                console.warn(format!("could not stat \"{target}\": {e}"));
                return Verdict::Unreadable;
            }
        };

        if metadata.len() != artefact.size() {
            let verdict = Verdict::SizeMismatch {
                expected: artefact.size(),
                actual: metadata.len(),
            };
            console.warn(format!("\"{target}\": {verdict}"));
            return verdict;
        }

        let sidecar = sidecar_path(&target);
        match fs::read(&sidecar) {
            Ok(contents) => check_sidecar(&target, &sidecar, &contents, artefact, console),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.rehash(&target, artefact, console)
            }
            Err(e) => {
                console.warn(format!("could not read \"{sidecar}\": {e}"));
                Verdict::Unreadable
            }
        }
    }

    /// Hash the artefact, record the digest, and compare it to the catalog.
    fn rehash(
        &mut self,
        target: &Utf8Path,
        artefact: &Artefact,
        console: &mut Console<'_>,
    ) -> Verdict {
        debug!("hashing {target}");
        let digest = match fs::File::open(target)
            .and_then(|mut file| sha256_reader(&mut file, &mut self.buffer))
        {
            Ok(digest) => digest,
            Err(e) => {
                console.warn(format!("could not hash \"{target}\": {e}"));
                return Verdict::Unreadable;
            }
        };

        let actual = HexDigest::from_bytes(&digest);
        if self.persist_sidecars {
            if let Err(e) = write_sidecar(target, &actual) {
                console.warn(format!(
                    "could not write hash to \"{}\": {e}",
                    sidecar_path(target)
                ));
            }
        }

        compare(target, artefact, &digest, actual, console)
    }
}

fn check_sidecar(
    target: &Utf8Path,
    sidecar: &Utf8Path,
    contents: &[u8],
    artefact: &Artefact,
    console: &mut Console<'_>,
) -> Verdict {
    let text = contents.trim_ascii();
    let recorded = match hex::decode(text) {
        Ok(bytes) => bytes,
        Err(e) => {
            console.warn(format!("malformed hash file \"{sidecar}\": {e}"));
            return Verdict::MalformedSidecar;
        }
    };
    let actual = HexDigest::from(String::from_utf8_lossy(text).into_owned());
    compare(target, artefact, &recorded, actual, console)
}

fn compare(
    target: &Utf8Path,
    artefact: &Artefact,
    digest: &[u8],
    actual: HexDigest,
    console: &mut Console<'_>,
) -> Verdict {
    if artefact.expected_hash().matches(digest) {
        return Verdict::Satisfied;
    }
    let verdict = Verdict::HashMismatch {
        expected: artefact.expected_hash().clone(),
        actual,
    };
    console.warn(format!("\"{target}\" {verdict}"));
    verdict
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
