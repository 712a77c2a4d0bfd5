//! Fetch one artefact and record its sidecar.
//!
//! The body is streamed into a hidden staging file next to the target and
//! renamed into place once the transfer completes, so an interrupted
//! download never leaves a truncated file under the final name. The sidecar
//! is then written from the catalog's published digest. With
//! `verify_downloads` enabled the staged bytes are hashed first and a
//! mismatch discards them.

use crate::catalog::{Artefact, HexDigest};
use crate::config::MirrorConfig;
use crate::download::{DownloadError, Downloader};
use crate::output::Console;
use crate::verify::{artefact_path, sha256_file, write_sidecar};
use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use tempfile::NamedTempFile;

const STAGING_PREFIX: &str = ".godl-";
const STAGING_SUFFIX: &str = ".part";

/// Errors that leave an artefact unsatisfied until the next run.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The request failed or returned a non-200 status.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// No staging file could be created in the version directory.
    #[error("could not stage download in {dir}")]
    Staging {
        /// Version directory that rejected the staging file.
        dir: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Copying the body to disk failed part-way.
    #[error("transfer of {url} failed")]
    Transfer {
        /// URL being downloaded.
        url: String,
        /// Underlying read or write error.
        #[source]
        source: io::Error,
    },

    /// The transferred bytes do not match the catalog.
    #[error("download of {target} is corrupt: {reason}")]
    Corrupt {
        /// Final path the file would have taken.
        target: Utf8PathBuf,
        /// What did not match.
        reason: String,
    },

    /// The staged file could not be moved onto the target path.
    #[error("could not save {path}")]
    Save {
        /// Target path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Downloads artefacts into version directories.
pub struct Fetcher<'a> {
    downloader: &'a dyn Downloader,
    config: &'a MirrorConfig,
}

impl<'a> Fetcher<'a> {
    /// Create a fetcher using `downloader` and the URL template and
    /// verification setting from `config`.
    #[must_use]
    pub fn new(downloader: &'a dyn Downloader, config: &'a MirrorConfig) -> Self {
        Self { downloader, config }
    }

    /// Download `artefact` into `version_dir` and write its sidecar.
    ///
    /// A sidecar write failure is reported but does not fail the download.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the artefact could not be saved; no
    /// file or sidecar is left under the target name in that case.
    pub fn fetch(
        &self,
        version_dir: &Utf8Path,
        artefact: &Artefact,
        console: &mut Console<'_>,
    ) -> Result<Utf8PathBuf, PersistError> {
        let url = self.config.download_url(artefact.filename());
        let target = artefact_path(version_dir, artefact);

        console.progress(format!("getting {url}"));
        let mut body = self.downloader.open_artefact(&url).inspect_err(|e| {
            if let DownloadError::Status { status, .. } = e {
                console.progress(format!("-- response {status}"));
            }
        })?;
        console.progress("-- response 200");

        let mut staged = staging_file(version_dir).map_err(|source| PersistError::Staging {
            dir: version_dir.to_owned(),
            source,
        })?;
        let written = io::copy(&mut body, staged.as_file_mut()).map_err(|source| {
            PersistError::Transfer {
                url: url.clone(),
                source,
            }
        })?;
        log::debug!("received {written} bytes for {target}");

        if self.config.verify_downloads {
            check_staged(&staged, written, &target, artefact)?;
        }

        staged
            .persist(&target)
            .map_err(|e| PersistError::Save {
                path: target.clone(),
                source: e.error,
            })?;
        console.result(format!("downloaded \"{target}\""));

        match write_sidecar(&target, artefact.expected_hash()) {
            Ok(sidecar) => console.result(format!("saved hash \"{sidecar}\"")),
            Err(e) => console.warn(format!("could not write hash file for \"{target}\": {e}")),
        }
        Ok(target)
    }
}

/// Create a hidden staging file with the permissions of a normal download.
fn staging_file(dir: &Utf8Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGING_PREFIX).suffix(STAGING_SUFFIX);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }
    builder.tempfile_in(dir)
}

/// Compare the staged bytes with the catalog before trusting them.
fn check_staged(
    staged: &NamedTempFile,
    written: u64,
    target: &Utf8Path,
    artefact: &Artefact,
) -> Result<(), PersistError> {
    let corrupt = |reason: String| PersistError::Corrupt {
        target: target.to_owned(),
        reason,
    };
    if written != artefact.size() {
        return Err(corrupt(format!(
            "received {written} bytes, expected {}",
            artefact.size()
        )));
    }
    let staged_path = Utf8Path::from_path(staged.path())
        .ok_or_else(|| corrupt("staging path is not valid UTF-8".to_owned()))?;
    let digest = sha256_file(staged_path).map_err(|e| corrupt(format!("could not hash: {e}")))?;
    if !artefact.expected_hash().matches(&digest) {
        return Err(corrupt(format!(
            "sha does not match; expected {}, got {}",
            artefact.expected_hash(),
            HexDigest::from_bytes(&digest)
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
