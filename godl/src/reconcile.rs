//! The reconciliation loop.
//!
//! Walks the catalog in order, one release and one artefact at a time:
//! skipped releases and artefacts are reported and passed over, each kept
//! release gets a directory named after its version, and every artefact the
//! [`Verifier`] does not accept is handed to the [`Fetcher`].
//!
//! Failures never cross their own scope. A release whose directory cannot be
//! prepared is abandoned without touching its siblings, and a failed
//! artefact is left for the next run while the loop moves on.

use crate::catalog::{Artefact, Catalog, Release};
use crate::config::MirrorConfig;
use crate::download::Downloader;
use crate::error::describe;
use crate::output::Console;
use crate::persist::Fetcher;
use crate::policy::SkipPolicy;
use crate::verify::Verifier;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Counters describing one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Releases skipped by policy.
    pub releases_skipped: usize,
    /// Releases abandoned because their directory was unusable.
    pub releases_failed: usize,
    /// Artefacts skipped by policy.
    pub artefacts_skipped: usize,
    /// Artefacts already verified on disk.
    pub already_present: usize,
    /// Artefacts downloaded during this run.
    pub downloaded: usize,
    /// Artefacts whose download failed.
    pub failed: usize,
    /// Artefacts that would be downloaded (dry run only).
    pub pending: usize,
}

impl RunSummary {
    /// Human-readable one-line summary.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} downloaded, {} already present, {} failed, {} skipped",
            self.downloaded, self.already_present, self.failed, self.artefacts_skipped
        );
        if self.pending > 0 {
            line.push_str(&format!(", {} pending", self.pending));
        }
        if self.releases_skipped > 0 || self.releases_failed > 0 {
            line.push_str(&format!(
                " ({} releases skipped, {} releases failed)",
                self.releases_skipped, self.releases_failed
            ));
        }
        line
    }
}

/// Errors preparing a release directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The version cannot be used as a single directory name.
    #[error("version {version:?} is not a plain directory name")]
    UnsafeName {
        /// The offending version string.
        version: String,
    },

    /// Something other than a directory occupies the path.
    #[error("\"{path}\" is not a directory")]
    NotADirectory {
        /// The conflicting path.
        path: Utf8PathBuf,
    },

    /// The path could not be inspected.
    #[error("could not stat \"{path}\"")]
    Stat {
        /// The path being inspected.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The directory could not be created.
    #[error("could not create \"{path}\"")]
    Create {
        /// The directory being created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// State of a release directory before the loop touches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryState {
    /// The directory already exists.
    Present(Utf8PathBuf),
    /// Nothing exists at the path yet.
    Absent(Utf8PathBuf),
}

/// Inspect `<root>/<version>` without modifying anything.
///
/// # Errors
///
/// Returns [`DirectoryError`] for an unsafe name, a conflicting
/// non-directory entry, or an unreadable path.
pub fn inspect_version_dir(
    root: &Utf8Path,
    version: &str,
) -> Result<DirectoryState, DirectoryError> {
    if !is_plain_name(version) {
        return Err(DirectoryError::UnsafeName {
            version: version.to_owned(),
        });
    }
    let path = root.join(version);
    match fs::metadata(&path) {
        Ok(metadata) if metadata.is_dir() => Ok(DirectoryState::Present(path)),
        Ok(_) => Err(DirectoryError::NotADirectory { path }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DirectoryState::Absent(path)),
        Err(source) => Err(DirectoryError::Stat { path, source }),
    }
}

/// Ensure `<root>/<version>` exists as a directory and return its path.
///
/// An existing non-directory entry is reported, never replaced.
///
/// # Errors
///
/// Returns [`DirectoryError`] when the directory cannot be used.
pub fn ensure_version_dir(root: &Utf8Path, version: &str) -> Result<Utf8PathBuf, DirectoryError> {
    match inspect_version_dir(root, version)? {
        DirectoryState::Present(path) => Ok(path),
        DirectoryState::Absent(path) => match fs::create_dir(&path) {
            Ok(()) => Ok(path),
            Err(source) => Err(DirectoryError::Create { path, source }),
        },
    }
}

/// Return true when `name` is exactly one normal path component.
fn is_plain_name(name: &str) -> bool {
    let mut components = Utf8Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Utf8Component::Normal(part)), None) if part == name
    )
}

/// Drives a run over a parsed catalog.
pub struct Reconciler<'a> {
    destination: &'a Utf8Path,
    policy: SkipPolicy,
    fetcher: Fetcher<'a>,
    verifier: Verifier,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler that downloads with `downloader`.
    #[must_use]
    pub fn new(config: &'a MirrorConfig, downloader: &'a dyn Downloader) -> Self {
        Self {
            destination: &config.destination,
            policy: SkipPolicy::from_config(config),
            fetcher: Fetcher::new(downloader, config),
            verifier: Verifier::new(),
            dry_run: false,
        }
    }

    /// Report what would happen without writing anything.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self.verifier = if dry_run {
            Verifier::read_only()
        } else {
            Verifier::new()
        };
        self
    }

    /// Reconcile every release in catalog order.
    pub fn run(&mut self, catalog: &Catalog, console: &mut Console<'_>) -> RunSummary {
        let mut summary = RunSummary::default();
        for release in catalog {
            self.reconcile_release(release, console, &mut summary);
        }
        summary
    }

    fn reconcile_release(
        &mut self,
        release: &Release,
        console: &mut Console<'_>,
        summary: &mut RunSummary,
    ) {
        let version = release.version();
        if let Some(reason) = self.policy.skip_release(release) {
            console.progress(format!("skipping {version}: {reason}"));
            summary.releases_skipped += 1;
            return;
        }

        let Some(dir) = self.prepare_dir(version, console) else {
            summary.releases_failed += 1;
            return;
        };

        for artefact in release.artefacts() {
            self.reconcile_artefact(version, &dir, artefact, console, summary);
        }
    }

    fn prepare_dir(&self, version: &str, console: &mut Console<'_>) -> Option<Utf8PathBuf> {
        let prepared = if self.dry_run {
            inspect_version_dir(self.destination, version).map(|state| match state {
                DirectoryState::Present(path) => path,
                DirectoryState::Absent(path) => {
                    console.progress(format!("would create \"{path}\""));
                    path
                }
            })
        } else {
            ensure_version_dir(self.destination, version)
        };
        prepared
            .inspect_err(|e| console.warn(format!("skipping {version}: {}", describe(e))))
            .ok()
    }

    fn reconcile_artefact(
        &mut self,
        version: &str,
        dir: &Utf8Path,
        artefact: &Artefact,
        console: &mut Console<'_>,
        summary: &mut RunSummary,
    ) {
        let filename = artefact.filename();
        if let Some(reason) = self.policy.skip_artefact(artefact) {
            console.progress(format!("skipping {version}/{filename}: {reason}"));
            summary.artefacts_skipped += 1;
            return;
        }
        if !is_plain_name(filename) {
            console.warn(format!(
                "skipping {version}/{filename}: not a plain file name"
            ));
            summary.failed += 1;
            return;
        }

        if self.verifier.is_satisfied(dir, artefact, console) {
            console.result(format!("{version}/{filename} already downloaded"));
            summary.already_present += 1;
            return;
        }

        console.result(format!(
            "{version}/{filename} = {}",
            artefact.expected_hash()
        ));
        if self.dry_run {
            summary.pending += 1;
            return;
        }

        match self.fetcher.fetch(dir, artefact, console) {
            Ok(_) => summary.downloaded += 1,
            Err(e) => {
                console.warn(format!(
                    "could not download {version}/{filename}: {}",
                    describe(&e)
                ));
                summary.failed += 1;
            }
        }
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
