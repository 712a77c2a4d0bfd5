//! Skip rules for releases and artefacts.
//!
//! Both predicates are pure. A release is skipped when its version is
//! excluded outright or contains a pre-release marker; an artefact is
//! skipped when its catalog metadata is unusable or it falls outside the
//! configured platform filters.
//!
//! Marker detection is a plain substring test, so `go1.2.0-rcdoc` counts as
//! a pre-release just like `go1.21rc4`.

use crate::catalog::{Artefact, Release};
use crate::config::MirrorConfig;
use std::fmt;

/// Why a release was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSkip {
    /// The version appears in the exclusion list.
    Excluded,
    /// The version contains the given pre-release marker.
    PreRelease {
        /// The marker that matched.
        marker: String,
    },
}

impl fmt::Display for ReleaseSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded => f.write_str("excluded version"),
            Self::PreRelease { marker } => write!(f, "pre-release ({marker})"),
        }
    }
}

/// Why an artefact was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtefactSkip {
    /// The catalog declares a zero size.
    ZeroSize,
    /// The catalog publishes no digest.
    MissingHash,
    /// The artefact's OS, architecture, or kind is not selected.
    Filtered,
}

impl fmt::Display for ArtefactSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => f.write_str("declared size is zero"),
            Self::MissingHash => f.write_str("no published hash"),
            Self::Filtered => f.write_str("filtered"),
        }
    }
}

/// Release and artefact selection rules for a run.
///
/// # Examples
///
/// ```
/// use godl::policy::{ReleaseSkip, SkipPolicy};
///
/// let policy = SkipPolicy::default();
/// assert_eq!(policy.release_skip_for("go1.21.0"), None);
/// assert!(matches!(
///     policy.release_skip_for("go1.21rc2"),
///     Some(ReleaseSkip::PreRelease { .. })
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipPolicy {
    excluded_versions: Vec<String>,
    prerelease_markers: Vec<String>,
    os: Vec<String>,
    arch: Vec<String>,
    kind: Vec<String>,
}

impl SkipPolicy {
    /// Derive the policy from the run configuration.
    #[must_use]
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self {
            excluded_versions: config.excluded_versions.clone(),
            prerelease_markers: config.prerelease_markers.clone(),
            os: config.os.clone(),
            arch: config.arch.clone(),
            kind: config.kind.clone(),
        }
    }

    /// Return the reason a release should be skipped, if any.
    #[must_use]
    pub fn skip_release(&self, release: &Release) -> Option<ReleaseSkip> {
        self.release_skip_for(release.version())
    }

    /// Version-string form of [`SkipPolicy::skip_release`].
    #[must_use]
    pub fn release_skip_for(&self, version: &str) -> Option<ReleaseSkip> {
        if self.excluded_versions.iter().any(|v| v == version) {
            return Some(ReleaseSkip::Excluded);
        }
        self.prerelease_markers
            .iter()
            .find(|marker| version.contains(marker.as_str()))
            .map(|marker| ReleaseSkip::PreRelease {
                marker: marker.clone(),
            })
    }

    /// Return the reason an artefact should be skipped, if any.
    #[must_use]
    pub fn skip_artefact(&self, artefact: &Artefact) -> Option<ArtefactSkip> {
        if artefact.size() == 0 {
            return Some(ArtefactSkip::ZeroSize);
        }
        if artefact.expected_hash().is_empty() {
            return Some(ArtefactSkip::MissingHash);
        }
        let selected = allows(&self.os, artefact.os())
            && allows(&self.arch, artefact.arch())
            && allows(&self.kind, artefact.kind());
        (!selected).then_some(ArtefactSkip::Filtered)
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::from_config(&MirrorConfig::default())
    }
}

fn allows(allow_list: &[String], value: &str) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|allowed| allowed == value)
}
