//! Release catalog types.
//!
//! The catalog is an ordered list of releases, each owning an ordered list
//! of downloadable artefacts. Values are produced by
//! [`parse_catalog`](super::parser::parse_catalog) and are read-only
//! afterwards; field names follow the upstream JSON listing.

use super::hash::HexDigest;
use serde::{Deserialize, Deserializer, Serialize};

/// One downloadable file belonging to a release.
///
/// # Examples
///
/// ```
/// use godl::catalog::model::Artefact;
///
/// let json = concat!(
///     r#"{"filename":"go1.21.0.linux-amd64.tar.gz","os":"linux","arch":"amd64","#,
///     r#""version":"go1.21.0","sha256":"00ff","size":1000,"kind":"archive"}"#,
/// );
/// let artefact: Artefact = serde_json::from_str(json).expect("valid artefact");
/// assert_eq!(artefact.size(), 1000);
/// assert_eq!(artefact.kind(), "archive");
/// ```
///
/// Absent fields decode as empty strings or zero, which the skip policy then
/// treats as unusable metadata for this artefact alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artefact {
    filename: String,
    os: String,
    arch: String,
    version: String,
    sha256: HexDigest,
    size: u64,
    kind: String,
}

impl Artefact {
    /// File name, unique within a version, OS, and architecture.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Target operating system; empty for source archives.
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Target architecture; empty for source archives.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Release version the artefact belongs to.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Published SHA-256 digest; may be empty.
    #[must_use]
    pub fn expected_hash(&self) -> &HexDigest {
        &self.sha256
    }

    /// Declared size in bytes; may be zero.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Artefact kind such as `archive`, `installer`, or `source`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// A published release and its artefacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    version: String,
    stable: bool,
    #[serde(deserialize_with = "null_as_empty")]
    files: Vec<Artefact>,
}

/// Decode `null` as an empty artefact list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Artefact>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Artefact>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Release {
    /// Version string, also used verbatim as the local directory name.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether upstream flags this release as stable.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    /// Artefacts in catalog order.
    #[must_use]
    pub fn artefacts(&self) -> &[Artefact] {
        &self.files
    }
}

/// The full release listing in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(Vec<Release>);

impl Catalog {
    /// Releases in catalog order.
    #[must_use]
    pub fn releases(&self) -> &[Release] {
        &self.0
    }

    /// Number of releases listed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true when the listing has no releases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of artefacts across every release.
    #[must_use]
    pub fn artefact_count(&self) -> usize {
        self.0.iter().map(|release| release.files.len()).sum()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Release;
    type IntoIter = std::slice::Iter<'a, Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
