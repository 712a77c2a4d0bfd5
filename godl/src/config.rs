//! Mirror configuration.
//!
//! Settings are read from an optional TOML file and then overridden by
//! command-line flags. Every key falls back to a default that reproduces a
//! plain mirror of the Go release catalog into the current directory, so an
//! empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! destination = "/srv/mirror/go"
//! excluded_versions = ["go1.0.1"]
//! os = ["linux", "darwin"]
//! download_timeout_secs = 1200
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// Listing endpoint for every published Go release.
pub const DEFAULT_CATALOG_URL: &str = "https://golang.org/dl/?mode=json&include=all";

/// Download URL template; `{filename}` is replaced by the artefact name.
pub const DEFAULT_DOWNLOAD_URL_TEMPLATE: &str = "https://golang.org/dl/{filename}";

/// Placeholder substituted in [`MirrorConfig::download_url_template`].
pub const FILENAME_PLACEHOLDER: &str = "{filename}";

const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 10 * 60;
const DEFAULT_MAX_BODY_BYTES: u64 = 1 << 29;
const CONFIG_FILENAME: &str = "config.toml";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read config file {path}")]
    Read {
        /// Path of the file that failed to load.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// Path of the malformed file.
        path: Utf8PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A setting holds a value the mirror cannot run with.
    #[error("invalid setting {key}: {reason}")]
    Invalid {
        /// Name of the offending key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Resolved settings for one mirror run.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// URL of the JSON release listing.
    pub catalog_url: String,
    /// Artefact URL template containing `{filename}`.
    pub download_url_template: String,
    /// Root under which one directory per release version is kept.
    pub destination: Utf8PathBuf,
    /// Versions skipped by exact match.
    pub excluded_versions: Vec<String>,
    /// Substrings marking a version as a pre-release.
    pub prerelease_markers: Vec<String>,
    /// Operating systems to mirror; empty mirrors every OS.
    pub os: Vec<String>,
    /// Architectures to mirror; empty mirrors every architecture.
    pub arch: Vec<String>,
    /// Artefact kinds to mirror; empty mirrors every kind.
    pub kind: Vec<String>,
    /// Deadline for fetching the listing, in seconds.
    pub catalog_timeout_secs: u64,
    /// Deadline for each artefact download, in seconds.
    pub download_timeout_secs: u64,
    /// Largest response body accepted, in bytes.
    pub max_body_bytes: u64,
    /// Hash each download before trusting it.
    pub verify_downloads: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_owned(),
            download_url_template: DEFAULT_DOWNLOAD_URL_TEMPLATE.to_owned(),
            destination: Utf8PathBuf::from("."),
            excluded_versions: Vec::new(),
            prerelease_markers: vec!["beta".to_owned(), "rc".to_owned()],
            os: Vec::new(),
            arch: Vec::new(),
            kind: Vec::new(),
            catalog_timeout_secs: DEFAULT_CATALOG_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            verify_downloads: false,
        }
    }
}

impl MirrorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it does not match the schema.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Load the explicit file when given, else the per-user default file
    /// when it exists, else the built-in defaults.
    ///
    /// # Errors
    ///
    /// Propagates [`MirrorConfig::load`] failures.
    pub fn load_or_default(explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                log::debug!("loading config from {path}");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Check that the settings describe a runnable mirror.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog_url.trim().is_empty() {
            return Err(invalid("catalog_url", "must not be empty"));
        }
        if !self.download_url_template.contains(FILENAME_PLACEHOLDER) {
            return Err(invalid(
                "download_url_template",
                format!("must contain {FILENAME_PLACEHOLDER}"),
            ));
        }
        if self.catalog_timeout_secs == 0 {
            return Err(invalid("catalog_timeout_secs", "must be greater than zero"));
        }
        if self.download_timeout_secs == 0 {
            return Err(invalid("download_timeout_secs", "must be greater than zero"));
        }
        if self.max_body_bytes == 0 {
            return Err(invalid("max_body_bytes", "must be greater than zero"));
        }
        if self.prerelease_markers.iter().any(String::is_empty) {
            return Err(invalid(
                "prerelease_markers",
                "an empty marker would skip every release",
            ));
        }
        Ok(())
    }

    /// Build the download URL for an artefact file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use godl::config::MirrorConfig;
    ///
    /// let config = MirrorConfig::default();
    /// let url = config.download_url("go1.21.0.linux-amd64.tar.gz");
    /// assert_eq!(url, "https://golang.org/dl/go1.21.0.linux-amd64.tar.gz");
    /// ```
    #[must_use]
    pub fn download_url(&self, filename: &str) -> String {
        self.download_url_template
            .replace(FILENAME_PLACEHOLDER, filename)
    }

    /// Deadline for the catalog request.
    #[must_use]
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    /// Deadline for each artefact request.
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Per-user configuration file, e.g. `~/.config/godl/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<Utf8PathBuf> {
    let dirs = directories_next::ProjectDirs::from("", "", "godl")?;
    let path = dirs.config_dir().join(CONFIG_FILENAME);
    Utf8PathBuf::from_path_buf(path).ok()
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}
