//! Run-level error types.
//!
//! Only failures that abort the whole run live here. Release and artefact
//! failures are reported through the console by the reconciliation loop and
//! never surface as a [`MirrorError`].

use crate::catalog::CatalogParseError;
use crate::config::ConfigError;
use crate::download::DownloadError;
use std::error::Error as StdError;
use thiserror::Error;

/// Errors that stop a mirror run.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The catalog source could not be reached.
    #[error("error visiting {url}")]
    CatalogUnavailable {
        /// The listing URL.
        url: String,
        /// The underlying download failure.
        #[source]
        source: DownloadError,
    },

    /// The catalog body is not a valid listing.
    #[error("error parsing body")]
    CatalogInvalid {
        /// The underlying parse failure.
        #[source]
        source: CatalogParseError,
    },

    /// The destination root cannot be used.
    #[error("destination {path} is not a usable directory")]
    Destination {
        /// The configured destination.
        path: camino::Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for run-level results.
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Render an error and its source chain as `outer: inner: innermost`.
///
/// # Examples
///
/// ```
/// use godl::error::describe;
///
/// let err = std::io::Error::other("disk full");
/// assert_eq!(describe(&err), "disk full");
/// ```
#[must_use]
pub fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
