//! HTTP retrieval of the release listing and artefact bodies.
//!
//! Provides a trait-based abstraction so the reconciliation loop can be
//! driven by a stub in tests, and a blocking `ureq` implementation with
//! separate deadlines for the listing and for artefact transfers.

use crate::config::MirrorConfig;
use std::io::Read;
use std::time::Duration;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("godl/", env!("CARGO_PKG_VERSION"));

/// HTTP status that counts as success; every other status is a failure.
const STATUS_OK: u16 = 200;

/// Trait for fetching release data over HTTP.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
#[cfg_attr(test, mockall::automock)]
pub trait Downloader {
    /// Fetch the complete listing body from `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-200 status, or a body
    /// larger than the configured limit.
    fn fetch_catalog(&self, url: &str) -> Result<Vec<u8>, DownloadError>;

    /// Open a streaming body for the artefact at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-200 status. Reads
    /// from the returned stream fail once the body exceeds the limit.
    fn open_artefact(&self, url: &str) -> Result<Box<dyn Read>, DownloadError>;
}

/// Errors arising from HTTP operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The request could not be completed.
    #[error("could not visit {url}: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered with a status other than 200.
    #[error("{url} responded with status {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code received.
        status: u16,
    },

    /// The response body could not be read.
    #[error("could not read body of {url}")]
    Body {
        /// The URL that was requested.
        url: String,
        /// Underlying read error.
        #[source]
        source: std::io::Error,
    },
}

/// HTTP-based downloader using `ureq`.
pub struct HttpDownloader {
    catalog_agent: ureq::Agent,
    artefact_agent: ureq::Agent,
    max_body_bytes: u64,
}

impl HttpDownloader {
    /// Build agents from the timeouts and body limit in `config`.
    #[must_use]
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            catalog_agent: agent_with_timeout(config.catalog_timeout()),
            artefact_agent: agent_with_timeout(config.download_timeout()),
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn get(
        &self,
        agent: &ureq::Agent,
        url: &str,
    ) -> Result<ureq::http::Response<ureq::Body>, DownloadError> {
        let response = agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| DownloadError::Transport {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        let status = response.status().as_u16();
        log::debug!("{url} -> {status}");
        if status != STATUS_OK {
            return Err(DownloadError::Status {
                url: url.to_owned(),
                status,
            });
        }
        Ok(response)
    }
}

impl Downloader for HttpDownloader {
    fn fetch_catalog(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.get(&self.catalog_agent, url)?;
        response
            .into_body()
            .into_with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| DownloadError::Body {
                url: url.to_owned(),
                source: e.into_io(),
            })
    }

    fn open_artefact(&self, url: &str) -> Result<Box<dyn Read>, DownloadError> {
        let response = self.get(&self.artefact_agent, url)?;
        let reader = response
            .into_body()
            .into_with_config()
            .limit(self.max_body_bytes)
            .reader();
        Ok(Box::new(reader))
    }
}

/// Agent that reports every status as a response and gives up after
/// `timeout`.
fn agent_with_timeout(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build();
    ureq::Agent::new_with_config(config)
}
