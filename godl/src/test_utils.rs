//! Shared test utilities for the mirror crate.
//!
//! Builders for listing JSON and a scripted [`Downloader`] that serves
//! canned responses without network access.

use crate::catalog::{Artefact, HexDigest};
use crate::download::{DownloadError, Downloader};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    HexDigest::from_bytes(&Sha256::digest(bytes)).as_str().to_owned()
}

/// JSON object for one artefact with placeholder platform fields.
pub fn artefact_json(version: &str, filename: &str, sha: &str, size: u64) -> String {
    serde_json::json!({
        "filename": filename,
        "os": "linux",
        "arch": "amd64",
        "version": version,
        "sha256": sha,
        "size": size,
        "kind": "archive",
    })
    .to_string()
}

/// JSON object for one release holding the given artefact objects.
pub fn release_json(version: &str, stable: bool, artefacts: &[String]) -> String {
    format!(
        r#"{{"version":{},"stable":{stable},"files":[{}]}}"#,
        serde_json::Value::from(version),
        artefacts.join(",")
    )
}

/// JSON listing holding the given release objects.
pub fn catalog_json(releases: &[String]) -> String {
    format!("[{}]", releases.join(","))
}

/// Parsed artefact whose catalog entry matches `content`.
///
/// # Panics
///
/// Panics if the generated JSON does not parse, which indicates a broken
/// test fixture.
pub fn artefact_for(version: &str, filename: &str, content: &[u8]) -> Artefact {
    let json = artefact_json(
        version,
        filename,
        &sha256_hex(content),
        content.len() as u64,
    );
    serde_json::from_str(&json).expect("fixture artefact JSON")
}

/// Canned answer for one URL.
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Status 200 with this body.
    Body(Vec<u8>),
    /// A non-200 status.
    Status(u16),
    /// The request never completes.
    Transport(String),
    /// Status 200, but the body fails after these bytes.
    Interrupted(Vec<u8>),
}

/// A scripted [`Downloader`] that records every requested URL.
///
/// URLs without a scripted response answer 404.
#[derive(Debug)]
pub struct StubDownloader {
    catalog: StubResponse,
    artefacts: HashMap<String, StubResponse>,
    requested: RefCell<Vec<String>>,
}

impl StubDownloader {
    /// Serve `catalog` as the listing body.
    pub fn new(catalog: impl Into<Vec<u8>>) -> Self {
        Self::with_catalog_response(StubResponse::Body(catalog.into()))
    }

    /// Answer the listing request with `response`.
    pub fn with_catalog_response(response: StubResponse) -> Self {
        Self {
            catalog: response,
            artefacts: HashMap::new(),
            requested: RefCell::new(Vec::new()),
        }
    }

    /// Answer requests for `url` with `response`.
    #[must_use]
    pub fn respond(mut self, url: impl Into<String>, response: StubResponse) -> Self {
        self.artefacts.insert(url.into(), response);
        self
    }

    /// Serve `body` with status 200 for `url`.
    #[must_use]
    pub fn serve(self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.respond(url, StubResponse::Body(body.into()))
    }

    /// Artefact URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    /// Number of artefact requests made so far.
    pub fn request_count(&self) -> usize {
        self.requested.borrow().len()
    }

    fn answer(url: &str, response: &StubResponse) -> Result<Box<dyn Read>, DownloadError> {
        match response {
            StubResponse::Body(body) => Ok(Box::new(Cursor::new(body.clone()))),
            StubResponse::Status(status) => Err(DownloadError::Status {
                url: url.to_owned(),
                status: *status,
            }),
            StubResponse::Transport(reason) => Err(DownloadError::Transport {
                url: url.to_owned(),
                reason: reason.clone(),
            }),
            StubResponse::Interrupted(prefix) => Ok(Box::new(
                Cursor::new(prefix.clone()).chain(FailingReader),
            )),
        }
    }
}

impl Downloader for StubDownloader {
    fn fetch_catalog(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let mut body = Vec::new();
        Self::answer(url, &self.catalog)?
            .read_to_end(&mut body)
            .map_err(|source| DownloadError::Body {
                url: url.to_owned(),
                source,
            })?;
        Ok(body)
    }

    fn open_artefact(&self, url: &str) -> Result<Box<dyn Read>, DownloadError> {
        self.requested.borrow_mut().push(url.to_owned());
        match self.artefacts.get(url) {
            Some(response) => Self::answer(url, response),
            None => Err(DownloadError::Status {
                url: url.to_owned(),
                status: 404,
            }),
        }
    }
}

/// Reader whose every read fails, simulating a dropped connection.
struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset",
        ))
    }
}
