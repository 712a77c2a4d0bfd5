//! Go release mirror library.
//!
//! This crate keeps a local directory tree in sync with the Go release
//! listing: one directory per release version, each holding that release's
//! artefacts next to `.sha` sidecar files recording their SHA-256 digests.
//! It is used by the `godl` CLI binary and can be driven programmatically
//! with an injected [`download::Downloader`].
//!
//! # Modules
//!
//! - [`catalog`] - Release listing types and JSON parsing
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Mirror settings loaded from TOML
//! - [`download`] - HTTP retrieval of the listing and artefacts
//! - [`error`] - Run-level error types
//! - [`mirror`] - Whole-run orchestration
//! - [`output`] - Stdout and stderr line sinks
//! - [`persist`] - Downloading one artefact and recording its sidecar
//! - [`policy`] - Release and artefact skip rules
//! - [`reconcile`] - The per-release reconciliation loop
//! - [`verify`] - Local integrity checks against sidecars

pub mod catalog;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod mirror;
pub mod output;
pub mod persist;
pub mod policy;
pub mod reconcile;
pub mod verify;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
