//! CLI argument definitions for the mirror.
//!
//! Flags mirror the keys of the configuration file; any flag given on the
//! command line replaces the file's value for that key.

use crate::config::{ConfigError, MirrorConfig};
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Mirror Go release artefacts into a local directory tree.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "godl")]
#[command(version, about)]
#[command(long_about = concat!(
    "Mirror Go release artefacts into a local directory tree.\n\n",
    "godl fetches the Go release listing, creates one directory per stable ",
    "release under the destination, and downloads every artefact that is not ",
    "already present with the published size and SHA-256. Each artefact gets ",
    "a `.sha` sidecar so later runs can skip it without re-hashing.\n\n",
    "Releases whose version contains a pre-release marker (beta, rc by ",
    "default) or that are explicitly excluded are skipped.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Mirror everything into the current directory:\n",
    "    $ godl\n\n",
    "  Mirror Linux amd64 archives only:\n",
    "    $ godl -d /srv/go --os linux --arch amd64 --kind archive\n\n",
    "  Preview without downloading:\n",
    "    $ godl --dry-run\n",
))]
pub struct Cli {
    /// Configuration file [default: per-user config dir, when present].
    #[arg(long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Destination root holding one directory per release.
    #[arg(short = 'd', long = "dest", value_name = "DIR")]
    pub destination: Option<Utf8PathBuf>,

    /// URL of the JSON release listing.
    #[arg(long, value_name = "URL")]
    pub catalog_url: Option<String>,

    /// Artefact URL template; `{filename}` is replaced per artefact.
    #[arg(long, value_name = "TEMPLATE")]
    pub download_url_template: Option<String>,

    /// Skip this exact version (can be repeated).
    #[arg(long = "exclude-version", value_name = "VERSION")]
    pub excluded_versions: Vec<String>,

    /// Treat versions containing this text as pre-releases (can be repeated).
    #[arg(long = "prerelease-marker", value_name = "MARKER")]
    pub prerelease_markers: Vec<String>,

    /// Mirror only this operating system (can be repeated).
    #[arg(long, value_name = "OS")]
    pub os: Vec<String>,

    /// Mirror only this architecture (can be repeated).
    #[arg(long, value_name = "ARCH")]
    pub arch: Vec<String>,

    /// Mirror only this artefact kind (can be repeated).
    #[arg(long, value_name = "KIND")]
    pub kind: Vec<String>,

    /// Deadline for fetching the listing, in seconds.
    #[arg(long = "catalog-timeout", value_name = "SECS")]
    pub catalog_timeout: Option<u64>,

    /// Deadline for each artefact download, in seconds.
    #[arg(long = "download-timeout", value_name = "SECS")]
    pub download_timeout: Option<u64>,

    /// Largest response body accepted, in bytes.
    #[arg(long = "max-body-size", value_name = "BYTES")]
    pub max_body_size: Option<u64>,

    /// Hash every download and discard it when it disagrees with the listing.
    #[arg(long)]
    pub verify_downloads: bool,

    /// Report what would be downloaded without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (results and failures still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Load the configuration file, apply flag overrides, and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be loaded or the merged
    /// settings are invalid.
    pub fn resolve_config(&self) -> Result<MirrorConfig, ConfigError> {
        let mut config = MirrorConfig::load_or_default(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Replace every setting given on the command line.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use godl::cli::Cli;
    /// use godl::config::MirrorConfig;
    ///
    /// let cli = Cli::parse_from(["godl", "--os", "linux", "--catalog-timeout", "5"]);
    /// let mut config = MirrorConfig::default();
    /// cli.apply_overrides(&mut config);
    /// assert_eq!(config.os, vec!["linux".to_owned()]);
    /// assert_eq!(config.catalog_timeout_secs, 5);
    /// ```
    pub fn apply_overrides(&self, config: &mut MirrorConfig) {
        if let Some(destination) = &self.destination {
            config.destination.clone_from(destination);
        }
        if let Some(url) = &self.catalog_url {
            config.catalog_url.clone_from(url);
        }
        if let Some(template) = &self.download_url_template {
            config.download_url_template.clone_from(template);
        }
        replace_if_given(&mut config.excluded_versions, &self.excluded_versions);
        replace_if_given(&mut config.prerelease_markers, &self.prerelease_markers);
        replace_if_given(&mut config.os, &self.os);
        replace_if_given(&mut config.arch, &self.arch);
        replace_if_given(&mut config.kind, &self.kind);
        if let Some(secs) = self.catalog_timeout {
            config.catalog_timeout_secs = secs;
        }
        if let Some(secs) = self.download_timeout {
            config.download_timeout_secs = secs;
        }
        if let Some(bytes) = self.max_body_size {
            config.max_body_bytes = bytes;
        }
        config.verify_downloads |= self.verify_downloads;
    }

    /// Log level selected by `-v`; `RUST_LOG` still overrides it.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn replace_if_given(setting: &mut Vec<String>, given: &[String]) {
    if !given.is_empty() {
        *setting = given.to_vec();
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
