//! Whole-run orchestration: fetch the listing, parse it, reconcile.
//!
//! Only the listing fetch, its parsing, and an unusable destination root
//! abort a run. Everything after that is handled by the
//! [`Reconciler`](crate::reconcile::Reconciler) and reported in the
//! returned [`RunSummary`].

use crate::catalog::parse_catalog;
use crate::config::MirrorConfig;
use crate::download::{Downloader, HttpDownloader};
use crate::error::{MirrorError, Result};
use crate::output::Console;
use crate::reconcile::{Reconciler, RunSummary};

/// Mirror the catalog described by `config` using the production HTTP
/// client.
///
/// # Errors
///
/// See [`run_mirror_with`].
pub fn run_mirror(
    config: &MirrorConfig,
    dry_run: bool,
    console: &mut Console<'_>,
) -> Result<RunSummary> {
    let downloader = HttpDownloader::new(config);
    run_mirror_with(config, &downloader, dry_run, console)
}

/// Testable inner function with an injected downloader.
///
/// # Errors
///
/// Returns [`MirrorError::CatalogUnavailable`] when the listing cannot be
/// fetched, [`MirrorError::CatalogInvalid`] when it cannot be parsed, and
/// [`MirrorError::Destination`] when the destination root cannot be
/// created.
pub fn run_mirror_with(
    config: &MirrorConfig,
    downloader: &dyn Downloader,
    dry_run: bool,
    console: &mut Console<'_>,
) -> Result<RunSummary> {
    let url = config.catalog_url.as_str();
    console.progress(format!("fetching catalog {url}"));
    let body = downloader
        .fetch_catalog(url)
        .map_err(|source| MirrorError::CatalogUnavailable {
            url: url.to_owned(),
            source,
        })?;
    let catalog = parse_catalog(&body).map_err(|source| MirrorError::CatalogInvalid { source })?;
    log::info!(
        "catalog lists {} releases with {} artefacts",
        catalog.len(),
        catalog.artefact_count()
    );

    if !dry_run {
        std::fs::create_dir_all(&config.destination).map_err(|source| {
            MirrorError::Destination {
                path: config.destination.clone(),
                source,
            }
        })?;
    }

    let summary = Reconciler::new(config, downloader)
        .with_dry_run(dry_run)
        .run(&catalog, console);
    Ok(summary)
}
