//! Debian-style package resolution and acquisition core.
//!
//! Orchestrates index acquisition (C3/C4), cataloging (C5), top-level
//! matching (C6), transitive resolution (C7), parallel download (C9) and
//! artifact verification (C10) behind a single entry point, [`resolve`].

pub mod catalog;
pub mod context;
pub mod depends;
pub mod error;
pub mod fetcher;
pub mod index_fetch;
pub mod logger;
pub mod matcher;
pub mod package;
pub mod report;
pub mod repository;
pub mod resolver;
pub mod utils;
pub mod verify;
pub mod version;

use catalog::Catalog;
use context::ResolutionContext;
use error::CoreError;
use package::Package;
use repository::RepoDescriptor;
use std::collections::HashMap;

/// Final output of a resolution run.
#[derive(Debug)]
pub struct Resolution {
    /// Full package records in the closure, sorted by name.
    pub packages: Vec<Package>,
    /// Basenames successfully downloaded into `ResolutionContext::cache_dir`.
    pub downloaded: Vec<String>,
}

/// Runs the full pipeline: index acquisition → catalog → top-level match →
/// transitive resolve → parallel fetch → artifact verify.
///
/// `timestamp` seeds the filename of any diagnostic report this run writes;
/// callers own time so this crate never calls into the system clock.
pub fn resolve(
    ctx: &ResolutionContext,
    repos: &[RepoDescriptor],
    requests: &[String],
    timestamp: u64,
) -> Result<Resolution, CoreError> {
    let mut packages = Vec::new();
    let mut any_repo_succeeded = false;

    for descriptor in repos {
        match index_fetch::fetch_repository(descriptor, ctx.strict_signatures) {
            Ok(mut pkgs) => {
                any_repo_succeeded = true;
                packages.append(&mut pkgs);
            }
            Err(e) => {
                log::warn!("[resolve] repository {} failed entirely: {}", descriptor.id, e);
            }
        }
    }

    if !any_repo_succeeded {
        return Err(CoreError::Config("no repository yielded a usable package index".to_string()));
    }

    let catalog = Catalog::build(packages);
    log::info!("[resolve] catalog built with {} packages", catalog.len());

    let seeds = matcher::match_top_level(&catalog, requests, ctx.report_dir(), timestamp)?;
    let closure = resolver::resolve(&catalog, seeds, ctx.report_dir(), timestamp)?;
    log::info!("[resolve] closure contains {} packages", closure.len());

    let urls: Vec<String> = closure.iter().filter_map(|p| p.url.clone()).collect();
    fetcher::fetch_all(&urls, ctx.cache_dir(), ctx.worker_count)?;

    // Populated from the whole catalog, not just the closure, so a minor
    // filename-normalization mismatch between a closure record's URL and
    // the on-disk artifact still resolves to an expected digest.
    let mut expected_digests: HashMap<String, Vec<String>> = HashMap::new();
    for pkg in catalog.packages() {
        if let (Some(name), Some(sha256)) = (pkg.basename(), pkg.sha256()) {
            expected_digests.entry(name).or_default().push(sha256.to_string());
        }
    }
    verify::verify_all(ctx.cache_dir(), &expected_digests, ctx.worker_count)?;

    let downloaded = closure.iter().filter_map(|p| p.basename()).collect();

    Ok(Resolution {
        packages: closure,
        downloaded,
    })
}
