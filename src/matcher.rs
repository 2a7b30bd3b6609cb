//! Maps user-supplied top-level names onto catalog entries (component C6).

use crate::catalog::Catalog;
use crate::package::Package;
use crate::report::write_missing_packages_report;
use crate::utils::basename;
use crate::version::Version;
use std::path::Path;

enum Candidate<'a> {
    Exact(&'a Package),
    Fuzzy(&'a Package),
}

fn version_from_basename(url: &str) -> Version {
    let base = basename(url);
    let field = base.splitn(2, '_').nth(1).unwrap_or(&base).to_string();
    Version::parse(&field)
}

/// Collects match candidates for a single requested name, per spec §4.6's
/// three rules.
fn candidates_for_one<'a>(catalog: &'a Catalog, want: &str) -> Vec<Candidate<'a>> {
    let mut out = Vec::new();

    for pkg in catalog.packages() {
        if let Some(url) = &pkg.url {
            if basename(url) == format!("{want}.deb") {
                return vec![Candidate::Exact(pkg)];
            }
        }
        if pkg.name == want {
            return vec![Candidate::Exact(pkg)];
        }
    }

    for pkg in catalog.packages() {
        let starts_with_separator = ["-", ".", "_"]
            .iter()
            .any(|sep| pkg.name.starts_with(&format!("{want}{sep}")));
        if starts_with_separator {
            out.push(Candidate::Fuzzy(pkg));
        }
    }

    out
}

fn pick_candidate<'a>(candidates: Vec<Candidate<'a>>) -> Option<&'a Package> {
    match candidates.len() {
        0 => None,
        1 => Some(match candidates.into_iter().next().unwrap() {
            Candidate::Exact(p) => p,
            Candidate::Fuzzy(p) => p,
        }),
        _ => {
            let mut packages: Vec<&Package> = candidates
                .into_iter()
                .map(|c| match c {
                    Candidate::Exact(p) => p,
                    Candidate::Fuzzy(p) => p,
                })
                .collect();
            packages.sort_by(|a, b| {
                let va = a.url.as_deref().map(version_from_basename).unwrap_or_else(|| Version::parse(""));
                let vb = b.url.as_deref().map(version_from_basename).unwrap_or_else(|| Version::parse(""));
                vb.cmp(&va)
            });
            packages.into_iter().next()
        }
    }
}

pub fn match_top_level<'a>(
    catalog: &'a Catalog,
    requests: &[String],
    report_dir: &Path,
    timestamp: u64,
) -> Result<Vec<&'a Package>, crate::error::CoreError> {
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for want in requests {
        let candidates = candidates_for_one(catalog, want);
        match pick_candidate(candidates) {
            Some(pkg) => matched.push(pkg),
            None => missing.push(want.clone()),
        }
    }

    if !missing.is_empty() {
        let path = write_missing_packages_report(report_dir, timestamp, missing)?;
        return Err(crate::error::CoreError::MissingTopLevel {
            report_path: path.to_string_lossy().to_string(),
        });
    }

    Ok(matched)
}
