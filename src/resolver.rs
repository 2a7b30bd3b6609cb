//! Transitive dependency closure computation (component C7).

use crate::catalog::Catalog;
use crate::depends::Constraint;
use crate::error::CoreError;
use crate::package::Package;
use crate::report::{write_missing_dependencies_report, Edge};
use crate::utils::repo_base;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

fn constraint_for<'a>(parent: &'a Package, dep_name: &str) -> Option<&'a Constraint> {
    parent.requires_raw.iter().find_map(|expr| {
        expr.alternatives
            .iter()
            .find(|a| a.cleaned_name() == dep_name)
            .and_then(|a| a.constraint.as_ref())
    })
}

/// Picks the dependency candidate per spec §4.7: same-repo candidates are
/// preferred over other-repo ones; an unconstrained dependency with more
/// than one candidate prefers the highest same-repo version.
fn select_candidate<'a>(
    parent: &Package,
    candidates: &[&'a Package],
    constraint: Option<&Constraint>,
) -> Option<&'a Package> {
    if candidates.is_empty() {
        return None;
    }

    let parent_repo = parent.url.as_deref().and_then(repo_base);
    let mut same_repo = Vec::new();
    let mut other_repo = Vec::new();
    for &c in candidates {
        let c_repo = c.url.as_deref().and_then(repo_base);
        if parent_repo.is_some() && c_repo == parent_repo {
            same_repo.push(c);
        } else {
            other_repo.push(c);
        }
    }

    match constraint {
        Some(c) => {
            let find = |set: &[&'a Package]| {
                set.iter().find(|p| c.op.evaluate(&p.version, &c.version)).copied()
            };
            find(&same_repo).or_else(|| find(&other_repo))
        }
        None => {
            if candidates.len() == 1 {
                return Some(candidates[0]);
            }
            if !same_repo.is_empty() {
                same_repo.into_iter().max_by(|a, b| a.version.cmp(&b.version))
            } else {
                candidates.first().copied()
            }
        }
    }
}

struct PendingEntry {
    package: Package,
    requested_by: String,
}

/// Computes the transitive closure of `seeds` over `catalog`. Returns the
/// closure sorted by name, or a `MissingDependency`/`Conflict` error.
pub fn resolve(
    catalog: &Catalog,
    seeds: Vec<&Package>,
    report_dir: &Path,
    timestamp: u64,
) -> Result<Vec<Package>, CoreError> {
    let mut emitted: HashSet<String> = HashSet::new();
    let mut pending: HashMap<String, PendingEntry> = HashMap::new();
    let mut queue: VecDeque<(Option<String>, Package)> = VecDeque::new();
    let mut edges: Vec<Edge> = Vec::new();
    let mut result: Vec<Package> = Vec::new();

    for seed in seeds {
        if !emitted.contains(&seed.name) && !pending.contains_key(&seed.name) {
            pending.insert(
                seed.name.clone(),
                PendingEntry {
                    package: seed.clone(),
                    requested_by: "<requested>".to_string(),
                },
            );
            queue.push_back((None, seed.clone()));
        }
    }

    while let Some((_parent_name, package)) = queue.pop_front() {
        if emitted.contains(&package.name) {
            continue;
        }
        emitted.insert(package.name.clone());
        pending.remove(&package.name);

        for expr in &package.requires {
            let dep_name = expr.preferred_name();
            if dep_name.is_empty() {
                continue;
            }
            let dep_name = dep_name.to_string();

            if emitted.contains(&dep_name) {
                continue;
            }

            if let Some(existing) = pending.get(&dep_name) {
                let constraint = constraint_for(&package, &dep_name);
                let satisfied = match constraint {
                    Some(c) => c.op.evaluate(&existing.package.version, &c.version),
                    None => true,
                };
                if !satisfied {
                    return Err(CoreError::Conflict {
                        package: dep_name.clone(),
                        demand_a: format!("{} requires {}", existing.requested_by, dep_name),
                        demand_b: format!(
                            "{} requires {} {}",
                            package.name,
                            dep_name,
                            constraint.map(|c| c.version.to_string()).unwrap_or_default()
                        ),
                    });
                }
                edges.push(Edge {
                    parent: Some(package.name.clone()),
                    parent_version: package.version.to_string(),
                    parent_origin: package.origin.clone(),
                    parent_url: package.url.clone(),
                    child: dep_name.clone(),
                    found: true,
                });
                continue;
            }

            let candidates = catalog.candidates_for(&dep_name);
            if candidates.is_empty() {
                edges.push(Edge {
                    parent: Some(package.name.clone()),
                    parent_version: package.version.to_string(),
                    parent_origin: package.origin.clone(),
                    parent_url: package.url.clone(),
                    child: dep_name.clone(),
                    found: false,
                });
                continue;
            }

            let constraint = constraint_for(&package, &dep_name);
            match select_candidate(&package, &candidates, constraint) {
                Some(chosen) => {
                    edges.push(Edge {
                        parent: Some(package.name.clone()),
                        parent_version: package.version.to_string(),
                        parent_origin: package.origin.clone(),
                        parent_url: package.url.clone(),
                        child: dep_name.clone(),
                        found: true,
                    });
                    pending.insert(
                        dep_name.clone(),
                        PendingEntry {
                            package: chosen.clone(),
                            requested_by: package.name.clone(),
                        },
                    );
                    queue.push_back((Some(package.name.clone()), chosen.clone()));
                }
                None => {
                    edges.push(Edge {
                        parent: Some(package.name.clone()),
                        parent_version: package.version.to_string(),
                        parent_origin: package.origin.clone(),
                        parent_url: package.url.clone(),
                        child: dep_name.clone(),
                        found: false,
                    });
                }
            }
        }

        result.push(package);
    }

    if edges.iter().any(|e| !e.found) {
        let path = write_missing_dependencies_report(report_dir, timestamp, &edges)?;
        return Err(CoreError::MissingDependency {
            report_path: path.to_string_lossy().to_string(),
        });
    }

    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

/// The dependency-graph output is a stub: if a path is supplied, create an
/// empty file there. There is no further contract on its contents.
pub fn write_graph_stub(path: Option<&Path>) -> Result<(), CoreError> {
    if let Some(path) = path {
        std::fs::write(path, b"")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depends::parse_dependency_field;
    use crate::version::Version;
    use std::collections::HashMap as Map;

    fn pkg(name: &str, version: &str, requires: &str, url: &str) -> Package {
        Package {
            name: name.to_string(),
            version: Version::parse(version),
            architecture: "amd64".to_string(),
            requires: parse_dependency_field(requires),
            requires_raw: parse_dependency_field(requires),
            provides: vec![],
            url: Some(url.to_string()),
            checksums: Map::new(),
            origin: None,
            description: None,
        }
    }

    #[test]
    fn simple_chain_resolves_both_packages() {
        let a = pkg("A", "1.0", "B", "http://x/pool/main/a/a_1.0_amd64.deb");
        let b = pkg("B", "2.0", "", "http://x/pool/main/b/b_2.0_amd64.deb");
        let catalog = Catalog::build(vec![a.clone(), b]);
        let dir = tempfile::tempdir().unwrap();
        let seeds = vec![catalog.by_name("A")[0]];
        let result = resolve(&catalog, seeds, dir.path(), 1).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "A");
        assert_eq!(result[1].name, "B");
    }

    #[test]
    fn transitive_three_level_resolves_all() {
        let root = pkg("root", "1.0", "level1", "http://x/pool/r/root_1.0_amd64.deb");
        let level1 = pkg("level1", "1.0", "level2", "http://x/pool/r/level1_1.0_amd64.deb");
        let level2 = pkg("level2", "1.0", "", "http://x/pool/r/level2_1.0_amd64.deb");
        let catalog = Catalog::build(vec![root, level1, level2]);
        let dir = tempfile::tempdir().unwrap();
        let seeds = vec![catalog.by_name("root")[0]];
        let result = resolve(&catalog, seeds, dir.path(), 1).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn cycle_resolves_without_error() {
        let a = pkg("A", "1.0", "B", "http://x/pool/a_1.0_amd64.deb");
        let b = pkg("B", "1.0", "A", "http://x/pool/b_1.0_amd64.deb");
        let catalog = Catalog::build(vec![a, b]);
        let dir = tempfile::tempdir().unwrap();
        let seeds = vec![catalog.by_name("A")[0]];
        let result = resolve(&catalog, seeds, dir.path(), 1).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn missing_dependency_produces_report() {
        let a = pkg("A", "1.0", "X", "http://x/pool/a_1.0_amd64.deb");
        let catalog = Catalog::build(vec![a]);
        let dir = tempfile::tempdir().unwrap();
        let seeds = vec![catalog.by_name("A")[0]];
        let err = resolve(&catalog, seeds, dir.path(), 1).unwrap_err();
        match err {
            CoreError::MissingDependency { report_path } => {
                let contents = std::fs::read_to_string(&report_path).unwrap();
                let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
                assert!(parsed["missing"]["X"].is_array());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn version_constrained_dependency_prefers_same_repo() {
        let a = pkg("A", "1.0", "lib (>= 1.0)", "http://repo1/pool/a_1.0_amd64.deb");
        let lib_same = pkg("lib", "1.5", "", "http://repo1/pool/lib_1.5_amd64.deb");
        let lib_other = pkg("lib", "2.0", "", "http://repo2/pool/lib_2.0_amd64.deb");
        let catalog = Catalog::build(vec![a, lib_other, lib_same]);
        let dir = tempfile::tempdir().unwrap();
        let seeds = vec![catalog.by_name("A")[0]];
        let result = resolve(&catalog, seeds, dir.path(), 1).unwrap();
        let lib = result.iter().find(|p| p.name == "lib").unwrap();
        assert_eq!(lib.version.to_string(), "1.5");
    }
}
