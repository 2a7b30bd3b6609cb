//! JSON diagnostic reports (component C8). Two shapes are produced: a flat
//! missing-top-level-packages report from the matcher, and a traced
//! missing-dependencies report from the resolver.

use crate::error::CoreError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct MissingPackagesReport {
    pub report_type: &'static str,
    pub missing: Vec<String>,
}

impl MissingPackagesReport {
    pub fn new(missing: Vec<String>) -> MissingPackagesReport {
        MissingPackagesReport {
            report_type: "missing_packages_report",
            missing,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceNode {
    pub name: String,
    pub version: String,
    pub origin: Option<String>,
    pub url: Option<String>,
    pub found: bool,
    pub parent: Option<String>,
    pub child: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub trace: Vec<TraceNode>,
}

#[derive(Debug, Serialize)]
pub struct MissingDependenciesReport {
    pub report_type: &'static str,
    pub missing: HashMap<String, Vec<Trace>>,
}

/// A resolver-observed dependency edge. `found` is false when `child` could
/// not be satisfied from the catalog.
#[derive(Debug, Clone)]
pub struct Edge {
    pub parent: Option<String>,
    pub parent_version: String,
    pub parent_origin: Option<String>,
    pub parent_url: Option<String>,
    pub child: String,
    pub found: bool,
}

/// Builds the traced missing-dependencies report from the resolver's audit
/// edge list: finds roots (names never appearing as a child), DFS from each
/// root, and records the path to every missing leaf.
pub fn build_missing_dependencies_report(edges: &[Edge]) -> MissingDependenciesReport {
    let mut children_of: HashMap<&str, Vec<&Edge>> = HashMap::new();
    let mut all_children: HashSet<&str> = HashSet::new();
    let mut all_parents: HashSet<&str> = HashSet::new();

    for edge in edges {
        if let Some(parent) = &edge.parent {
            children_of.entry(parent.as_str()).or_default().push(edge);
            all_parents.insert(parent.as_str());
        }
        all_children.insert(edge.child.as_str());
    }

    let roots: Vec<&str> = all_parents.difference(&all_children).copied().collect();

    let mut missing: HashMap<String, Vec<Trace>> = HashMap::new();

    for root in roots {
        let mut path: Vec<TraceNode> = Vec::new();
        dfs(root, &children_of, &mut path, &mut missing);
    }

    MissingDependenciesReport {
        report_type: "missing_dependencies_report",
        missing,
    }
}

fn dfs<'a>(
    node: &'a str,
    children_of: &HashMap<&'a str, Vec<&'a Edge>>,
    path: &mut Vec<TraceNode>,
    missing: &mut HashMap<String, Vec<Trace>>,
) {
    let Some(edges) = children_of.get(node) else {
        return;
    };

    for edge in edges {
        let trace_node = TraceNode {
            name: edge.child.clone(),
            version: edge.parent_version.clone(),
            origin: edge.parent_origin.clone(),
            url: edge.parent_url.clone(),
            found: edge.found,
            parent: edge.parent.clone(),
            child: edge.child.clone(),
        };

        path.push(trace_node);

        if !edge.found {
            missing
                .entry(edge.child.clone())
                .or_default()
                .push(Trace { trace: path.clone() });
        } else {
            dfs(edge.child.as_str(), children_of, path, missing);
        }

        path.pop();
    }
}

fn write_json<T: Serialize>(report_dir: &Path, prefix: &str, timestamp: u64, value: &T) -> Result<PathBuf, CoreError> {
    std::fs::create_dir_all(report_dir)?;
    let path = report_dir.join(format!("{prefix}-{timestamp}.json"));

    let json = serde_json::to_string_pretty(value).map_err(|e| CoreError::Report(e.to_string()))?;

    match std::fs::write(&path, json) {
        Ok(()) => Ok(path),
        Err(e) => {
            let _ = std::fs::remove_file(&path);
            Err(CoreError::Report(e.to_string()))
        }
    }
}

pub fn write_missing_packages_report(
    report_dir: &Path,
    timestamp: u64,
    missing: Vec<String>,
) -> Result<PathBuf, CoreError> {
    write_json(report_dir, "missing-packages", timestamp, &MissingPackagesReport::new(missing))
}

pub fn write_missing_dependencies_report(
    report_dir: &Path,
    timestamp: u64,
    edges: &[Edge],
) -> Result<PathBuf, CoreError> {
    let report = build_missing_dependencies_report(edges);
    write_json(report_dir, "missing-dependencies", timestamp, &report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_missing_leaf_traces_back_to_root() {
        let edges = vec![
            Edge {
                parent: Some("A".into()),
                parent_version: "1.0".into(),
                parent_origin: None,
                parent_url: None,
                child: "X".into(),
                found: false,
            },
        ];
        let report = build_missing_dependencies_report(&edges);
        assert_eq!(report.missing.len(), 1);
        let traces = &report.missing["X"];
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].trace.len(), 1);
        assert_eq!(traces[0].trace[0].found, false);
        assert_eq!(traces[0].trace[0].parent.as_deref(), Some("A"));
    }

    #[test]
    fn transitive_missing_leaf_has_full_path() {
        let edges = vec![
            Edge {
                parent: Some("root".into()),
                parent_version: "1.0".into(),
                parent_origin: None,
                parent_url: None,
                child: "mid".into(),
                found: true,
            },
            Edge {
                parent: Some("mid".into()),
                parent_version: "1.0".into(),
                parent_origin: None,
                parent_url: None,
                child: "leaf".into(),
                found: false,
            },
        ];
        let report = build_missing_dependencies_report(&edges);
        let traces = &report.missing["leaf"];
        assert_eq!(traces[0].trace.len(), 2);
        assert_eq!(traces[0].trace[0].child, "mid");
        assert_eq!(traces[0].trace[1].child, "leaf");
    }

    #[test]
    fn report_writes_valid_json_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_missing_packages_report(dir.path(), 1, vec!["foo".into()]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["report_type"], "missing_packages_report");
        assert_eq!(parsed["missing"][0], "foo");
    }
}
