//! In-memory union of every package pulled from every bound repository,
//! with name and provides lookup indexes.

use crate::package::Package;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Catalog {
    packages: Vec<Package>,
    by_name: HashMap<String, Vec<usize>>,
    by_provides: HashMap<String, Vec<usize>>,
}

impl Catalog {
    pub fn build(packages: Vec<Package>) -> Catalog {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_provides: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, pkg) in packages.iter().enumerate() {
            by_name.entry(pkg.name.clone()).or_default().push(idx);
            for provided in &pkg.provides {
                by_provides.entry(provided.clone()).or_default().push(idx);
            }
        }

        Catalog {
            packages,
            by_name,
            by_provides,
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn by_name(&self, name: &str) -> Vec<&Package> {
        self.by_name
            .get(name)
            .map(|idxs| idxs.iter().map(|&i| &self.packages[i]).collect())
            .unwrap_or_default()
    }

    pub fn by_provides(&self, name: &str) -> Vec<&Package> {
        self.by_provides
            .get(name)
            .map(|idxs| idxs.iter().map(|&i| &self.packages[i]).collect())
            .unwrap_or_default()
    }

    /// Candidates named `name` or providing `name`, preserving catalog
    /// order and preferring direct name matches over `Provides`.
    pub fn candidates_for(&self, name: &str) -> Vec<&Package> {
        let direct = self.by_name(name);
        if !direct.is_empty() {
            return direct;
        }
        self.by_provides(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;
    use std::collections::HashMap as Map;

    fn pkg(name: &str, version: &str, provides: Vec<&str>) -> Package {
        Package {
            name: name.to_string(),
            version: Version::parse(version),
            architecture: "amd64".to_string(),
            requires: vec![],
            requires_raw: vec![],
            provides: provides.into_iter().map(|s| s.to_string()).collect(),
            url: None,
            checksums: Map::new(),
            origin: None,
            description: None,
        }
    }

    #[test]
    fn by_name_preserves_insertion_order() {
        let catalog = Catalog::build(vec![pkg("a", "1.0", vec![]), pkg("a", "2.0", vec![])]);
        let results = catalog.by_name("a");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].version.to_string(), "1.0");
        assert_eq!(results[1].version.to_string(), "2.0");
    }

    #[test]
    fn candidates_prefer_direct_name_over_provides() {
        let catalog = Catalog::build(vec![
            pkg("mail-transport-agent", "1.0", vec![]),
            pkg("postfix", "3.0", vec!["mail-transport-agent"]),
        ]);
        let candidates = catalog.candidates_for("mail-transport-agent");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "mail-transport-agent");
    }

    #[test]
    fn candidates_fall_back_to_provides() {
        let catalog = Catalog::build(vec![pkg("postfix", "3.0", vec!["mail-transport-agent"])]);
        let candidates = catalog.candidates_for("mail-transport-agent");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "postfix");
    }
}
