//! Index record shape. Carries only the fields the resolver, fetcher and
//! verifier actually consume — see `DESIGN.md` for why the teacher's much
//! larger source-control-file struct was narrowed down to this one.

use crate::depends::{parse_dependency_field, parse_provides_field, DependencyExpr};
use crate::error::CoreError;
use crate::utils::{join_url, parse_metadata, stanza_opt_text, stanza_opt_value, stanza_value};
use crate::version::Version;
use std::collections::HashMap;

fn normalize_arch(arch: &str) -> String {
    match arch {
        "all" | "any" => "noarch".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub version: Version,
    pub architecture: String,
    /// Pre-Depends and Depends, in that order, first-alternative preferred.
    pub requires: Vec<DependencyExpr>,
    /// Depends entries only (a subset of `requires`), used by the resolver
    /// to look up the version constraint a parent places on a given
    /// dependency name.
    pub requires_raw: Vec<DependencyExpr>,
    pub provides: Vec<String>,
    pub url: Option<String>,
    pub checksums: HashMap<String, String>,
    pub origin: Option<String>,
    pub description: Option<String>,
}

impl Package {
    pub fn from_stanza(stanza: &HashMap<String, Vec<String>>, base_url: &str) -> Result<Package, CoreError> {
        let name = stanza_value("Package", stanza)?;
        let version = Version::parse(&stanza_value("Version", stanza).unwrap_or_default());
        let architecture = normalize_arch(&stanza_opt_value("Architecture", stanza).unwrap_or_default());

        let pre_depends = stanza_opt_value("Pre-Depends", stanza)
            .map(|v| parse_dependency_field(&v))
            .unwrap_or_default();
        let depends = stanza_opt_value("Depends", stanza)
            .map(|v| parse_dependency_field(&v))
            .unwrap_or_default();

        let mut requires = Vec::with_capacity(pre_depends.len() + depends.len());
        requires.extend(pre_depends);
        requires.extend(depends.clone());

        let provides = stanza_opt_value("Provides", stanza)
            .map(|v| parse_provides_field(&v))
            .unwrap_or_default();

        let url = stanza_opt_value("Filename", stanza).map(|f| join_url(base_url, &f));

        let mut checksums = HashMap::new();
        if let Some(v) = stanza_opt_value("SHA256", stanza) {
            checksums.insert("SHA256".to_string(), v);
        }
        if let Some(v) = stanza_opt_value("SHA1", stanza) {
            checksums.insert("SHA1".to_string(), v);
        }
        if let Some(v) = stanza_opt_value("SHA512", stanza) {
            checksums.insert("SHA512".to_string(), v);
        }

        Ok(Package {
            name,
            version,
            architecture,
            requires,
            requires_raw: depends,
            provides,
            url,
            checksums,
            origin: stanza_opt_value("Maintainer", stanza),
            description: stanza_opt_text("Description", stanza).map(|d| {
                d.lines().next().unwrap_or("").to_string()
            }),
        })
    }

    /// Parses a full decompressed `Packages` index into records. Stanzas
    /// with an empty or missing `Package` field are dropped; other parse
    /// errors are logged and the offending record is skipped.
    pub fn parse_index(content: Vec<String>, base_url: &str) -> Result<Vec<Package>, CoreError> {
        let stanzas = parse_metadata(content)?;

        Ok(stanzas
            .iter()
            .filter_map(|s| match Package::from_stanza(s, base_url) {
                Ok(p) if !p.name.is_empty() => Some(p),
                Ok(_) => None,
                Err(e) => {
                    log::error!("[Package::parse_index] dropping malformed record: {}", e);
                    None
                }
            })
            .collect())
    }

    pub fn basename(&self) -> Option<String> {
        self.url.as_deref().map(crate::utils::basename)
    }

    pub fn sha256(&self) -> Option<&str> {
        self.checksums.get("SHA256").map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stanza(lines: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        lines
            .iter()
            .map(|(k, v)| (k.to_string(), vec![v.to_string()]))
            .collect()
    }

    #[test]
    fn parses_minimal_record() {
        let s = stanza(&[
            ("Package", "acct"),
            ("Version", "6.6.4-5+b1"),
            ("Architecture", "amd64"),
            ("Filename", "pool/main/a/acct/acct_6.6.4-5+b1_amd64.deb"),
            ("SHA256", "deadbeef"),
        ]);
        let p = Package::from_stanza(&s, "http://archive.ubuntu.com/ubuntu").unwrap();
        assert_eq!(p.name, "acct");
        assert_eq!(p.version.to_string(), "6.6.4-5+b1");
        assert_eq!(p.architecture, "amd64");
        assert_eq!(
            p.url.as_deref(),
            Some("http://archive.ubuntu.com/ubuntu/pool/main/a/acct/acct_6.6.4-5+b1_amd64.deb")
        );
        assert_eq!(p.sha256(), Some("deadbeef"));
    }

    #[test]
    fn normalizes_all_architecture_to_noarch() {
        let s = stanza(&[("Package", "x"), ("Version", "1.0"), ("Architecture", "all")]);
        let p = Package::from_stanza(&s, "http://x").unwrap();
        assert_eq!(p.architecture, "noarch");
    }

    #[test]
    fn requires_contains_pre_depends_then_depends() {
        let s = stanza(&[
            ("Package", "x"),
            ("Version", "1.0"),
            ("Architecture", "amd64"),
            ("Pre-Depends", "libc6"),
            ("Depends", "libssl1.1 (>= 1.1.1)"),
        ]);
        let p = Package::from_stanza(&s, "http://x").unwrap();
        assert_eq!(p.requires.len(), 2);
        assert_eq!(p.requires[0].preferred_name(), "libc6");
        assert_eq!(p.requires[1].preferred_name(), "libssl1.1");
        assert_eq!(p.requires_raw.len(), 1);
        assert_eq!(p.requires_raw[0].preferred_name(), "libssl1.1");
    }

    #[test]
    fn missing_package_field_is_an_error() {
        let s = stanza(&[("Version", "1.0")]);
        assert!(Package::from_stanza(&s, "http://x").is_err());
    }

    #[test]
    fn parse_index_drops_malformed_stanzas() {
        let content = vec![
            "Package: a".to_string(),
            "Version: 1.0".to_string(),
            "Architecture: amd64".to_string(),
            "".to_string(),
            "Version: 2.0".to_string(), // no Package field
            "".to_string(),
            "Package: b".to_string(),
            "Version: 2.0".to_string(),
            "Architecture: amd64".to_string(),
        ];
        let packages = Package::parse_index(content, "http://x").unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "a");
        assert_eq!(packages[1].name, "b");
    }
}
