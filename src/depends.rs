//! Parsing of `Depends`/`Pre-Depends`/`Provides`-style control fields into
//! structured, ordered alternatives.

use crate::version::{Version, VersionOp};

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub op: VersionOp,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub name: String,
    pub arch_qualifier: Option<String>,
    pub constraint: Option<Constraint>,
}

impl Alternative {
    fn parse(raw: &str) -> Option<Alternative> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let (name_and_arch, constraint) = match raw.find('(') {
            Some(start) => {
                let end = raw.find(')')?;
                let name_part = raw[..start].trim();
                let constraint_str = raw[start + 1..end].trim();
                (name_part, Some(parse_constraint(constraint_str)))
            }
            None => {
                // Discard any trailing arch-restriction list (`[...]`) or
                // other whitespace-separated tail.
                let name_part = raw.split_whitespace().next().unwrap_or(raw);
                (name_part, None)
            }
        };

        let (name, arch_qualifier) = match name_and_arch.split_once(':') {
            Some((n, a)) => (n.trim().to_string(), Some(a.trim().to_string())),
            None => (name_and_arch.trim().to_string(), None),
        };

        if name.is_empty() {
            return None;
        }

        Some(Alternative {
            name,
            arch_qualifier,
            constraint,
        })
    }

    pub fn cleaned_name(&self) -> &str {
        &self.name
    }
}

fn parse_constraint(s: &str) -> Constraint {
    let s = s.trim();
    let ops = ["<<", "<=", ">>", ">=", "=", "<", ">"];
    for op_str in ops {
        if let Some(rest) = s.strip_prefix(op_str) {
            if let Some(op) = VersionOp::parse(op_str) {
                return Constraint {
                    op,
                    version: Version::parse(rest.trim()),
                };
            }
        }
    }
    // Malformed constraint; treat as an always-true "equals itself" so the
    // caller never panics on an index built from a live repository.
    Constraint {
        op: VersionOp::Eq,
        version: Version::parse(s),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DependencyExpr {
    pub alternatives: Vec<Alternative>,
}

impl DependencyExpr {
    /// The cleaned name of the first (preferred) alternative, or empty
    /// string if the expression carried no usable alternative.
    pub fn preferred_name(&self) -> &str {
        self.alternatives
            .first()
            .map(|a| a.cleaned_name())
            .unwrap_or("")
    }

    pub fn preferred_constraint(&self) -> Option<&Constraint> {
        self.alternatives.first().and_then(|a| a.constraint.as_ref())
    }
}

fn parse_dependency_item(raw: &str) -> Option<DependencyExpr> {
    let alternatives: Vec<Alternative> = raw.split('|').filter_map(Alternative::parse).collect();
    if alternatives.is_empty() {
        None
    } else {
        Some(DependencyExpr { alternatives })
    }
}

/// Parses a `Depends`/`Pre-Depends`-shaped field: comma-separated items,
/// each a `|`-separated list of alternatives.
pub fn parse_dependency_field(raw: &str) -> Vec<DependencyExpr> {
    raw.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .filter_map(parse_dependency_item)
        .collect()
}

/// Parses a `Provides`-shaped field: comma-separated bare names, with any
/// version constraint stripped (Debian Policy 7.5).
pub fn parse_provides_field(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|item| Alternative::parse(item.trim()))
        .map(|a| a.name)
        .collect()
}
