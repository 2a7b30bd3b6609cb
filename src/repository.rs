//! Repository descriptors and the (component, architecture) bindings they
//! expand into.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
pub struct RepositorySpec {
    /// Identifier used in logs and scratch-directory naming.
    #[arg(long, default_value_t = String::from("default"))]
    pub id: String,
    /// URI of the repository root.
    #[arg(short = 'r', long = "repository", default_value_t = String::from("http://archive.ubuntu.com/ubuntu"))]
    pub uri: String,
    /// Release codename, e.g. "jammy".
    #[arg(short, long, default_value_t = String::from("jammy"))]
    pub codename: String,
    /// URL of the ASCII-armored or binary OpenPGP public key used to verify
    /// the release manifest.
    #[arg(long, default_value_t = String::from("https://archive.ubuntu.com/ubuntu/ubuntu-archive-keyring.gpg"))]
    pub public_key_url: String,
    /// Components to use; defaults to `main` if empty.
    #[arg(short, long)]
    pub components: Option<Vec<String>>,
    /// Target architecture, e.g. "amd64".
    #[arg(short, long, default_value_t = String::from("amd64"))]
    pub architecture: String,
}

impl RepositorySpec {
    pub fn to_descriptor(&self) -> RepoDescriptor {
        RepoDescriptor {
            id: self.id.clone(),
            base_url: self.uri.trim_end_matches('/').to_string(),
            codename: self.codename.clone(),
            public_key_url: self.public_key_url.clone(),
            components: self
                .components
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| vec!["main".to_string()]),
            architecture: self.architecture.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepoDescriptor {
    pub id: String,
    pub base_url: String,
    pub codename: String,
    pub public_key_url: String,
    pub components: Vec<String>,
    pub architecture: String,
}

#[derive(Debug, Clone)]
pub struct RepoBinding {
    pub repo_id: String,
    pub base_url: String,
    pub component: String,
    pub arch: String,
    pub packages_url_candidates: Vec<String>,
    pub release_url: String,
    pub release_sig_url: String,
    pub public_key_url: String,
}

impl RepoDescriptor {
    /// One binding per (component, arch in {architecture, "all"}) pair.
    pub fn bindings(&self) -> Vec<RepoBinding> {
        let release_url = format!("{}/dists/{}/Release", self.base_url, self.codename);
        let release_sig_url = format!("{}.gpg", release_url);

        let mut bindings = Vec::new();
        for component in &self.components {
            for arch in [self.architecture.as_str(), "all"] {
                let dir = format!(
                    "{}/dists/{}/{}/binary-{}",
                    self.base_url, self.codename, component, arch
                );
                bindings.push(RepoBinding {
                    repo_id: self.id.clone(),
                    base_url: self.base_url.clone(),
                    component: component.clone(),
                    arch: arch.to_string(),
                    packages_url_candidates: vec![
                        format!("{}/Packages.xz", dir),
                        format!("{}/Packages.gz", dir),
                        format!("{}/Packages", dir),
                    ],
                    release_url: release_url.clone(),
                    release_sig_url: release_sig_url.clone(),
                    public_key_url: self.public_key_url.clone(),
                });
            }
        }
        bindings
    }
}

impl RepoBinding {
    /// Path of this binding's index within the Release manifest's digest
    /// section, e.g. `main/binary-amd64/Packages.xz`.
    pub fn digest_path_for(&self, candidate_url: &str) -> String {
        let ext = candidate_url.rsplit('.').next().unwrap_or("");
        if ext == "xz" || ext == "gz" {
            format!("{}/binary-{}/Packages.{}", self.component, self.arch, ext)
        } else {
            format!("{}/binary-{}/Packages", self.component, self.arch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_cover_components_and_both_archs() {
        let d = RepoDescriptor {
            id: "r".into(),
            base_url: "http://example.com/ubuntu".into(),
            codename: "jammy".into(),
            public_key_url: "http://example.com/key.gpg".into(),
            components: vec!["main".into(), "universe".into()],
            architecture: "amd64".into(),
        };
        let bindings = d.bindings();
        assert_eq!(bindings.len(), 4);
        assert!(bindings.iter().any(|b| b.component == "main" && b.arch == "amd64"));
        assert!(bindings.iter().any(|b| b.component == "universe" && b.arch == "all"));
    }

    #[test]
    fn digest_path_matches_release_manifest_convention() {
        let b = RepoBinding {
            repo_id: "r".into(),
            base_url: "http://x".into(),
            component: "main".into(),
            arch: "amd64".into(),
            packages_url_candidates: vec![],
            release_url: "http://x/dists/jammy/Release".into(),
            release_sig_url: "http://x/dists/jammy/Release.gpg".into(),
            public_key_url: "http://x/key.gpg".into(),
        };
        assert_eq!(b.digest_path_for("http://x/main/binary-amd64/Packages.xz"), "main/binary-amd64/Packages.xz");
        assert_eq!(b.digest_path_for("http://x/main/binary-amd64/Packages"), "main/binary-amd64/Packages");
    }
}
