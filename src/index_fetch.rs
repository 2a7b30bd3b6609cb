//! Release manifest + signature + package-index acquisition and
//! verification (component C3).

use crate::error::CoreError;
use crate::package::Package;
use crate::repository::{RepoBinding, RepoDescriptor};
use crate::utils::{download, download_raw, parse_metadata, probe_exists, stanza_files};
use pgp::composed::{Deserializable, SignedPublicKey, StandaloneSignature};
use sha2::{Digest, Sha256};
use std::io::Cursor;

/// Tries armored-text parsing first, falling back to raw binary bytes.
fn load_public_key(bytes: &[u8]) -> Result<SignedPublicKey, CoreError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        if let Ok((key, _headers)) = SignedPublicKey::from_string(text) {
            return Ok(key);
        }
    }
    let key = SignedPublicKey::from_bytes(Cursor::new(bytes))
        .map_err(|e| CoreError::SignatureInvalid(format!("public key: {e}")))?;
    Ok(key)
}

fn load_signature(bytes: &[u8]) -> Result<StandaloneSignature, CoreError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        if let Ok((sig, _headers)) = StandaloneSignature::from_string(text) {
            return Ok(sig);
        }
    }
    let sig = StandaloneSignature::from_bytes(Cursor::new(bytes))
        .map_err(|e| CoreError::SignatureInvalid(format!("detached signature: {e}")))?;
    Ok(sig)
}

/// Verifies the detached signature over `release_bytes`. An "unknown
/// entity" failure (the signer is not present in the supplied keyring) is
/// logged and accepted unless `strict` is set — a known compatibility
/// compromise for vendor keyrings that don't ship every signing subkey.
fn verify_release_signature(
    release_bytes: &[u8],
    sig_bytes: &[u8],
    key_bytes: &[u8],
    strict: bool,
) -> Result<(), CoreError> {
    let public_key = load_public_key(key_bytes)?;
    let signature = load_signature(sig_bytes)?;

    match signature.verify(&public_key, release_bytes) {
        Ok(()) => Ok(()),
        Err(e) => {
            let msg = e.to_string();
            if !strict && msg.to_lowercase().contains("unknown entity") {
                log::warn!("[verify_release_signature] accepting signature from unknown entity: {}", msg);
                Ok(())
            } else {
                Err(CoreError::SignatureInvalid(msg))
            }
        }
    }
}

fn verify_index_digest(release_content: &[String], digest_path: &str, local_bytes: &[u8]) -> Result<(), CoreError> {
    let stanzas = parse_metadata(release_content.to_vec())?;
    let stanza = stanzas
        .into_iter()
        .find(|s| s.keys().any(|k| k.eq_ignore_ascii_case("SHA256")))
        .ok_or_else(|| CoreError::DigestMismatch {
            path: digest_path.to_string(),
            expected: String::new(),
            actual: String::new(),
        })?;

    let key = stanza.keys().find(|k| k.eq_ignore_ascii_case("SHA256")).cloned().unwrap();
    let files = stanza_files(&key, &stanza)?;

    let expected = files
        .iter()
        .find(|f| f.path == digest_path)
        .map(|f| f.hash.clone())
        .ok_or_else(|| CoreError::DigestMismatch {
            path: digest_path.to_string(),
            expected: String::new(),
            actual: String::new(),
        })?;

    let mut hasher = Sha256::new();
    hasher.update(local_bytes);
    let actual = hex::encode(hasher.finalize());

    if actual != expected {
        return Err(CoreError::DigestMismatch {
            path: digest_path.to_string(),
            expected,
            actual,
        });
    }

    Ok(())
}

fn decompress(url: &str, raw: Vec<u8>) -> Result<Vec<String>, CoreError> {
    if url.ends_with(".xz") {
        let mut decoder = xz2::read::XzDecoder::new(Cursor::new(raw));
        let mut data = String::new();
        std::io::Read::read_to_string(&mut decoder, &mut data)?;
        Ok(data.split('\n').map(|l| l.to_string()).collect())
    } else if url.ends_with(".gz") {
        let mut decoder = flate2::read::GzDecoder::new(Cursor::new(raw));
        let mut data = String::new();
        std::io::Read::read_to_string(&mut decoder, &mut data)?;
        Ok(data.split('\n').map(|l| l.to_string()).collect())
    } else {
        let data = String::from_utf8_lossy(&raw).to_string();
        Ok(data.split('\n').map(|l| l.to_string()).collect())
    }
}

/// Fetches and verifies a single binding, returning its parsed packages.
/// Any step failing here is isolated to this binding; the caller decides
/// whether to continue with the rest of the repository's bindings.
pub fn fetch_binding(binding: &RepoBinding, strict_signatures: bool) -> Result<Vec<Package>, CoreError> {
    let release_lines = download(&binding.release_url)?;
    let release_bytes = release_lines.join("\n").into_bytes();

    let sig_bytes = download_raw(&binding.release_sig_url)?;
    let key_bytes = download_raw(&binding.public_key_url)?;

    verify_release_signature(&release_bytes, &sig_bytes, &key_bytes, strict_signatures)?;

    let mut last_err = None;
    for candidate in &binding.packages_url_candidates {
        match probe_exists(candidate) {
            Ok(true) => {}
            Ok(false) => {
                last_err = Some(CoreError::Config(format!("{candidate} not found (HEAD probe)")));
                continue;
            }
            Err(e) => {
                last_err = Some(e);
                continue;
            }
        }

        let raw = match download_raw(candidate) {
            Ok(r) => r,
            Err(e) => {
                last_err = Some(e);
                continue;
            }
        };

        let digest_path = binding.digest_path_for(candidate);
        if let Err(e) = verify_index_digest(&release_lines, &digest_path, &raw) {
            last_err = Some(e);
            continue;
        }

        let lines = decompress(candidate, raw)?;
        return Package::parse_index(lines, &binding.base_url);
    }

    Err(last_err.unwrap_or_else(|| CoreError::Config(format!(
        "no reachable Packages file for {}/{}",
        binding.component, binding.arch
    ))))
}

/// Fetches every binding of a repository descriptor, concatenating all
/// successfully-parsed packages. A binding failure is logged and skipped;
/// the call fails only if every binding for this repository failed.
pub fn fetch_repository(descriptor: &RepoDescriptor, strict_signatures: bool) -> Result<Vec<Package>, CoreError> {
    let bindings = descriptor.bindings();
    let mut packages = Vec::new();
    let mut any_succeeded = false;
    let mut last_err = None;

    for binding in &bindings {
        match fetch_binding(binding, strict_signatures) {
            Ok(mut pkgs) => {
                any_succeeded = true;
                packages.append(&mut pkgs);
            }
            Err(e) => {
                log::warn!(
                    "[fetch_repository] binding {}/{} failed: {}",
                    binding.component, binding.arch, e
                );
                last_err = Some(e);
            }
        }
    }

    if !any_succeeded {
        return Err(last_err.unwrap_or_else(|| {
            CoreError::Config(format!("repository {} has no reachable bindings", descriptor.id))
        }));
    }

    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_index_digest_matches_expected_hash() {
        let content = vec![
            "Codename: jammy".to_string(),
            "SHA256:".to_string(),
            " e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855 0 main/binary-amd64/Packages".to_string(),
        ];
        let r = verify_index_digest(&content, "main/binary-amd64/Packages", b"");
        assert!(r.is_ok());
    }

    #[test]
    fn verify_index_digest_rejects_mismatch() {
        let content = vec![
            "Codename: jammy".to_string(),
            "SHA256:".to_string(),
            " deadbeef 4 main/binary-amd64/Packages".to_string(),
        ];
        let r = verify_index_digest(&content, "main/binary-amd64/Packages", b"data");
        assert!(r.is_err());
    }

    #[test]
    fn verify_index_digest_rejects_missing_path() {
        let content = vec!["Codename: jammy".to_string(), "SHA256:".to_string()];
        let r = verify_index_digest(&content, "main/binary-amd64/Packages", b"data");
        assert!(r.is_err());
    }
}
