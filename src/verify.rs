//! Streaming SHA-256 verification of downloaded artifacts (component C10).

use crate::error::CoreError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

const CHUNK_SIZE: usize = 128 * 1024;

fn sha256_file(path: &Path) -> Result<String, CoreError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verifies every `*.deb` file in `destination_dir` whose basename appears
/// in `expected` (basename → candidate SHA-256 hex digests; any one match
/// suffices). Files present on disk but absent from `expected` are ignored.
/// If nothing in the directory matches `expected`, logs a warning and
/// succeeds.
pub fn verify_all(
    destination_dir: &Path,
    expected: &HashMap<String, Vec<String>>,
    workers: usize,
) -> Result<(), CoreError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(destination_dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };
        if name.ends_with(".deb") && expected.contains_key(&name) {
            candidates.push(path);
        }
    }

    if candidates.is_empty() {
        log::warn!("[verify_all] no artifacts in {} matched the expected set", destination_dir.display());
        return Ok(());
    }

    let next = AtomicUsize::new(0);
    let failures: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let worker_count = workers.max(1).min(candidates.len());

    thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                let idx = next.fetch_add(1, Ordering::SeqCst);
                if idx >= candidates.len() {
                    break;
                }
                let path = &candidates[idx];
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();

                let digest = match sha256_file(path) {
                    Ok(d) => d,
                    Err(e) => {
                        failures.lock().unwrap().push(format!("{name}: {e}"));
                        continue;
                    }
                };

                let matches = expected
                    .get(&name)
                    .map(|candidates| candidates.iter().any(|c| c.eq_ignore_ascii_case(&digest)))
                    .unwrap_or(false);

                if matches {
                    log::debug!("[verify_all] {name} verified");
                } else {
                    failures.lock().unwrap().push(name);
                }
            });
        }
    });

    let failures = failures.into_inner().unwrap();
    if !failures.is_empty() {
        return Err(CoreError::VerificationFailed(failures.join(", ")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn matching_digest_verifies() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a_1.0_amd64.deb", b"hello world");
        let mut expected = HashMap::new();
        let digest = sha256_file(&dir.path().join("a_1.0_amd64.deb")).unwrap();
        expected.insert("a_1.0_amd64.deb".to_string(), vec![digest]);
        assert!(verify_all(dir.path(), &expected, 2).is_ok());
    }

    #[test]
    fn mismatched_digest_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a_1.0_amd64.deb", b"hello world");
        let mut expected = HashMap::new();
        expected.insert("a_1.0_amd64.deb".to_string(), vec!["deadbeef".to_string()]);
        let err = verify_all(dir.path(), &expected, 2).unwrap_err();
        matches!(err, CoreError::VerificationFailed(_));
    }

    #[test]
    fn no_matching_artifacts_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "unrelated.deb", b"data");
        let expected = HashMap::new();
        assert!(verify_all(dir.path(), &expected, 2).is_ok());
    }
}
