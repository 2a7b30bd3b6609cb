//! Bounded worker-pool download of the resolved closure (component C9).

use crate::error::CoreError;
use crate::utils::{basename, download_to_file};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Downloads every URL in `urls` into `destination_dir`, using `workers`
/// OS threads pulling from a shared index. Existing files are overwritten.
/// Returns the basenames written on success, or an aggregated error if any
/// single fetch failed.
pub fn fetch_all(urls: &[String], destination_dir: &Path, workers: usize) -> Result<Vec<String>, CoreError> {
    std::fs::create_dir_all(destination_dir)?;

    let next = AtomicUsize::new(0);
    let succeeded: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let failed: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let worker_count = workers.max(1).min(urls.len().max(1));

    thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                let idx = next.fetch_add(1, Ordering::SeqCst);
                if idx >= urls.len() {
                    break;
                }
                let url = &urls[idx];
                let name = basename(url);
                let dest = destination_dir.join(&name);

                match download_to_file(url, &dest) {
                    Ok(()) => {
                        log::info!("[fetch_all] fetched {}", url);
                        succeeded.lock().unwrap().push(name);
                    }
                    Err(e) => {
                        log::warn!("[fetch_all] failed to fetch {}: {}", url, e);
                        failed.lock().unwrap().push(format!("{url}: {e}"));
                    }
                }
            });
        }
    });

    let failed = failed.into_inner().unwrap();
    if !failed.is_empty() {
        return Err(CoreError::FetchFailed(failed.join("; ")));
    }

    Ok(succeeded.into_inner().unwrap())
}
