//! The explicit, caller-constructed state every component reads from,
//! replacing any notion of process-wide configuration.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Worker count for the C9/C10 bounded thread pools.
    pub worker_count: usize,
    /// Local cache directory downloaded artifacts land in.
    pub cache_dir: PathBuf,
    /// Directory diagnostic JSON reports are written to.
    pub report_dir: PathBuf,
    /// When set, an "unknown entity" signature bypass becomes a hard error.
    pub strict_signatures: bool,
}

impl ResolutionContext {
    pub fn new(
        worker_count: usize,
        cache_dir: impl Into<PathBuf>,
        report_dir: impl Into<PathBuf>,
        strict_signatures: bool,
    ) -> ResolutionContext {
        ResolutionContext {
            worker_count: worker_count.max(1),
            cache_dir: cache_dir.into(),
            report_dir: report_dir.into(),
            strict_signatures,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_never_zero() {
        let ctx = ResolutionContext::new(0, "cache", "reports", false);
        assert_eq!(ctx.worker_count, 1);
    }
}
