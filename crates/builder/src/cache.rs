//! The on-disk build cache.
//!
//! A cache entry is a directory named after a commit SHA directly inside the
//! output root. Existence is the whole contract: entries are published by a
//! single rename and never inspected, expired, or removed by this service.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pipeline::{BuildCache, CommitSha, ConfigError};
use tracing::warn;

/// Build cache rooted at an existing directory.
#[derive(Debug, Clone)]
pub struct FsBuildCache {
    root: PathBuf,
}

impl FsBuildCache {
    /// Opens the cache at `root`, which must be an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            Ok(_) => Err(ConfigError::new(format!(
                "output directory {} is not a directory",
                root.display()
            ))),
            Err(e) => Err(ConfigError::new(format!(
                "output directory {}: {e}",
                root.display()
            ))),
        }
    }

    /// The output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the entry for `sha` lives (or would live).
    pub fn entry_path(&self, sha: &CommitSha) -> PathBuf {
        self.root.join(sha.as_str())
    }
}

#[async_trait]
impl BuildCache for FsBuildCache {
    /// Only a definite "not found" counts as a miss. Any other stat failure is
    /// treated as a hit so an unreadable entry is never rebuilt over.
    async fn exists(&self, sha: &CommitSha) -> bool {
        match tokio::fs::metadata(self.entry_path(sha)).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(sha = %sha, error = %e, "cache entry stat failed; treating as present");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha() -> CommitSha {
        CommitSha::parse(&"e".repeat(40)).unwrap()
    }

    #[tokio::test]
    async fn existence_of_entry_directory_is_a_hit() {
        let root = tempfile::tempdir().unwrap();
        let cache = FsBuildCache::open(root.path()).unwrap();
        assert!(!cache.exists(&sha()).await);

        std::fs::create_dir(cache.entry_path(&sha())).unwrap();
        assert!(cache.exists(&sha()).await);
    }

    #[tokio::test]
    async fn any_existing_path_is_a_hit() {
        let root = tempfile::tempdir().unwrap();
        let cache = FsBuildCache::open(root.path()).unwrap();
        std::fs::write(cache.entry_path(&sha()), b"not a directory").unwrap();
        assert!(cache.exists(&sha()).await);
    }

    #[test]
    fn open_requires_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        assert!(FsBuildCache::open(root.path().join("missing")).is_err());

        let file = root.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert!(FsBuildCache::open(&file).is_err());
    }
}
