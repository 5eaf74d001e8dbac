//! Scratch directories for build attempts.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::warn;

/// Prefix of workspace directories. A leading `.` keeps them from ever being
/// mistaken for a 40-hex cache entry.
pub const WORKSPACE_PREFIX: &str = ".build-";

/// A fresh directory that holds one clone/checkout/build attempt.
///
/// Creation and removal run on Tokio's blocking pool, since a checkout with
/// its own dependency tree can take seconds to delete. Call
/// [`BuildWorkspace::remove`] when the attempt ends; if the value is dropped
/// instead (a cancelled build), removal is handed to the blocking pool, or
/// done in place outside a runtime. Symbolic links inside the workspace are
/// removed, not followed.
#[derive(Debug)]
pub struct BuildWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl BuildWorkspace {
    /// Creates an empty workspace under `root`.
    ///
    /// Placing workspaces under the output root keeps the final publish a
    /// same-filesystem rename.
    pub async fn create_in(root: &Path) -> io::Result<Self> {
        let root = root.to_path_buf();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(WORKSPACE_PREFIX)
                .tempdir_in(root)
        })
        .await
        .map_err(io::Error::other)??;
        let path = dir.path().to_path_buf();
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Joins `relative` onto the workspace directory.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    /// Deletes the workspace and waits for the deletion to finish.
    pub async fn remove(mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(workspace = %self.path.display(), error = %e, "failed to remove build workspace");
            }
            Err(e) => {
                warn!(workspace = %self.path.display(), error = %e, "workspace removal task failed");
            }
        }
    }
}

impl Drop for BuildWorkspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn_blocking(move || drop(dir));
        }
    }
}
