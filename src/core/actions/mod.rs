//! # Actions Module
//!
//! Explicit, caller-driven file removal. Nothing in the scanning engines
//! calls into this module.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Result of [`delete_files`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletionOutcome {
    /// Paths that were removed, in request order
    pub deleted: Vec<PathBuf>,
    /// Paths that could not be removed, with the reason
    pub failed: Vec<(PathBuf, String)>,
    /// Total size of the removed files
    pub bytes_reclaimed: u64,
}

impl DeletionOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Permanently remove each path.
///
/// Every removal is attempted independently; a failure is recorded and the
/// remaining paths are still processed. Directories are refused.
pub fn delete_files<I, P>(paths: I) -> DeletionOutcome
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut outcome = DeletionOutcome::default();

    for path in paths {
        let path = path.into();
        let size = match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                outcome.failed.push((path, "is a directory".to_string()));
                continue;
            }
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!("Cannot delete {}: {}", path.display(), e);
                outcome.failed.push((path, e.to_string()));
                continue;
            }
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Deleted {} ({} bytes)", path.display(), size);
                outcome.bytes_reclaimed += size;
                outcome.deleted.push(path);
            }
            Err(e) => {
                tracing::warn!("Cannot delete {}: {}", path.display(), e);
                outcome.failed.push((path, e.to_string()));
            }
        }
    }

    outcome
}
