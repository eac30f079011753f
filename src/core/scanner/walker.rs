//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, MediaFilter};
use super::{FileEntry, ScanResult};
use crate::core::context::ScanContext;
use crate::error::ScanError;
use crate::events::{Event, ScanEvent, ScanProgress};
use std::path::Path;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
        }
    }
}

/// Scanner implementation using the walkdir crate
#[derive(Debug, Clone, Default)]
pub struct WalkDirScanner {
    config: ScanConfig,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Walk `root` recursively and collect the regular files that pass `filter`.
    ///
    /// Entries are visited in file-name order within each directory, so
    /// repeated scans of an unchanged tree return the same order.
    pub fn scan(
        &self,
        root: &Path,
        filter: &MediaFilter,
        ctx: &ScanContext,
    ) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let filter = filter.clone().with_hidden(self.config.include_hidden);
        let events = &ctx.events;

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut files = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let walker = walker
            .into_iter()
            .filter_entry(move |e| include_hidden || e.depth() == 0 || !is_hidden(e.path()));

        for entry_result in walker {
            ctx.checkpoint()?;

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        directories_scanned += 1;
                        events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                            directories_scanned,
                            files_found: files.len(),
                            current_path: path.to_path_buf(),
                        })));
                        continue;
                    }

                    if !file_type.is_file() || !filter.should_include(path) {
                        continue;
                    }

                    match FileEntry::from_path(path) {
                        Ok(file) => files.push(file),
                        Err(error) => {
                            tracing::warn!("Cannot stat {}: {}", path.display(), error);
                            events.send(Event::Scan(ScanEvent::Error {
                                path: path.to_path_buf(),
                                message: error.to_string(),
                            }));
                            errors.push(error);
                        }
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();

                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    tracing::warn!("{}", error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: files.len(),
        }));

        tracing::debug!(
            "Walked {}: {} files in {} directories",
            root.display(),
            files.len(),
            directories_scanned
        );

        Ok(ScanResult { files, errors })
    }
}
