//! # Scanner Module
//!
//! Discovers files under a root directory and classifies them.
//!
//! ## Categories
//! - **Images** - png, jpg, jpeg, bmp, gif, tiff, webp, ico
//! - **Videos**, **Audio**, **Documents** - from a MIME guess on the path
//! - **Other** - everything else
//!
//! ## Example
//! ```rust,ignore
//! use content_dedup::core::scanner::{MediaFilter, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&root, &MediaFilter::videos(), &ScanContext::silent())?;
//! ```

mod filter;
mod walker;

pub use filter::{
    MediaFilter, DOCUMENT_EXTENSIONS, IMAGE_CATEGORY_EXTENSIONS, IMAGE_SCAN_EXTENSIONS,
    VIDEO_EXTENSIONS,
};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Coarse file category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileCategory {
    Images,
    Videos,
    Audio,
    Documents,
    Other,
}

impl FileCategory {
    /// Classify a path: known image extensions first, then a MIME guess.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        if let Some(ext) = ext.as_deref() {
            if IMAGE_CATEGORY_EXTENSIONS.contains(&ext) {
                return FileCategory::Images;
            }
        }

        match mime_guess::from_path(path).first() {
            Some(mime) => match mime.type_().as_str() {
                "video" => FileCategory::Videos,
                "audio" => FileCategory::Audio,
                "text" => FileCategory::Documents,
                _ => FileCategory::Other,
            },
            None => FileCategory::Other,
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileCategory::Images => write!(f, "Images"),
            FileCategory::Videos => write!(f, "Videos"),
            FileCategory::Audio => write!(f, "Audio"),
            FileCategory::Documents => write!(f, "Documents"),
            FileCategory::Other => write!(f, "Other"),
        }
    }
}

/// A snapshot of one discovered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Coarse category
    pub category: FileCategory,
}

impl FileEntry {
    /// Stat a path and build an entry for it.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScanError::NotFound {
                path: path.to_path_buf(),
            },
            ErrorKind::PermissionDenied => ScanError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ScanError::ReadDirectory {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            category: FileCategory::from_path(path),
        })
    }

    /// Re-read size and category. Fails with `NotFound` if the file vanished.
    pub fn refresh(&self) -> Result<Self, ScanError> {
        Self::from_path(&self.path)
    }
}

/// Result of walking one root
#[derive(Debug)]
pub struct ScanResult {
    /// Files that passed the filter, in walk order
    pub files: Vec<FileEntry>,
    /// Entries that could not be read (non-fatal)
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Keep only the paths that are regular files, preserving order.
pub fn regular_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter(|p| p.is_file()).cloned().collect()
}
