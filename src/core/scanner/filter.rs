//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Extensions picked up by an image folder scan
pub const IMAGE_SCAN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Extensions that classify a file as an image
pub const IMAGE_CATEGORY_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "webp", "ico"];

/// Extensions picked up by a video folder scan
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v"];

/// Extensions picked up by a document folder scan
pub const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md", "py", "pdf", "docx", "hwp", "smi", "srt"];

/// Decides which walked files are kept
#[derive(Debug, Clone)]
pub struct MediaFilter {
    /// Lowercase extensions to accept (None = accept every file)
    extensions: Option<HashSet<String>>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl MediaFilter {
    /// Accept every file
    pub fn any() -> Self {
        Self {
            extensions: None,
            include_hidden: true,
        }
    }

    /// Accept only the given extensions (case-insensitive)
    pub fn extensions(extensions: &[&str]) -> Self {
        Self {
            extensions: Some(extensions.iter().map(|e| e.to_lowercase()).collect()),
            include_hidden: true,
        }
    }

    pub fn images() -> Self {
        Self::extensions(IMAGE_SCAN_EXTENSIONS)
    }

    pub fn videos() -> Self {
        Self::extensions(VIDEO_EXTENSIONS)
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        let Some(extensions) = &self.extensions else {
            return true;
        };

        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::any()
    }
}

pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
