//! # Document Module
//!
//! Near-duplicate detection for text documents.
//!
//! ## Extraction
//! | Extension | Reader |
//! |-----------|--------|
//! | pdf       | first five pages via lopdf |
//! | docx      | body paragraphs of `word/document.xml` |
//! | hwp       | `BodyText` sections of the compound file |
//! | other     | plain text with encoding fallback |
//!
//! Extraction never fails; a file that cannot be read yields `""` and drops
//! out of grouping for being too short.
//!
//! ## Similarity
//! Ratcliff/Obershelp matching ratio in percent, see [`similarity`].

mod compound;
mod encoding;
mod extract;
mod office;
mod pdf;
mod sequence;

pub use encoding::decode_text;
pub use extract::DocumentKind;
pub use sequence::{similarity, MatchBlock, SequenceMatcher};

use crate::core::comparator::{group_by_similarity, Measurement, SimilarityGroup, Threshold};
use crate::core::context::{extract_parallel, ScanContext};
use crate::core::scanner::{regular_files, MediaFilter, WalkDirScanner, DOCUMENT_EXTENSIONS};
use crate::error::{DocumentError, ScanError};
use crate::events::{AnalysisKind, CompareEvent, Event};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default matching-ratio percentage for document scans
pub const DEFAULT_SIMILARITY_PERCENT: f64 = 75.0;

/// Which structured formats can be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFormats {
    pub pdf: bool,
    pub docx: bool,
    /// OLE compound documents (hwp)
    pub compound: bool,
}

impl DocumentFormats {
    pub fn supports(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Pdf => self.pdf,
            DocumentKind::Docx => self.docx,
            DocumentKind::Compound => self.compound,
            DocumentKind::PlainText => true,
        }
    }
}

impl Default for DocumentFormats {
    fn default() -> Self {
        Self {
            pdf: true,
            docx: true,
            compound: true,
        }
    }
}

/// Configuration for text extraction and document scans
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Characters kept per document
    pub max_chars: usize,
    /// Documents need strictly more characters than this to be compared
    pub min_chars: usize,
    /// Extensions picked up by folder scans
    pub extensions: Vec<String>,
    pub formats: DocumentFormats,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_chars: 3000,
            min_chars: 10,
            extensions: DOCUMENT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            formats: DocumentFormats::default(),
        }
    }
}

impl DocumentConfig {
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_formats(mut self, formats: DocumentFormats) -> Self {
        self.formats = formats;
        self
    }
}

/// Extract text with every format enabled.
pub fn extract_text(path: &Path, max_chars: usize) -> String {
    extract::extract_text_with(path, max_chars, &DocumentFormats::default())
}

/// Document text extraction and grouping
#[derive(Default)]
pub struct DocumentEngine {
    config: DocumentConfig,
    scanner: WalkDirScanner,
}

impl DocumentEngine {
    pub fn new(config: DocumentConfig) -> Self {
        Self {
            config,
            scanner: WalkDirScanner::default(),
        }
    }

    pub fn with_scanner(mut self, scanner: WalkDirScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn extract_text(&self, path: &Path) -> String {
        extract::extract_text_with(path, self.config.max_chars, &self.config.formats)
    }

    /// Text of `path` if it is long enough to compare.
    fn comparable_text(&self, path: &Path) -> Result<String, DocumentError> {
        let text = self.extract_text(path);
        let chars = text.chars().count();
        if chars <= self.config.min_chars {
            return Err(DocumentError::InsufficientText {
                path: path.to_path_buf(),
                chars,
                min_chars: self.config.min_chars,
            });
        }
        Ok(text)
    }

    /// Group the documents under `root` whose extension is configured.
    pub fn scan_folder(&self, root: &Path, min_percent: f64) -> Result<Vec<SimilarityGroup>, ScanError> {
        self.scan_folder_with(root, min_percent, &ScanContext::silent())
    }

    pub fn scan_folder_with(
        &self,
        root: &Path,
        min_percent: f64,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, ScanError> {
        let extensions: Vec<&str> = self.config.extensions.iter().map(String::as_str).collect();
        let walked = self.scanner.scan(root, &MediaFilter::extensions(&extensions), ctx)?;
        self.group_paths(&walked.paths(), min_percent, ctx)
    }

    /// Group an explicit list of files, whatever their extension.
    pub fn scan_file_list(&self, paths: &[PathBuf], min_percent: f64) -> Result<Vec<SimilarityGroup>, ScanError> {
        self.scan_file_list_with(paths, min_percent, &ScanContext::silent())
    }

    pub fn scan_file_list_with(
        &self,
        paths: &[PathBuf],
        min_percent: f64,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, ScanError> {
        self.group_paths(&regular_files(paths), min_percent, ctx)
    }

    fn group_paths(
        &self,
        paths: &[PathBuf],
        min_percent: f64,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, ScanError> {
        let texts = extract_parallel(paths, AnalysisKind::Document, ctx, |path| {
            self.comparable_text(path)
        })?;

        ctx.events.send(Event::Compare(CompareEvent::Started {
            kind: AnalysisKind::Document,
            items: texts.items.len(),
        }));

        let groups = group_by_similarity(
            &texts.items,
            Threshold::percent(min_percent),
            |a: &String, b: &String| Measurement::percent(similarity(a, b)),
        );

        ctx.events.send(Event::Compare(CompareEvent::Completed {
            kind: AnalysisKind::Document,
            groups: groups.len(),
        }));

        tracing::info!(
            "Document scan: {} compared, {} skipped, {} groups",
            texts.items.len(),
            texts.skipped.len(),
            groups.len()
        );

        Ok(groups)
    }
}
