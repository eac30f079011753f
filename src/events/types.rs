//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory walking events
    Scan(ScanEvent),
    /// Per-item feature extraction events (digests, hashes, fingerprints, text, scores)
    Analyze(AnalyzeEvent),
    /// Grouping phase events
    Compare(CompareEvent),
    /// Unified-scan events
    Pipeline(PipelineEvent),
}

/// The kind of per-item analysis being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    /// MD5 + SHA-256 content digest
    Digest,
    /// Image perceptual hash
    Image,
    /// Video frame fingerprint
    Video,
    /// Document text extraction
    Document,
    /// Hybrid quality score
    Quality,
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisKind::Digest => write!(f, "Hashing files"),
            AnalysisKind::Image => write!(f, "Hashing images"),
            AnalysisKind::Video => write!(f, "Fingerprinting videos"),
            AnalysisKind::Document => write!(f, "Extracting text"),
            AnalysisKind::Quality => write!(f, "Scoring quality"),
        }
    }
}

/// Events during directory walking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Walking has started
    Started { root: PathBuf },
    /// Progress update during walking
    Progress(ScanProgress),
    /// An entry could not be read but walking continues
    Error { path: PathBuf, message: String },
    /// Walking completed
    Completed { total_files: usize },
}

/// Progress information during walking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories visited so far
    pub directories_scanned: usize,
    /// Number of matching files found so far
    pub files_found: usize,
    /// Current directory being walked
    pub current_path: PathBuf,
}

/// Events during per-item analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnalyzeEvent {
    /// Analysis has started
    Started { kind: AnalysisKind, total: usize },
    /// One more item finished (successfully or not)
    Progress(AnalyzeProgress),
    /// An item failed and was left out of the results
    Skipped {
        kind: AnalysisKind,
        path: PathBuf,
        message: String,
    },
    /// Analysis completed
    Completed {
        kind: AnalysisKind,
        analyzed: usize,
        skipped: usize,
    },
}

/// Progress information during analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeProgress {
    pub kind: AnalysisKind,
    /// Number of items processed so far
    pub completed: usize,
    /// Total number of items to process
    pub total: usize,
    /// Item just processed
    pub current_path: PathBuf,
}

/// Events during grouping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Grouping has started
    Started { kind: AnalysisKind, items: usize },
    /// Grouping completed
    Completed { kind: AnalysisKind, groups: usize },
}

/// Unified-scan events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Unified scan has started
    Started,
    /// Moving to a new media category
    PhaseChanged { phase: PipelinePhase },
    /// A category failed; the remaining categories still run
    PhaseFailed { phase: PipelinePhase, message: String },
    /// Unified scan completed
    Completed { summary: PipelineSummary },
    /// Scan was cancelled
    Cancelled,
}

/// Phases of the unified scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Images,
    Videos,
    Documents,
}

/// Summary of a unified scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Similar image groups found
    pub image_groups: usize,
    /// Similar video groups found
    pub video_groups: usize,
    /// Similar document groups found
    pub document_groups: usize,
    /// Categories that failed
    pub failed_phases: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Images => write!(f, "Images"),
            PipelinePhase::Videos => write!(f, "Videos"),
            PipelinePhase::Documents => write!(f, "Documents"),
        }
    }
}
