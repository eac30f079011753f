//! # Core Module
//!
//! The presentation-agnostic content deduplication engine.
//!
//! ## Modules
//! - `scanner` - Walks directories and classifies files by extension
//! - `digest` - MD5/SHA-256 content digests and exact-duplicate reports
//! - `hasher` - Image decoding, resizing and perceptual hashing
//! - `comparator` - Threshold grouping shared by every media type
//! - `similar` - Image similarity (pHash + SSIM) and image grouping
//! - `video` - Sampled-frame video fingerprints
//! - `document` - Text extraction and document grouping
//! - `quality` - Hybrid aesthetic/technical image scoring
//! - `pipeline` - Unified scan over all media types
//! - `actions` - Explicit file deletion

pub mod actions;
pub mod comparator;
pub mod context;
pub mod digest;
pub mod document;
pub mod hasher;
pub mod pipeline;
pub mod quality;
pub mod scanner;
pub mod similar;
pub mod video;

// Re-export commonly used types
pub use actions::{delete_files, DeletionOutcome};
pub use comparator::{GroupMember, SimilarityGroup, Threshold};
pub use context::{CancellationToken, ScanContext, SkippedFile};
pub use digest::{find_exact_duplicates, format_bytes, DualDigest, ExactDuplicateReport};
pub use document::{similarity as text_similarity, DocumentConfig, DocumentEngine};
pub use hasher::PerceptualHash;
pub use pipeline::{CategoryOutcome, Pipeline, PipelineBuilder, UnifiedScanRequest, UnifiedScanResult};
pub use quality::{HybridQualityScorer, QualityConfig, QualityReport, QualityScan};
pub use scanner::{FileCategory, ScanConfig};
pub use similar::{ImageSimilarityEngine, PairwiseSimilarity};
pub use video::{similarity as video_similarity, VideoFingerprint, VideoFingerprintEngine};
