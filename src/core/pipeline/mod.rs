//! # Pipeline Module
//!
//! Wires the engines together and runs a unified scan over one root.
//!
//! ## Unified Scan
//! 1. **Images** - perceptual hash grouping under a Hamming threshold
//! 2. **Videos** - sampled-frame fingerprint grouping
//! 3. **Documents** - text matching-ratio grouping
//!
//! Each category is optional and independent: a category that fails (for
//! example because ffmpeg is missing) is reported as failed while the others
//! still run. A missing root or a cancelled scan aborts everything.

mod executor;

pub use crate::core::context::{CancellationToken, ScanContext};
pub use executor::{
    CategoryOutcome, Pipeline, PipelineBuilder, UnifiedScanRequest, UnifiedScanResult,
};
