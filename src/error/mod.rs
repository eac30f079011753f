//! # Error Module
//!
//! Error types for the content-analysis engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Isolate per-file failures** - one broken file never aborts a scan
//! - **Report missing capabilities** - an absent collaborator disables a feature, it does not crash

use std::path::PathBuf;
use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Quality analysis error: {0}")]
    Quality(#[from] QualityError),

    #[error("{0}")]
    Capability(#[from] CapabilityError),
}

/// Errors that occur while walking a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File disappeared during the scan: {path}")]
    NotFound { path: PathBuf },

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors that occur while reading, decoding or hashing a file
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Hash computation failed: {0}")]
    ComputationFailed(String),

    #[error("Failed to read file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the video container reader
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to open video {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Video reports no frames: {path}")]
    NoFrames { path: PathBuf },

    #[error("Only {decoded} of {required} required frames decoded from {path}")]
    TooFewFrames {
        path: PathBuf,
        decoded: usize,
        required: usize,
    },

    #[error("Failed to decode frame {index} of {path}: {reason}")]
    FrameDecode {
        path: PathBuf,
        index: u64,
        reason: String,
    },
}

/// Errors raised while extracting document text
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed document {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    #[error("Too little text in {path}: {chars} characters (need more than {min_chars})")]
    InsufficientText {
        path: PathBuf,
        chars: usize,
        min_chars: usize,
    },
}

/// Errors raised while scoring image quality
#[derive(Error, Debug)]
pub enum QualityError {
    #[error("Failed to load image for quality analysis: {0}")]
    Decode(#[from] HashError),

    #[error("Aesthetic model failed on {path}: {reason}")]
    Model { path: PathBuf, reason: String },

    #[error("Quality metric failed on {path}: {reason}")]
    Metric { path: PathBuf, reason: String },

    #[error("{0}")]
    Unavailable(#[from] CapabilityError),
}

/// An optional collaborator is not loaded
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("{capability} is unavailable; the feature is disabled")]
    Unavailable { capability: &'static str },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
