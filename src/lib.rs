//! # Content Dedup
//!
//! Finds duplicate and near-duplicate files across images, videos and
//! documents, and scores image quality.
//!
//! ## Core Philosophy
//! - **Never auto-delete** - scans only report; removal is an explicit call
//! - **Degrade gracefully** - a missing collaborator disables one feature, never the scan
//! - **Explain results** - every group member carries its similarity to the representative
//!
//! ## Architecture
//! - `core` - The detection engines and the unified pipeline
//! - `events` - Event-driven progress reporting
//! - `error` - Typed errors per domain

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{EngineError, Result};

/// Initialize tracing for the library
///
/// Called by the application entry point. `RUST_LOG` takes precedence;
/// otherwise `verbose` selects `debug` over `warn`. A second call is a no-op.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
