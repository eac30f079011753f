//! # Hasher Module
//!
//! Decodes images from raw bytes and computes 64-bit perceptual hashes.
//!
//! ## How It Works
//! 1. Sniff the encoding from magic bytes and decode (zune-jpeg for JPEG)
//! 2. Reduce and transform with a DCT
//! 3. Threshold the low frequencies against their median
//! 4. Compare hashes using Hamming distance
//!
//! Video frames reuse the same hasher, so image and video similarity share
//! one notion of "looks the same".
//!
//! ## Example
//! ```rust,ignore
//! use content_dedup::core::hasher::PerceptualHasher;
//!
//! let hasher = PerceptualHasher::new();
//! let a = hasher.hash_file(&path_a)?;
//! let b = hasher.hash_file(&path_b)?;
//! println!("{} bits differ", a.distance(&b));
//! ```

pub mod fast_decode;
pub mod fast_resize;
mod grayscale;
pub mod mmap_decode;
mod perceptual;

pub use fast_decode::FastDecoder;
pub use fast_resize::FastResizer;
pub use grayscale::luma_bt601;
pub use perceptual::{similarity_from_distance, PerceptualHash, PerceptualHasher, HASH_BITS};
