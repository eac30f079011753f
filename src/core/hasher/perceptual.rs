//! 64-bit DCT perceptual hash.
//!
//! The image is reduced, passed through a discrete cosine transform, and the
//! low-frequency coefficients are thresholded against their median. Small
//! edits (recompression, resizing, mild colour shifts) move only a few bits,
//! so the Hamming distance between two hashes tracks visual difference.

use super::fast_decode::FastDecoder;
use crate::error::HashError;
use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bits in a [`PerceptualHash`]
pub const HASH_BITS: u32 = 64;

/// A 64-bit perceptual fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerceptualHash(pub u64);

impl PerceptualHash {
    /// Build from the first eight bytes of a hash, most significant first.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
        Some(Self(u64::from_be_bytes(array)))
    }

    /// Number of differing bits (0-64)
    pub fn distance(&self, other: &Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// `(64 - distance) / 64 * 100`
    pub fn similarity_percent(&self, other: &Self) -> f64 {
        similarity_from_distance(self.distance(other))
    }

    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl std::fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Percentage similarity for a Hamming distance between 64-bit hashes
pub fn similarity_from_distance(distance: u32) -> f64 {
    (HASH_BITS.saturating_sub(distance)) as f64 / HASH_BITS as f64 * 100.0
}

/// pHash implementation backed by image_hasher (DCT preprocessing + median)
pub struct PerceptualHasher {
    hasher: Hasher,
}

impl PerceptualHasher {
    pub fn new() -> Self {
        let hasher = HasherConfig::new()
            .hash_size(8, 8)
            .preproc_dct()
            .hash_alg(HashAlg::Median)
            .to_hasher();

        Self { hasher }
    }

    /// Hash an already decoded image
    pub fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash, HashError> {
        let hash = self.hasher.hash_image(image);
        PerceptualHash::from_bytes(hash.as_bytes()).ok_or_else(|| {
            HashError::ComputationFailed(format!(
                "expected a 64-bit hash, got {} bytes",
                hash.as_bytes().len()
            ))
        })
    }

    /// Read a file's bytes, decode them and hash the result
    pub fn hash_file(&self, path: &Path) -> Result<PerceptualHash, HashError> {
        let image = FastDecoder::decode(path)?;
        self.hash_image(&image)
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}
