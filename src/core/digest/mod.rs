//! # Digest Module
//!
//! Byte-exact duplicate detection.
//!
//! Every file is streamed once through MD5 and SHA-256 at the same time, and
//! files are grouped on the pair. Only groups with two or more members are
//! reported.
//!
//! ## Example
//! ```rust,ignore
//! let report = find_exact_duplicates(Path::new("/media/archive"))?;
//! let stats = DuplicateStatistics::from_report(&report);
//! println!("{} reclaimable", format_bytes(stats.reclaimable_bytes));
//! ```

mod report;

pub use report::{
    find_exact_duplicates, find_exact_duplicates_with, DuplicateSet, DuplicateStatistics,
    ExactDuplicateReport,
};

use crate::error::HashError;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read size for streaming digests
const CHUNK_SIZE: usize = 8192;

/// MD5 and SHA-256 of the same byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DualDigest {
    pub md5: [u8; 16],
    pub sha256: [u8; 32],
}

impl DualDigest {
    /// Digest an in-memory buffer
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self {
            md5: Md5::digest(bytes).into(),
            sha256: Sha256::digest(bytes).into(),
        }
    }

    pub fn md5_hex(&self) -> String {
        to_hex(&self.md5)
    }

    pub fn sha256_hex(&self) -> String {
        to_hex(&self.sha256)
    }
}

impl std::fmt::Display for DualDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.md5_hex(), self.sha256_hex())
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Stream a file in 8 KiB chunks into both digests.
pub fn hash_file(path: &Path) -> Result<DualDigest, HashError> {
    let io_error = |source| HashError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_error)?;
    let mut md5 = Md5::new();
    let mut sha256 = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(io_error)?;
        if bytes_read == 0 {
            break;
        }
        md5.update(&buffer[..bytes_read]);
        sha256.update(&buffer[..bytes_read]);
    }

    Ok(DualDigest {
        md5: md5.finalize().into(),
        sha256: sha256.finalize().into(),
    })
}

/// Format a byte count with 1024-based units and two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}
