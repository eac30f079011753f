//! # Comparator Module
//!
//! The one clustering algorithm shared by images, videos and documents.
//!
//! ## How It Works
//! 1. Walk the items in input order
//! 2. Each item not yet claimed becomes a representative
//! 3. Later unclaimed items that pass the threshold join its group
//! 4. Groups with a single member are dropped
//!
//! ## Thresholds
//! | Media     | Metric            | Direction | Default |
//! |-----------|-------------------|-----------|---------|
//! | Images    | Hamming distance  | at most   | 10      |
//! | Videos    | matched frames %  | at least  | 60      |
//! | Documents | matching blocks % | at least  | 75      |

mod grouper;
mod traits;

pub use grouper::{group_by_similarity, REPRESENTATIVE_SCORE};
pub use traits::{hamming_threshold_from_percent, Measurement, Threshold, ThresholdDirection};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file in a similarity group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub path: PathBuf,
    /// 0-100 similarity to the representative
    pub score: f64,
}

/// Files that passed the threshold against a common representative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityGroup {
    /// Sorted by score, representative first
    pub members: Vec<GroupMember>,
}

impl SimilarityGroup {
    pub fn representative(&self) -> Option<&Path> {
        self.members.first().map(|m| m.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members other than the representative
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.members.iter().map(|m| m.path.as_path())
    }
}
