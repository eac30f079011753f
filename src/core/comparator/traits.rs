//! Thresholds and measurements consumed by the grouper.

use crate::core::hasher::HASH_BITS;
use serde::{Deserialize, Serialize};

/// Which side of the threshold value counts as a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdDirection {
    /// `metric <= value` (distance-style)
    AtMost,
    /// `metric >= value` (percentage-style)
    AtLeast,
}

/// Acceptance rule for one pairwise measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub value: f64,
    pub direction: ThresholdDirection,
}

impl Threshold {
    /// Hamming distance cutoff for 64-bit hashes.
    ///
    /// Recommended values:
    /// - 5: conservative, few false positives
    /// - 10: default, catches recompressed and resized copies
    /// - 15+: permissive
    pub fn hamming(max_distance: u32) -> Self {
        Self {
            value: max_distance as f64,
            direction: ThresholdDirection::AtMost,
        }
    }

    /// Minimum similarity percentage
    pub fn percent(min_percent: f64) -> Self {
        Self {
            value: min_percent,
            direction: ThresholdDirection::AtLeast,
        }
    }

    pub fn accepts(&self, metric: f64) -> bool {
        match self.direction {
            ThresholdDirection::AtMost => metric <= self.value,
            ThresholdDirection::AtLeast => metric >= self.value,
        }
    }
}

/// Result of comparing two features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Value tested against the threshold
    pub metric: f64,
    /// Reported 0-100 similarity
    pub score: f64,
}

impl Measurement {
    pub fn new(metric: f64, score: f64) -> Self {
        Self { metric, score }
    }

    /// Metric and score are the same percentage
    pub fn percent(score: f64) -> Self {
        Self {
            metric: score,
            score,
        }
    }
}

/// Convert a similarity slider percentage into a Hamming distance cutoff:
/// `floor(64 * (100 - pct) / 100)`.
pub fn hamming_threshold_from_percent(percent: f64) -> u32 {
    let percent = percent.clamp(0.0, 100.0);
    (HASH_BITS as f64 * (100.0 - percent) / 100.0).floor() as u32
}
