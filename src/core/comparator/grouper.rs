//! Greedy forward clustering around representatives.
//!
//! Each unprocessed item in turn becomes a representative and absorbs every
//! later unprocessed item that passes the threshold against it. The result
//! depends on input order and is not transitive: if A matches B and B matches
//! C but A does not match C, then with input `[A, B, C]` the group is `{A, B}`
//! and C stays alone, because C is only ever compared against earlier
//! representatives and never gets to pick up B.

use super::{GroupMember, Measurement, SimilarityGroup, Threshold};
use rayon::prelude::*;
use std::path::PathBuf;

/// Score given to a group's representative
pub const REPRESENTATIVE_SCORE: f64 = 100.0;

/// Cluster `items` with `compare` against `threshold`.
///
/// Comparisons for one representative run in parallel; acceptance happens in
/// input order, so the output is identical to a sequential pass.
pub fn group_by_similarity<F, C>(
    items: &[(PathBuf, F)],
    threshold: Threshold,
    compare: C,
) -> Vec<SimilarityGroup>
where
    F: Sync,
    C: Fn(&F, &F) -> Measurement + Sync,
{
    let n = items.len();
    let mut processed = vec![false; n];
    let mut groups = Vec::new();

    for i in 0..n {
        if processed[i] {
            continue;
        }

        let (representative, feature) = &items[i];

        let candidates: Vec<usize> = (i + 1..n).filter(|&j| !processed[j]).collect();
        let measurements: Vec<(usize, Measurement)> = candidates
            .par_iter()
            .map(|&j| (j, compare(feature, &items[j].1)))
            .collect();

        let mut members = vec![GroupMember {
            path: representative.clone(),
            score: REPRESENTATIVE_SCORE,
        }];

        for (j, measurement) in measurements {
            if threshold.accepts(measurement.metric) {
                processed[j] = true;
                members.push(GroupMember {
                    path: items[j].0.clone(),
                    score: measurement.score,
                });
            }
        }

        if members.len() > 1 {
            processed[i] = true;
            // stable: ties keep discovery order
            members.sort_by(|a, b| b.score.total_cmp(&a.score));
            groups.push(SimilarityGroup { members });
        }
    }

    groups
}
