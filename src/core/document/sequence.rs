//! Ratcliff/Obershelp matching over Unicode scalar values.
//!
//! The matcher finds the longest common block, then recurses on the pieces to
//! its left and right. Elements of the second sequence that occur in more than
//! 1% of its positions (for sequences of 200 or more) are not used to seed a
//! match, though a match may still extend across them.

use std::collections::HashMap;

/// Sequences at least this long get the popular-element heuristic
const AUTOJUNK_MIN_LEN: usize = 200;

/// A run `a[i..i + size] == b[j..j + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    pub i: usize,
    pub j: usize,
    pub size: usize,
}

pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    /// Positions in `b` of every non-popular element
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block in `a[alo..ahi]` x `b[blo..bhi]`, earliest in `a` then `b` on ties.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next;
        }

        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        MatchBlock {
            i: best_i,
            j: best_j,
            size: best_size,
        }
    }

    /// Non-overlapping matching blocks, sorted by position.
    pub fn matching_blocks(&self) -> Vec<MatchBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            blocks.push(block);
            if alo < block.i && blo < block.j {
                queue.push((alo, block.i, blo, block.j));
            }
            if block.i + block.size < ahi && block.j + block.size < bhi {
                queue.push((block.i + block.size, ahi, block.j + block.size, bhi));
            }
        }

        blocks.sort_by_key(|block| (block.i, block.j));
        blocks
    }

    /// `2 * matched / (len_a + len_b)`, in 0..=1. Two empty sequences score 1.
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|block| block.size).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// Text similarity in percent. Empty texts score 0.
///
/// The matcher is asymmetric, so the pair is ordered first: shorter text
/// first, lexicographic on equal length.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let key_a = (a.chars().count(), a);
    let key_b = (b.chars().count(), b);
    let (first, second) = if key_a <= key_b { (a, b) } else { (b, a) };

    SequenceMatcher::new(first, second).ratio() * 100.0
}
