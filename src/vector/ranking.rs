//! Distance metrics, distance-to-score mapping and top-k selection.

use crate::error::ConfigError;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

/// Similarity metric used by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    #[default]
    Cosine,
    L2,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::L2 => "l2",
        }
    }

    /// pgvector distance operator for this metric.
    pub fn distance_operator(&self) -> &'static str {
        match self {
            Metric::Cosine => "<=>",
            Metric::L2 => "<->",
        }
    }

    /// Turn a raw distance (smaller = closer) into a score (larger = closer).
    ///
    /// Cosine distance lies in [0, 2], so `1 - distance` is clamped to [-1, 1].
    /// pgvector reports NaN when either vector has zero magnitude; that maps
    /// to 0, the similarity of a zero vector.
    /// L2 scores are the negated distance: unbounded, only good for ranking.
    pub fn score_from_distance(&self, distance: f64) -> f64 {
        match self {
            Metric::Cosine if !distance.is_finite() => 0.0,
            Metric::Cosine => (1.0 - distance).clamp(-1.0, 1.0),
            Metric::L2 => -distance,
        }
    }

    /// Map a score produced under this metric into [0, 1].
    ///
    /// Cosine scores map linearly (`(s + 1) / 2`); L2 scores map to
    /// `1 / (1 + distance)`. Use this when comparing hits across stores that
    /// were configured with different metrics.
    pub fn normalized_similarity(&self, score: f64) -> f64 {
        match self {
            Metric::Cosine => ((score + 1.0) / 2.0).clamp(0.0, 1.0),
            Metric::L2 => 1.0 / (1.0 + (-score).max(0.0)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "cosine" => Ok(Metric::Cosine),
            "l2" => Ok(Metric::L2),
            _ => Err(ConfigError::UnsupportedMetric(value.to_string())),
        }
    }
}

/// A scored candidate. Orders by score, then by ascending id on ties.
#[derive(Debug)]
pub(crate) struct Scored<T> {
    pub score: f64,
    pub id: String,
    pub item: T,
}

impl<T> PartialEq for Scored<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Scored<T> {}

impl<T> PartialOrd for Scored<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scored<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Keep the best `k` candidates, returned best first.
///
/// Uses a min-heap bounded at `k`, so ranking is O(n log k).
/// Non-finite scores are dropped.
pub(crate) fn top_k<T, I>(candidates: I, k: usize) -> Vec<Scored<T>>
where
    I: IntoIterator<Item = Scored<T>>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<Scored<T>>> = BinaryHeap::with_capacity(k + 1);
    for candidate in candidates {
        if !candidate.score.is_finite() {
            continue;
        }
        if heap.len() < k {
            heap.push(Reverse(candidate));
            continue;
        }
        let beats_worst = heap
            .peek()
            .is_some_and(|Reverse(worst)| candidate > *worst);
        if beats_worst {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(candidate)| candidate)
        .collect()
}
