//! Exact nearest-neighbour index under squared Euclidean distance.
//!
//! [`FlatIndex`] compares a query against every indexed vector. There is no
//! approximation and no quantisation, so results are exact and
//! deterministic. This is the right trade-off for the few hundred to low
//! thousands of documents a single store is expected to hold.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{RagError, Result};

/// One search hit: the insertion index of a vector and its distance from the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the vector in the sequence the index was built from.
    pub index: usize,
    /// Squared Euclidean distance to the query.
    pub distance: f64,
}

/// Heap entry ordered by `(distance, index)`, so the heap's maximum is the
/// worst candidate kept so far.
#[derive(Debug)]
struct Candidate(Neighbor);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .total_cmp(&other.0.distance)
            .then_with(|| self.0.index.cmp(&other.0.index))
    }
}

/// Brute-force index over a set of equal-width vectors.
///
/// Vectors are stored row-major in one contiguous buffer. The index is
/// derived state: rebuild it from the document store whenever the store
/// changes.
///
/// # Example
///
/// ```rust,ignore
/// use rag_engine::FlatIndex;
///
/// let mut index = FlatIndex::new();
/// index.build(&[vec![0.0, 0.0], vec![1.0, 0.0]])?;
/// let hits = index.search(&[0.9, 0.0], 1)?;
/// assert_eq!(hits[0].index, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the indexed vectors with `embeddings`.
    ///
    /// On error the index is left empty rather than half-built.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the vectors differ in width.
    pub fn build(&mut self, embeddings: &[Vec<f32>]) -> Result<()> {
        self.data.clear();
        self.dimensions = 0;

        let Some(first) = embeddings.first() else {
            return Ok(());
        };
        let dimensions = first.len();

        let mut data = Vec::with_capacity(dimensions * embeddings.len());
        for embedding in embeddings {
            if embedding.len() != dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: dimensions,
                    actual: embedding.len(),
                });
            }
            data.extend_from_slice(embedding);
        }

        self.dimensions = dimensions;
        self.data = data;
        Ok(())
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        if self.dimensions == 0 { 0 } else { self.data.len() / self.dimensions }
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Width of the indexed vectors, or `None` when empty.
    pub fn dimensions(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.dimensions)
    }

    /// Return up to `k` nearest vectors to `query`.
    ///
    /// Results are ordered by ascending distance; equal distances are
    /// ordered by ascending insertion index. An empty index or `k == 0`
    /// yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the query width differs
    /// from the indexed vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let k = k.min(self.len());
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        for (index, row) in self.data.chunks_exact(self.dimensions).enumerate() {
            let candidate = Candidate(Neighbor { index, distance: squared_l2(query, row) });
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        Ok(heap.into_sorted_vec().into_iter().map(|c| c.0).collect())
    }
}

/// Sum of squared per-component differences.
///
/// Each difference is taken in `f32`, then widened so the squares and the
/// running sum are `f64`.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(x - y);
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(embeddings: &[Vec<f32>]) -> FlatIndex {
        let mut index = FlatIndex::new();
        index.build(embeddings).unwrap();
        index
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = FlatIndex::new();
        assert!(index.search(&[1.0, 2.0], 5).unwrap().is_empty());
        assert_eq!(index.dimensions(), None);
    }

    #[test]
    fn zero_k_returns_nothing() {
        let index = built(&[vec![1.0]]);
        assert!(index.search(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn orders_by_ascending_distance() {
        // Distances from the origin: 4, 0, 1.
        let index = built(&[vec![2.0, 0.0], vec![0.0, 0.0], vec![0.0, 1.0]]);
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        let distances: Vec<f64> = hits.iter().map(|n| n.distance).collect();
        assert_eq!(distances, vec![0.0, 1.0, 4.0]);
    }

    #[test]
    fn ties_prefer_earlier_insertion() {
        let index = built(&[vec![5.0, 5.0], vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]]);
        let hits = index.search(&[1.0, 1.0], 2).unwrap();
        assert_eq!(hits.iter().map(|n| n.index).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let index = built(&[vec![1.0], vec![2.0]]);
        assert_eq!(index.search(&[0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn query_width_is_checked() {
        let index = built(&[vec![1.0, 2.0]]);
        let err = index.search(&[1.0], 1).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn ragged_build_leaves_index_empty() {
        let mut index = built(&[vec![1.0]]);
        assert!(index.build(&[vec![1.0, 2.0], vec![1.0]]).is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn rebuild_replaces_contents() {
        let mut index = built(&[vec![1.0], vec![2.0]]);
        index.build(&[vec![9.0, 9.0, 9.0]]).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.dimensions(), Some(3));
        index.build(&[]).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn accumulates_in_double_precision() {
        // The squared difference overflows f32 but not f64.
        let x = 3.0e19f32;
        assert!((x * x).is_infinite());
        let d = squared_l2(&[x, 0.0], &[0.0, 0.0]);
        assert!(d.is_finite());
        assert_eq!(d, f64::from(x) * f64::from(x));
    }

    #[test]
    fn differences_are_taken_in_single_precision() {
        // 1.0 - 1e-8 rounds back to 1.0 in f32.
        let d = squared_l2(&[1.0, 0.0], &[1.0e-8, 0.0]);
        assert_eq!(d, 1.0);
        assert_eq!(squared_l2(&[0.5, -0.25], &[0.5, -0.25]), 0.0);
    }
}
