//! Dense, ID-indexed similarity matrix and sparse cosine helpers.
//!
//! Both the content and the collaborative index are a `SimilarityMatrix`:
//! square, symmetric, diagonal 1, addressed by ProdID on both axes.
//!
//! ## Construction
//! Only the upper triangle is computed (rows in parallel with Rayon) and then
//! mirrored, so `get(a, b) == get(b, a)` holds bit-for-bit. The matrix is
//! never modified after `from_pairwise` returns.

use crate::types::{ScoredProduct, rank_and_truncate};
use data_loader::ProdId;
use rayon::prelude::*;
use std::collections::HashMap;

/// Sparse vector entry: (dimension, weight), sorted by dimension
pub type SparseEntry = (usize, f64);

/// Dot product of two sparse vectors sorted by dimension
pub fn sparse_dot(a: &[SparseEntry], b: &[SparseEntry]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

pub fn sparse_norm(v: &[SparseEntry]) -> f64 {
    v.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
}

/// Cosine similarity from a dot product and precomputed norms.
///
/// Returns 0.0 when either vector is all zeros.
pub fn cosine_from_parts(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityMatrix {
    ids: Vec<ProdId>,
    index: HashMap<ProdId, usize>,
    /// Row-major n x n
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build from a pairwise similarity function over positions in `ids`.
    ///
    /// `sim(i, j)` is only called for `i < j`; results are clamped to [0, 1]
    /// to absorb floating-point overshoot. The diagonal is fixed at 1.
    pub fn from_pairwise<F>(ids: Vec<ProdId>, sim: F) -> Self
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        let n = ids.len();

        let upper: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| sim(i, j).clamp(0.0, 1.0))
                    .collect()
            })
            .collect();

        let mut values = vec![0.0; n * n];
        for (i, row) in upper.iter().enumerate() {
            values[i * n + i] = 1.0;
            for (offset, &s) in row.iter().enumerate() {
                let j = i + 1 + offset;
                values[i * n + j] = s;
                values[j * n + i] = s;
            }
        }

        let index = ids.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();
        Self { ids, index, values }
    }

    /// Similarity between two products, `None` if either is not indexed
    pub fn get(&self, a: ProdId, b: ProdId) -> Option<f64> {
        let i = *self.index.get(&a)?;
        let j = *self.index.get(&b)?;
        Some(self.values[i * self.ids.len() + j])
    }

    pub fn contains(&self, prod_id: ProdId) -> bool {
        self.index.contains_key(&prod_id)
    }

    /// Indexed products, in axis order
    pub fn ids(&self) -> &[ProdId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The `top_n` most similar products to `prod_id`, excluding itself.
    ///
    /// Returns `None` if `prod_id` is not indexed; fewer than `top_n`
    /// entries when the matrix is small.
    pub fn neighbors(&self, prod_id: ProdId, top_n: usize) -> Option<Vec<ScoredProduct>> {
        let i = *self.index.get(&prod_id)?;
        let n = self.ids.len();
        let row = &self.values[i * n..(i + 1) * n];

        let mut scored: Vec<ScoredProduct> = self
            .ids
            .iter()
            .zip(row)
            .filter(|(id, _)| **id != prod_id)
            .map(|(&id, &score)| ScoredProduct::new(id, score))
            .collect();

        rank_and_truncate(&mut scored, top_n);
        Some(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_dot() {
        let a = vec![(0, 1.0), (2, 2.0), (5, 1.0)];
        let b = vec![(2, 3.0), (4, 1.0), (5, 2.0)];
        assert_eq!(sparse_dot(&a, &b), 8.0);
        assert_eq!(sparse_dot(&a, &[]), 0.0);
    }

    #[test]
    fn test_cosine_of_zero_vector() {
        assert_eq!(cosine_from_parts(0.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let ids = vec![10, 20, 30];
        let matrix = SimilarityMatrix::from_pairwise(ids, |i, j| (i + j) as f64 / 10.0);

        for &a in &[10, 20, 30] {
            assert_eq!(matrix.get(a, a), Some(1.0));
            for &b in &[10, 20, 30] {
                assert_eq!(matrix.get(a, b), matrix.get(b, a));
            }
        }
        assert_eq!(matrix.get(10, 30), Some(0.2));
        assert_eq!(matrix.get(10, 99), None);
    }

    #[test]
    fn test_values_are_clamped() {
        let matrix = SimilarityMatrix::from_pairwise(vec![1, 2], |_, _| 1.0000000002);
        assert_eq!(matrix.get(1, 2), Some(1.0));
    }

    #[test]
    fn test_neighbors_exclude_self_and_break_ties() {
        let ids = vec![4, 1, 3, 2];
        // Every off-diagonal pair scores the same
        let matrix = SimilarityMatrix::from_pairwise(ids, |_, _| 0.5);

        let neighbors = matrix.neighbors(3, 10).unwrap();
        let ids: Vec<ProdId> = neighbors.iter().map(|s| s.prod_id).collect();
        assert_eq!(ids, vec![1, 2, 4]);

        assert_eq!(matrix.neighbors(3, 1).unwrap().len(), 1);
        assert!(matrix.neighbors(99, 5).is_none());
    }
}
