//! Collaborative Source - co-rating similarity between products
//!
//! "Products rated like this one": each product is the vector of ratings it
//! received from every user (0 where unrated); similarity is the cosine
//! between those column vectors.
//!
//! Only products with at least one cleaned interaction are indexed.

use crate::interaction::InteractionMatrix;
use crate::similarity::{SimilarityMatrix, cosine_from_parts, sparse_dot, sparse_norm};
use crate::types::ScoredProduct;
use data_loader::ProdId;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct CollaborativeSimilarityIndex {
    matrix: SimilarityMatrix,
}

impl CollaborativeSimilarityIndex {
    /// Item-item cosine over the columns of `interactions`
    #[instrument(skip(interactions), fields(products = interactions.n_products(), users = interactions.n_users()))]
    pub fn build(interactions: &InteractionMatrix) -> Self {
        let columns = interactions.columns();
        let norms: Vec<f64> = columns.iter().map(|c| sparse_norm(c)).collect();

        let matrix = SimilarityMatrix::from_pairwise(interactions.prod_ids().to_vec(), |i, j| {
            cosine_from_parts(sparse_dot(&columns[i], &columns[j]), norms[i], norms[j])
        });

        info!(
            "Built collaborative similarity index: {} x {}",
            matrix.len(),
            matrix.len()
        );
        Self { matrix }
    }

    pub fn similarity(&self, a: ProdId, b: ProdId) -> Option<f64> {
        self.matrix.get(a, b)
    }

    /// Most similar products, excluding `prod_id`; `None` if it has no interactions
    pub fn similar(&self, prod_id: ProdId, top_n: usize) -> Option<Vec<ScoredProduct>> {
        self.matrix.neighbors(prod_id, top_n)
    }

    pub fn contains(&self, prod_id: ProdId) -> bool {
        self.matrix.contains(prod_id)
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{InteractionRecord, UserId};

    fn interaction(user_id: UserId, prod_id: ProdId, rating: f64) -> InteractionRecord {
        InteractionRecord {
            user_id,
            prod_id,
            rating,
            name: String::new(),
            brand: String::new(),
            category: String::new(),
            description: String::new(),
            tags: String::new(),
            review_count: 0,
        }
    }

    fn test_matrix() -> InteractionMatrix {
        InteractionMatrix::build(&[
            // Products 1 and 2 rated identically by users 1 and 2
            interaction(1, 1, 5.0),
            interaction(1, 2, 5.0),
            interaction(2, 1, 3.0),
            interaction(2, 2, 3.0),
            // Product 3 shares only user 2
            interaction(2, 3, 4.0),
            interaction(3, 3, 4.0),
            // Product 4 shares no users
            interaction(4, 4, 2.0),
        ])
    }

    #[test]
    fn test_co_rated_products_are_most_similar() {
        let index = CollaborativeSimilarityIndex::build(&test_matrix());

        assert!((index.similarity(1, 2).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(index.similarity(1, 4), Some(0.0));

        let similar = index.similar(3, 10).unwrap();
        let ids: Vec<ProdId> = similar.iter().map(|s| s.prod_id).collect();
        // 1 and 2 tie on score, ties break by ascending id
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn test_cosine_value() {
        let index = CollaborativeSimilarityIndex::build(&test_matrix());
        // col1 = (5, 3, 0, 0), col3 = (0, 4, 4, 0)
        let expected = 12.0 / ((34.0f64).sqrt() * (32.0f64).sqrt());
        assert!((index.similarity(1, 3).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_products_without_interactions_are_absent() {
        let index = CollaborativeSimilarityIndex::build(&test_matrix());
        assert!(!index.contains(99));
        assert!(index.similar(99, 5).is_none());
    }
}
