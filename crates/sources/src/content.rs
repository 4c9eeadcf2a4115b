//! Content Source - text similarity between products
//!
//! "Products described like this one": cosine similarity between the TF-IDF
//! vectors of every pair of catalog products, computed once per snapshot.
//! Depends only on catalog text, so products without any interactions are
//! still indexed.

use crate::similarity::{SimilarityMatrix, cosine_from_parts};
use crate::types::ScoredProduct;
use crate::vectorizer::{FeatureVectorizer, VectorizerConfig};
use data_loader::{ProdId, ProductCatalog};
use tracing::{info, instrument};

/// Pairwise content similarity over the whole catalog
#[derive(Debug, Clone, Default)]
pub struct ContentSimilarityIndex {
    matrix: SimilarityMatrix,
    vocabulary_size: usize,
}

impl ContentSimilarityIndex {
    /// Vectorize every catalog product and materialize the N x N matrix
    #[instrument(skip(catalog, config), fields(products = catalog.len()))]
    pub fn build(catalog: &ProductCatalog, config: &VectorizerConfig) -> Self {
        let mut vectorizer = FeatureVectorizer::new(config.clone());

        let documents: Vec<String> = catalog
            .products()
            .iter()
            .map(|p| vectorizer.composite_document(p))
            .collect();
        let vectors = vectorizer.fit_transform(&documents);
        let norms: Vec<f64> = vectors.iter().map(|v| v.norm()).collect();

        let ids: Vec<ProdId> = catalog.ids().collect();
        let matrix = SimilarityMatrix::from_pairwise(ids, |i, j| {
            cosine_from_parts(vectors[i].dot(&vectors[j]), norms[i], norms[j])
        });

        info!(
            "Built content similarity index: {} x {} over {} terms",
            matrix.len(),
            matrix.len(),
            vectorizer.vocabulary_size()
        );
        Self {
            matrix,
            vocabulary_size: vectorizer.vocabulary_size(),
        }
    }

    pub fn similarity(&self, a: ProdId, b: ProdId) -> Option<f64> {
        self.matrix.get(a, b)
    }

    /// Most similar products, excluding `prod_id`; `None` if not indexed
    pub fn similar(&self, prod_id: ProdId, top_n: usize) -> Option<Vec<ScoredProduct>> {
        self.matrix.neighbors(prod_id, top_n)
    }

    pub fn contains(&self, prod_id: ProdId) -> bool {
        self.matrix.contains(prod_id)
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::ProductRecord;

    fn product(prod_id: ProdId, tags: &str, category: &str, brand: &str) -> ProductRecord {
        ProductRecord {
            prod_id,
            name: format!("Product {}", prod_id),
            brand: brand.to_string(),
            category: category.to_string(),
            description: String::new(),
            tags: tags.to_string(),
            review_count: 0,
        }
    }

    fn test_catalog() -> ProductCatalog {
        ProductCatalog::from_products(vec![
            product(1, "matte lipstick red", "makeup lips", "glamco"),
            product(2, "matte lipstick nude", "makeup lips", "glamco"),
            product(3, "hair shampoo volume", "hair care", "silka"),
            product(4, "hair conditioner volume", "hair care", "silka"),
            product(5, "", "", ""),
        ])
    }

    #[test]
    fn test_similar_products_rank_first() {
        let index = ContentSimilarityIndex::build(&test_catalog(), &VectorizerConfig::default());

        let similar = index.similar(1, 2).unwrap();
        assert_eq!(similar[0].prod_id, 2);
        assert!(similar[0].score > 0.5);
        assert!(index.similarity(1, 3).unwrap() < similar[0].score);
    }

    #[test]
    fn test_diagonal_and_symmetry() {
        let catalog = test_catalog();
        let index = ContentSimilarityIndex::build(&catalog, &VectorizerConfig::default());

        for a in catalog.ids() {
            // Includes the product with an empty document
            assert!((index.similarity(a, a).unwrap() - 1.0).abs() < 1e-12);
            for b in catalog.ids() {
                assert_eq!(index.similarity(a, b), index.similarity(b, a));
                let s = index.similarity(a, b).unwrap();
                assert!((0.0..=1.0).contains(&s));
            }
        }
    }

    #[test]
    fn test_unknown_product() {
        let index = ContentSimilarityIndex::build(&test_catalog(), &VectorizerConfig::default());
        assert!(index.similar(42, 5).is_none());
        assert!(!index.contains(42));
    }
}
