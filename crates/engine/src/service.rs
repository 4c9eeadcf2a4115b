//! # Recommendation Service
//!
//! Front door for queries. Each call grabs the current snapshot once and
//! answers entirely from it, then joins catalog metadata onto the raw
//! `(prod_id, score)` results to produce presentation rows.
//!
//! Cloning the service is cheap; clones share the same `SnapshotStore`.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use data_loader::{ProdId, ProductCatalog, ProductRecord};
use sources::{RatedProduct, ScoredProduct};

use crate::config::EngineConfig;
use crate::error::QueryError;
use crate::snapshot::{Snapshot, SnapshotStore};

/// One row of a similarity recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub prod_id: ProdId,
    pub name: String,
    pub category: String,
    pub review_count: u64,
    pub brand: String,
    pub score: f64,
}

/// One row of a rating-based ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedSummary {
    pub prod_id: ProdId,
    pub name: String,
    pub category: String,
    pub rating: f64,
    /// Mean review count over the product's rows
    pub review_count: f64,
    pub brand: String,
    pub score: f64,
}

impl From<&RatedProduct> for RatedSummary {
    fn from(product: &RatedProduct) -> Self {
        Self {
            prod_id: product.prod_id,
            name: product.name.clone(),
            category: product.category.clone(),
            rating: product.rating,
            review_count: product.review_count,
            brand: product.brand.clone(),
            score: product.score,
        }
    }
}

fn summarize(catalog: &ProductCatalog, scored: Vec<ScoredProduct>) -> Vec<ProductSummary> {
    scored
        .into_iter()
        // Every indexed id comes from the catalog of the same snapshot
        .filter_map(|s| {
            catalog.get(s.prod_id).map(|p| ProductSummary {
                prod_id: p.prod_id,
                name: p.name.clone(),
                category: p.category.clone(),
                review_count: p.review_count,
                brand: p.brand.clone(),
                score: s.score,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct RecommendationService {
    store: Arc<SnapshotStore>,
}

impl RecommendationService {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    /// Service over a single already-built snapshot
    pub fn from_snapshot(snapshot: Snapshot, config: EngineConfig) -> Self {
        Self::new(Arc::new(SnapshotStore::with_snapshot(snapshot, config)))
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    pub fn default_top_n(&self) -> usize {
        self.store.config().default_top_n
    }

    /// Name-search candidates for the caller to choose from
    pub fn search(&self, query: &str) -> Result<Vec<ProductRecord>, QueryError> {
        let snapshot = self.snapshot();
        let matches = snapshot.search_by_name(query)?;
        debug!("Name search '{}' matched {} products", query, matches.len());
        Ok(matches.into_iter().cloned().collect())
    }

    #[instrument(skip(self))]
    pub fn recommend_content(
        &self,
        prod_id: ProdId,
        top_n: usize,
    ) -> Result<Vec<ProductSummary>, QueryError> {
        let start = Instant::now();
        let snapshot = self.snapshot();
        let scored = snapshot.recommend_by_content_similarity(prod_id, top_n)?;
        let rows = summarize(snapshot.catalog(), scored);
        debug!("Content query answered in {:.2?}", start.elapsed());
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub fn recommend_collaborative(
        &self,
        prod_id: ProdId,
        top_n: usize,
    ) -> Result<Vec<ProductSummary>, QueryError> {
        let start = Instant::now();
        let snapshot = self.snapshot();
        let scored = snapshot.recommend_by_collaborative_similarity(prod_id, top_n)?;
        let rows = summarize(snapshot.catalog(), scored);
        debug!("Collaborative query answered in {:.2?}", start.elapsed());
        Ok(rows)
    }

    pub fn top_rated(&self, n: usize) -> Vec<RatedSummary> {
        let snapshot = self.snapshot();
        snapshot.top_rated(n).into_iter().map(RatedSummary::from).collect()
    }

    pub fn popular(&self, n: usize) -> Vec<RatedSummary> {
        let snapshot = self.snapshot();
        snapshot.popular(n).into_iter().map(RatedSummary::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::RawTable;

    fn service() -> RecommendationService {
        let raw = RawTable {
            headers: ["UserID", "ProdID", "Rating", "Name", "Brand", "Tags", "Review Count"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: [
                ["1", "10", "5", "Blue Widget", "Acme", "blue widget tool", "40"],
                ["2", "10", "4", "Blue Widget", "Acme", "blue widget tool", "40"],
                ["1", "20", "4", "Blue Gadget", "Acme", "blue gadget tool", "10"],
                ["3", "30", "3", "Red Lamp", "Lumo", "red lamp light", "5"],
            ]
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
        };
        let config = EngineConfig::default();
        let snapshot = Snapshot::build(&raw, &config).unwrap();
        RecommendationService::from_snapshot(snapshot, config)
    }

    #[test]
    fn test_search_returns_owned_candidates() {
        let names: Vec<String> = service()
            .search("blue")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Blue Widget", "Blue Gadget"]);
    }

    #[test]
    fn test_content_rows_carry_catalog_metadata() {
        let rows = service().recommend_content(10, 5).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].prod_id, 20);
        assert_eq!(rows[0].brand, "Acme");
        assert_eq!(rows[0].review_count, 10);
        assert!(rows.iter().all(|r| r.prod_id != 10));
    }

    #[test]
    fn test_collaborative_unknown_product() {
        let err = service().recommend_collaborative(999, 5).unwrap_err();
        assert_eq!(err, QueryError::ProductNotFound { prod_id: 999 });
    }

    #[test]
    fn test_rated_rows_follow_ranking() {
        let svc = service();
        let popular = svc.popular(10);
        assert_eq!(popular[0].prod_id, 10);
        assert_eq!(popular[0].review_count, 40.0);

        let top = svc.top_rated(2);
        assert_eq!(top.len(), 2);
        assert!(top[0].score >= top[1].score);
    }

    #[test]
    fn test_clones_share_the_store() {
        let svc = service();
        let clone = svc.clone();
        assert!(Arc::ptr_eq(svc.store(), clone.store()));
        assert_eq!(clone.snapshot().generation(), 1);
    }
}
