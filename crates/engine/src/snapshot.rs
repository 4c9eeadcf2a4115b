//! # Snapshots
//!
//! A `Snapshot` is one complete, immutable build of every artifact the
//! queries need: catalog, content index, interaction matrix, collaborative
//! index and rating scores. It is built from a raw table in one pass and
//! never modified afterwards, so any number of threads can query it at once.
//!
//! `SnapshotStore` owns the currently published snapshot behind an
//! `Arc`. A rebuild constructs the new snapshot off to the side and then
//! swaps the pointer; readers that already hold the old `Arc` finish against
//! the old data. When rebuilds overlap, the one submitted last wins no
//! matter which finishes first.
//!
//! ## Build order
//! 1. Clean the raw rows (fatal on missing columns)
//! 2. Catalog from the cleaned rows (plus any catalog-only products)
//! 3. Content index and interaction matrix -> collaborative index, in parallel
//! 4. Rating scores

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, instrument, warn};

use data_loader::{InteractionRecord, ProdId, ProductCatalog, ProductRecord, RawTable};
use sources::{
    CollaborativeSimilarityIndex, ContentSimilarityIndex, InteractionMatrix, RatedProduct,
    RatingScorer, ScoredProduct,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, QueryError, Result};

/// Counts describing one snapshot build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub input_rows: usize,
    pub cleaned_rows: usize,
    pub products: usize,
    pub rated_products: usize,
    pub users: usize,
    pub vocabulary_size: usize,
}

/// One immutable set of catalog, indexes and scores
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    max_candidates: usize,
    catalog: ProductCatalog,
    content: ContentSimilarityIndex,
    interactions: InteractionMatrix,
    collaborative: CollaborativeSimilarityIndex,
    ratings: RatingScorer,
    stats: SnapshotStats,
}

impl Snapshot {
    /// Clean `raw` and build every artifact from it
    pub fn build(raw: &RawTable, config: &EngineConfig) -> Result<Self> {
        Self::build_with_products(raw, Vec::new(), config)
    }

    /// Like `build`, with extra catalog-only products.
    ///
    /// Extra products go through the same text and ID rules as rows, then
    /// join the catalog (and so the content index) after the products seen
    /// in `raw`; they have no interactions and are absent from the
    /// collaborative index and the rating scores.
    #[instrument(skip(raw, extra_products, config), fields(rows = raw.len()))]
    pub fn build_with_products(
        raw: &RawTable,
        extra_products: Vec<ProductRecord>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let interactions = data_loader::clean(raw).map_err(EngineError::from)?;
        let mut snapshot = Self::from_interactions(&interactions, extra_products, config);
        snapshot.stats.input_rows = raw.len();
        Ok(snapshot)
    }

    /// Build from already-cleaned rows
    pub fn from_interactions(
        interactions: &[InteractionRecord],
        extra_products: Vec<ProductRecord>,
        config: &EngineConfig,
    ) -> Self {
        let start = Instant::now();

        let offered = extra_products.len();
        let extra_products: Vec<ProductRecord> = extra_products
            .into_iter()
            .filter_map(data_loader::clean_product)
            .collect();
        if extra_products.len() < offered {
            warn!(
                "Dropped {} catalog-only products with ProdID 0",
                offered - extra_products.len()
            );
        }

        let catalog = ProductCatalog::from_products(
            interactions
                .iter()
                .map(ProductRecord::from)
                .chain(extra_products),
        );

        // The two similarity builds are independent O(N^2) jobs
        let (content, (matrix, collaborative)) = rayon::join(
            || ContentSimilarityIndex::build(&catalog, &config.vectorizer),
            || {
                let matrix = InteractionMatrix::build(interactions);
                let collaborative = CollaborativeSimilarityIndex::build(&matrix);
                (matrix, collaborative)
            },
        );
        let ratings = RatingScorer::with_percentile(interactions, config.review_percentile);

        let stats = SnapshotStats {
            input_rows: interactions.len(),
            cleaned_rows: interactions.len(),
            products: catalog.len(),
            rated_products: ratings.len(),
            users: matrix.n_users(),
            vocabulary_size: content.vocabulary_size(),
        };

        info!(
            "Snapshot built in {:.2?}: {} products, {} users, {} interactions",
            start.elapsed(),
            stats.products,
            stats.users,
            stats.cleaned_rows
        );

        Self {
            generation: 0,
            max_candidates: config.max_candidates,
            catalog,
            content,
            interactions: matrix,
            collaborative,
            ratings,
            stats,
        }
    }

    // Queries - all pure reads over already-materialized data

    /// Products whose name contains `query` (case-insensitive), at most
    /// `max_candidates`, in catalog order. Never picks one on its own.
    pub fn search_by_name(&self, query: &str) -> std::result::Result<Vec<&ProductRecord>, QueryError> {
        let matches = self.catalog.search_by_name(query, self.max_candidates);
        if matches.is_empty() {
            return Err(QueryError::NoNameMatch {
                query: query.to_string(),
            });
        }
        Ok(matches)
    }

    /// Most text-similar products, excluding `prod_id` itself
    pub fn recommend_by_content_similarity(
        &self,
        prod_id: ProdId,
        top_n: usize,
    ) -> std::result::Result<Vec<ScoredProduct>, QueryError> {
        self.content
            .similar(prod_id, top_n)
            .ok_or(QueryError::ProductNotFound { prod_id })
    }

    /// Most co-rated products, excluding `prod_id` itself
    pub fn recommend_by_collaborative_similarity(
        &self,
        prod_id: ProdId,
        top_n: usize,
    ) -> std::result::Result<Vec<ScoredProduct>, QueryError> {
        if !self.catalog.contains(prod_id) {
            return Err(QueryError::ProductNotFound { prod_id });
        }
        self.collaborative
            .similar(prod_id, top_n)
            .ok_or(QueryError::NotInCollaborativeIndex { prod_id })
    }

    pub fn top_rated(&self, n: usize) -> Vec<&RatedProduct> {
        self.ratings.top_rated(n)
    }

    pub fn popular(&self, n: usize) -> Vec<&RatedProduct> {
        self.ratings.popular(n)
    }

    // Accessors

    /// 0 for a snapshot that was never published
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn content_index(&self) -> &ContentSimilarityIndex {
        &self.content
    }

    pub fn collaborative_index(&self) -> &CollaborativeSimilarityIndex {
        &self.collaborative
    }

    pub fn interactions(&self) -> &InteractionMatrix {
        &self.interactions
    }

    pub fn ratings(&self) -> &RatingScorer {
        &self.ratings
    }

    pub fn stats(&self) -> SnapshotStats {
        self.stats
    }
}

/// Holder of the published snapshot with atomic replacement.
///
/// The lock only guards the pointer swap; queries run on a cloned `Arc`
/// without holding it. Every rebuild takes a ticket when it starts, and a
/// build whose ticket is older than the published one is dropped, so
/// overlapping rebuilds always end on the most recently submitted data.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Published>,
    next_ticket: AtomicU64,
    config: EngineConfig,
}

#[derive(Debug)]
struct Published {
    ticket: u64,
    snapshot: Arc<Snapshot>,
}

impl SnapshotStore {
    /// Store serving an empty snapshot until the first publish
    pub fn new(config: EngineConfig) -> Self {
        let empty = Snapshot {
            max_candidates: config.max_candidates,
            ..Snapshot::default()
        };
        Self {
            current: RwLock::new(Published {
                ticket: 0,
                snapshot: Arc::new(empty),
            }),
            next_ticket: AtomicU64::new(0),
            config,
        }
    }

    /// Store serving `snapshot` as generation 1
    pub fn with_snapshot(mut snapshot: Snapshot, config: EngineConfig) -> Self {
        snapshot.generation = 1;
        Self {
            current: RwLock::new(Published {
                ticket: 1,
                snapshot: Arc::new(snapshot),
            }),
            next_ticket: AtomicU64::new(1),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The snapshot queries should run against right now
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().snapshot)
    }

    /// Swap in a fully built snapshot; returns its generation.
    ///
    /// Counts as a rebuild submitted now, so it fails with `Superseded` only
    /// if a rebuild started after this call is published first.
    pub fn publish(&self, snapshot: Snapshot) -> Result<u64> {
        let ticket = self.take_ticket();
        self.publish_ticketed(snapshot, ticket)
    }

    /// Build from `raw` and publish. On failure the old snapshot keeps serving.
    pub fn rebuild(&self, raw: &RawTable) -> Result<u64> {
        let ticket = self.take_ticket();
        match Snapshot::build(raw, &self.config) {
            Ok(snapshot) => self.publish_ticketed(snapshot, ticket),
            Err(e) => {
                warn!("Snapshot rebuild {} failed, keeping current snapshot: {}", ticket, e);
                Err(e)
            }
        }
    }

    /// `rebuild` on the blocking thread pool, for callers inside a Tokio runtime.
    ///
    /// The ticket is taken when this is called, not when the future is first
    /// polled, so submission order is the call order.
    pub fn rebuild_in_background(
        self: Arc<Self>,
        raw: RawTable,
    ) -> impl Future<Output = Result<u64>> + Send + 'static {
        let ticket = self.take_ticket();
        async move {
            let config = self.config.clone();
            let built = tokio::task::spawn_blocking(move || Snapshot::build(&raw, &config))
                .await
                .map_err(|e| EngineError::RebuildTaskFailed(e.to_string()))?;

            match built {
                Ok(snapshot) => self.publish_ticketed(snapshot, ticket),
                Err(e) => {
                    warn!(
                        "Background rebuild {} failed, keeping current snapshot: {}",
                        ticket, e
                    );
                    Err(e)
                }
            }
        }
    }

    fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish_ticketed(&self, mut snapshot: Snapshot, ticket: u64) -> Result<u64> {
        let mut current = self.current.write();
        if ticket < current.ticket {
            warn!(
                "Dropping snapshot from rebuild {}: rebuild {} is already published",
                ticket, current.ticket
            );
            return Err(EngineError::Superseded {
                ticket,
                published: current.ticket,
            });
        }

        let generation = current.snapshot.generation + 1;
        snapshot.generation = generation;
        *current = Published {
            ticket,
            snapshot: Arc::new(snapshot),
        };
        info!("Published snapshot generation {} (rebuild {})", generation, ticket);
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: ["UserID", "ProdID", "Rating", "Name", "Tags", "Review Count"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn sample() -> RawTable {
        raw(&[
            &["1", "1", "5", "Blue Widget", "blue widget tool", "10"],
            &["2", "1", "4", "Blue Widget", "blue widget tool", "10"],
            &["1", "2", "4", "Blue Gadget", "blue gadget tool", "20"],
            &["3", "3", "2", "Red Lamp", "red lamp light", "5"],
        ])
    }

    #[test]
    fn test_build_populates_every_artifact() {
        let snapshot = Snapshot::build(&sample(), &EngineConfig::default()).unwrap();
        let stats = snapshot.stats();
        assert_eq!(stats.input_rows, 4);
        assert_eq!(stats.cleaned_rows, 4);
        assert_eq!(stats.products, 3);
        assert_eq!(stats.users, 3);
        assert_eq!(snapshot.generation(), 0);
    }

    #[test]
    fn test_missing_column_aborts_build() {
        let mut table = sample();
        table.headers[2] = "Score".to_string();
        let err = Snapshot::build(&table, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Data(_)));
    }

    #[test]
    fn test_failed_rebuild_keeps_stale_snapshot() {
        let store = SnapshotStore::new(EngineConfig::default());
        assert_eq!(store.rebuild(&sample()).unwrap(), 1);

        let mut broken = sample();
        broken.headers[0] = "Customer".to_string();
        assert!(store.rebuild(&broken).is_err());

        let current = store.current();
        assert_eq!(current.generation(), 1);
        assert_eq!(current.catalog().len(), 3);
    }

    #[test]
    fn test_readers_keep_their_snapshot_across_swap() {
        let store = SnapshotStore::new(EngineConfig::default());
        store.rebuild(&sample()).unwrap();
        let held = store.current();

        store
            .rebuild(&raw(&[&["9", "77", "3", "Only", "solo", "1"]]))
            .unwrap();

        assert_eq!(held.catalog().len(), 3);
        assert_eq!(store.current().catalog().len(), 1);
        assert_eq!(store.current().generation(), 2);
    }

    #[test]
    fn test_empty_store_answers_not_found() {
        let store = SnapshotStore::new(EngineConfig::default());
        let snapshot = store.current();
        assert!(snapshot.search_by_name("x").is_err());
        assert!(snapshot.recommend_by_content_similarity(1, 5).is_err());
        assert!(snapshot.top_rated(5).is_empty());
    }

    #[test]
    fn test_older_rebuild_cannot_replace_newer() {
        let config = EngineConfig::default();
        let store = SnapshotStore::new(config.clone());
        let older = store.take_ticket();
        let newer = store.take_ticket();

        let old = Snapshot::build(&sample(), &config).unwrap();
        let new = Snapshot::build(&raw(&[&["9", "77", "3", "Only", "solo", "1"]]), &config).unwrap();

        // the newer build finishes first, the older one last
        assert_eq!(store.publish_ticketed(new, newer).unwrap(), 1);
        let err = store.publish_ticketed(old, older).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Superseded { ticket, published } if ticket == older && published == newer
        ));

        let current = store.current();
        assert_eq!(current.generation(), 1);
        assert!(current.catalog().contains(77));
        assert_eq!(current.catalog().len(), 1);
    }

    #[test]
    fn test_publish_after_rebuild_advances_generation() {
        let config = EngineConfig::default();
        let store = SnapshotStore::with_snapshot(Snapshot::build(&sample(), &config).unwrap(), config.clone());
        assert_eq!(store.current().generation(), 1);

        let next = Snapshot::build(&raw(&[&["9", "77", "3", "Only", "solo", "1"]]), &config).unwrap();
        assert_eq!(store.publish(next).unwrap(), 2);
        assert_eq!(store.rebuild(&sample()).unwrap(), 3);
        assert_eq!(store.current().catalog().len(), 3);
    }

    #[test]
    fn test_catalog_only_products_are_cleaned() {
        let extra = |prod_id: ProdId| ProductRecord {
            prod_id,
            name: "Green|Lamp".to_string(),
            brand: String::new(),
            category: "Lighting".to_string(),
            description: String::new(),
            tags: "green|lamp light".to_string(),
            review_count: 0,
        };
        let snapshot = Snapshot::build_with_products(
            &sample(),
            vec![extra(0), extra(40)],
            &EngineConfig::default(),
        )
        .unwrap();

        assert!(!snapshot.catalog().contains(0));
        assert_eq!(snapshot.stats().products, 4);
        let lamp = snapshot.catalog().get(40).unwrap();
        assert_eq!(lamp.name, "GreenLamp");
        assert_eq!(lamp.tags, "greenlamp light");
        assert!(snapshot.recommend_by_content_similarity(40, 5).is_ok());
    }

    #[tokio::test]
    async fn test_background_rebuild_publishes() {
        let store = Arc::new(SnapshotStore::new(EngineConfig::default()));
        let generation = Arc::clone(&store)
            .rebuild_in_background(sample())
            .await
            .unwrap();
        assert_eq!(generation, 1);
        assert_eq!(store.current().catalog().len(), 3);
    }
}
