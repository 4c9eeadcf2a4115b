//! Rating Source - credibility-weighted product scores
//!
//! ## Algorithm
//! 1. Aggregate cleaned rows per product: mean rating `R`, mean review count `v`,
//!    first-seen name / category / brand
//! 2. `C` = mean of `R` over all products
//! 3. `m` = 75th percentile of `v` over all products (computed after step 1)
//! 4. `score = v/(v+m) * R + m/(v+m) * C`
//!
//! Products with little review volume are pulled toward `C`, so a single
//! 5-star rating cannot outrank thousands of 4.5-star ones. `popular` ranks
//! by raw review volume instead, ignoring rating quality.

use crate::types::rank_order;
use data_loader::{InteractionRecord, ProdId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Default quantile for the review-volume threshold `m`
pub const DEFAULT_REVIEW_PERCENTILE: f64 = 0.75;

/// Per-product aggregate with its weighted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedProduct {
    pub prod_id: ProdId,
    pub name: String,
    pub category: String,
    pub brand: String,
    /// Mean rating (`R`)
    pub rating: f64,
    /// Mean review count (`v`)
    pub review_count: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RatingScorer {
    /// Sorted by ProdID
    products: Vec<RatedProduct>,
    global_mean: f64,
    review_threshold: f64,
    by_score: Vec<usize>,
    by_popularity: Vec<usize>,
}

impl RatingScorer {
    /// Aggregate and score with the default 75th-percentile threshold
    pub fn build(records: &[InteractionRecord]) -> Self {
        Self::with_percentile(records, DEFAULT_REVIEW_PERCENTILE)
    }

    /// Aggregate and score; `percentile` is a quantile in [0, 1]
    #[instrument(skip(records), fields(rows = records.len()))]
    pub fn with_percentile(records: &[InteractionRecord], percentile: f64) -> Self {
        struct Accumulator<'a> {
            first: &'a InteractionRecord,
            rating_sum: f64,
            review_sum: f64,
            rows: u32,
        }

        let mut groups: BTreeMap<ProdId, Accumulator<'_>> = BTreeMap::new();
        for record in records {
            let acc = groups.entry(record.prod_id).or_insert(Accumulator {
                first: record,
                rating_sum: 0.0,
                review_sum: 0.0,
                rows: 0,
            });
            acc.rating_sum += record.rating;
            acc.review_sum += record.review_count as f64;
            acc.rows += 1;
        }

        let mut products: Vec<RatedProduct> = groups
            .into_iter()
            .map(|(prod_id, acc)| {
                let rows = f64::from(acc.rows);
                RatedProduct {
                    prod_id,
                    name: acc.first.name.clone(),
                    category: acc.first.category.clone(),
                    brand: acc.first.brand.clone(),
                    rating: acc.rating_sum / rows,
                    review_count: acc.review_sum / rows,
                    score: 0.0,
                }
            })
            .collect();

        let global_mean = mean(products.iter().map(|p| p.rating));
        let review_counts: Vec<f64> = products.iter().map(|p| p.review_count).collect();
        let review_threshold = quantile(&review_counts, percentile);

        for product in &mut products {
            product.score = weighted_rating(
                product.review_count,
                product.rating,
                review_threshold,
                global_mean,
            );
        }

        let mut by_score: Vec<usize> = (0..products.len()).collect();
        by_score.sort_by(|&a, &b| {
            let (pa, pb) = (&products[a], &products[b]);
            rank_order(pa.score, pa.prod_id, pb.score, pb.prod_id)
        });

        let mut by_popularity: Vec<usize> = (0..products.len()).collect();
        by_popularity.sort_by(|&a, &b| {
            let (pa, pb) = (&products[a], &products[b]);
            rank_order(pa.review_count, pa.prod_id, pb.review_count, pb.prod_id)
        });

        info!(
            "Scored {} products: C={:.4}, m={:.2}",
            products.len(),
            global_mean,
            review_threshold
        );
        Self {
            products,
            global_mean,
            review_threshold,
            by_score,
            by_popularity,
        }
    }

    /// Highest weighted score first; at most `n` entries
    pub fn top_rated(&self, n: usize) -> Vec<&RatedProduct> {
        self.by_score.iter().take(n).map(|&i| &self.products[i]).collect()
    }

    /// Highest mean review count first; at most `n` entries
    pub fn popular(&self, n: usize) -> Vec<&RatedProduct> {
        self.by_popularity
            .iter()
            .take(n)
            .map(|&i| &self.products[i])
            .collect()
    }

    pub fn get(&self, prod_id: ProdId) -> Option<&RatedProduct> {
        self.products
            .binary_search_by_key(&prod_id, |p| p.prod_id)
            .ok()
            .map(|i| &self.products[i])
    }

    /// Global mean rating `C`
    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    /// Review-volume threshold `m`
    pub fn review_threshold(&self) -> f64 {
        self.review_threshold
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// `v/(v+m) * R + m/(v+m) * C`; falls back to `C` when `v + m == 0`
pub fn weighted_rating(v: f64, r: f64, m: f64, c: f64) -> f64 {
    let total = v + m;
    if total <= 0.0 {
        return c;
    }
    (v / total) * r + (m / total) * c
}

/// Quantile with linear interpolation between closest ranks.
///
/// Returns 0.0 for an empty slice; `q` is clamped to [0, 1].
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
