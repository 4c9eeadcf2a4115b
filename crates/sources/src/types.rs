//! Shared result types for all recommendation sources.

use data_loader::ProdId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A product paired with the score a source assigned to it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub prod_id: ProdId,
    pub score: f64,
}

impl ScoredProduct {
    pub fn new(prod_id: ProdId, score: f64) -> Self {
        Self { prod_id, score }
    }
}

/// Ranking order used by every source: score descending, then ProdID ascending.
///
/// `total_cmp` keeps the order total even if a NaN sneaks in.
pub fn rank_order(a_score: f64, a_id: ProdId, b_score: f64, b_id: ProdId) -> Ordering {
    b_score.total_cmp(&a_score).then_with(|| a_id.cmp(&b_id))
}

/// Sort in ranking order and keep the first `limit` entries
pub fn rank_and_truncate(items: &mut Vec<ScoredProduct>, limit: usize) {
    items.sort_by(|a, b| rank_order(a.score, a.prod_id, b.score, b.prod_id));
    items.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_break_by_ascending_id() {
        let mut items = vec![
            ScoredProduct::new(9, 0.5),
            ScoredProduct::new(3, 0.9),
            ScoredProduct::new(2, 0.5),
            ScoredProduct::new(7, 0.1),
        ];
        rank_and_truncate(&mut items, 3);
        let ids: Vec<ProdId> = items.iter().map(|s| s.prod_id).collect();
        assert_eq!(ids, vec![3, 2, 9]);
    }

    #[test]
    fn test_truncate_larger_than_len() {
        let mut items = vec![ScoredProduct::new(1, 1.0)];
        rank_and_truncate(&mut items, 10);
        assert_eq!(items.len(), 1);
    }
}
