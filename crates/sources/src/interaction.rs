//! InteractionMatrix: cleaned interactions pivoted to users x products.
//!
//! Stored sparsely, one column per product. A missing cell reads as 0.0,
//! which is unambiguous because the cleaner drops ratings <= 0.
//! Duplicate (user, product) pairs collapse to their mean rating.

use crate::similarity::SparseEntry;
use data_loader::{InteractionRecord, ProdId, UserId};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct InteractionMatrix {
    /// Row labels, ascending
    user_ids: Vec<UserId>,
    /// Column labels, ascending
    prod_ids: Vec<ProdId>,
    user_index: HashMap<UserId, usize>,
    prod_index: HashMap<ProdId, usize>,
    /// Per product: (user row, rating), sorted by user row
    columns: Vec<Vec<SparseEntry>>,
}

impl InteractionMatrix {
    pub fn build(records: &[InteractionRecord]) -> Self {
        // (sum, count) per cell; BTreeMap keeps product-major, user-minor order
        let mut cells: BTreeMap<(ProdId, UserId), (f64, u32)> = BTreeMap::new();
        for record in records {
            let cell = cells.entry((record.prod_id, record.user_id)).or_insert((0.0, 0));
            cell.0 += record.rating;
            cell.1 += 1;
        }

        let mut user_ids: Vec<UserId> = records.iter().map(|r| r.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let user_index: HashMap<UserId, usize> =
            user_ids.iter().enumerate().map(|(i, &u)| (u, i)).collect();

        let mut prod_ids: Vec<ProdId> = Vec::new();
        let mut columns: Vec<Vec<SparseEntry>> = Vec::new();
        for ((prod_id, user_id), (sum, count)) in cells {
            if prod_ids.last() != Some(&prod_id) {
                prod_ids.push(prod_id);
                columns.push(Vec::new());
            }
            if let Some(column) = columns.last_mut() {
                column.push((user_index[&user_id], sum / f64::from(count)));
            }
        }
        let prod_index = prod_ids.iter().enumerate().map(|(i, &p)| (p, i)).collect();

        let matrix = Self {
            user_ids,
            prod_ids,
            user_index,
            prod_index,
            columns,
        };
        info!(
            "Built interaction matrix: {} users x {} products, {} rated cells",
            matrix.n_users(),
            matrix.n_products(),
            matrix.n_ratings()
        );
        matrix
    }

    /// Rating for a cell; 0.0 means "not rated" (or unknown user/product)
    pub fn rating(&self, user_id: UserId, prod_id: ProdId) -> f64 {
        let (Some(&row), Some(column)) = (self.user_index.get(&user_id), self.column(prod_id))
        else {
            return 0.0;
        };
        column
            .binary_search_by_key(&row, |&(r, _)| r)
            .map(|pos| column[pos].1)
            .unwrap_or(0.0)
    }

    /// Non-zero entries of a product's rating vector across users
    pub fn column(&self, prod_id: ProdId) -> Option<&[SparseEntry]> {
        self.prod_index
            .get(&prod_id)
            .map(|&i| self.columns[i].as_slice())
    }

    pub fn contains_product(&self, prod_id: ProdId) -> bool {
        self.prod_index.contains_key(&prod_id)
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn prod_ids(&self) -> &[ProdId] {
        &self.prod_ids
    }

    pub(crate) fn columns(&self) -> &[Vec<SparseEntry>] {
        &self.columns
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_products(&self) -> usize {
        self.prod_ids.len()
    }

    pub fn n_ratings(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }
}
