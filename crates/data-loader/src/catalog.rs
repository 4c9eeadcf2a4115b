//! ProductCatalog: deduplicated product metadata with O(1) lookup.
//!
//! Built from cleaned interactions. The first row seen for a ProdID supplies
//! its metadata; later rows for the same product are ignored. Products keep
//! first-seen order, which is the "natural table order" name search reports in.

use crate::types::{InteractionRecord, ProdId, ProductRecord};
use std::collections::HashMap;
use tracing::info;

/// Indexed, immutable product table.
///
/// Lookups go through `index` (ProdID -> position); positions are an
/// implementation detail and never leak through the public API.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<ProductRecord>,
    index: HashMap<ProdId, usize>,
}

impl ProductCatalog {
    /// Build the catalog from cleaned rows, first occurrence wins
    pub fn from_interactions(records: &[InteractionRecord]) -> Self {
        let mut catalog = Self::default();
        for record in records {
            catalog.insert_if_absent(ProductRecord::from(record));
        }

        info!(
            "Built product catalog: {} products from {} rows",
            catalog.len(),
            records.len()
        );
        catalog
    }

    /// Build from product records directly (first occurrence wins)
    pub fn from_products(products: impl IntoIterator<Item = ProductRecord>) -> Self {
        let mut catalog = Self::default();
        for product in products {
            catalog.insert_if_absent(product);
        }
        catalog
    }

    fn insert_if_absent(&mut self, product: ProductRecord) {
        if self.index.contains_key(&product.prod_id) {
            return;
        }
        self.index.insert(product.prod_id, self.products.len());
        self.products.push(product);
    }

    /// Get a product by ID
    pub fn get(&self, prod_id: ProdId) -> Option<&ProductRecord> {
        self.index.get(&prod_id).map(|&i| &self.products[i])
    }

    pub fn contains(&self, prod_id: ProdId) -> bool {
        self.index.contains_key(&prod_id)
    }

    /// All products in first-seen order
    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn ids(&self) -> impl Iterator<Item = ProdId> + '_ {
        self.products.iter().map(|p| p.prod_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Case-insensitive substring search over product names.
    ///
    /// Returns at most `limit` matches in catalog order. An empty result
    /// means "no match"; choosing among several matches is left to the caller.
    pub fn search_by_name(&self, query: &str, limit: usize) -> Vec<&ProductRecord> {
        let needle = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: u64, prod_id: ProdId, name: &str, review_count: u64) -> InteractionRecord {
        InteractionRecord {
            user_id,
            prod_id,
            rating: 4.0,
            name: name.to_string(),
            brand: "Acme".to_string(),
            category: "Tools".to_string(),
            description: String::new(),
            tags: String::new(),
            review_count,
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let rows = vec![
            record(1, 5, "Original Name", 10),
            record(2, 5, "Later Name", 99),
            record(3, 6, "Other", 1),
        ];
        let catalog = ProductCatalog::from_interactions(&rows);

        assert_eq!(catalog.len(), 2);
        let product = catalog.get(5).unwrap();
        assert_eq!(product.name, "Original Name");
        assert_eq!(product.review_count, 10);
        assert!(catalog.get(7).is_none());
    }

    #[test]
    fn test_search_is_case_insensitive_and_capped() {
        let rows = vec![
            record(1, 1, "Blue Widget", 0),
            record(1, 2, "Blue Gadget", 0),
            record(1, 3, "Red Widget", 0),
            record(1, 4, "BLUE lamp", 0),
            record(1, 5, "bluebird feeder", 0),
        ];
        let catalog = ProductCatalog::from_interactions(&rows);

        let ids: Vec<ProdId> = catalog
            .search_by_name("blue", 3)
            .iter()
            .map(|p| p.prod_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 4]);

        assert_eq!(catalog.search_by_name("widget", 10).len(), 2);
        assert!(catalog.search_by_name("Zephyr", 3).is_empty());
    }

    #[test]
    fn test_every_id_resolves_to_its_own_record() {
        let products = [3, 1, 3, 2, 1, 9].map(|prod_id| ProductRecord {
            prod_id,
            name: format!("Product {}", prod_id),
            brand: String::new(),
            category: String::new(),
            description: String::new(),
            tags: String::new(),
            review_count: 0,
        });
        let catalog = ProductCatalog::from_products(products);

        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec![3, 1, 2, 9]);
        for id in catalog.ids() {
            assert!(catalog.contains(id));
            assert_eq!(catalog.get(id).unwrap().prod_id, id);
        }
    }
}
