//! Core domain types for the product interaction dataset.
//!
//! This module defines the fundamental data structures used throughout the system:
//! - Type aliases for domain clarity (UserId, ProdId)
//! - `RawTable`, the untyped cells exactly as read from the input
//! - `InteractionRecord`, one cleaned and validated row
//! - `ProductRecord`, the descriptive projection kept by the catalog

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with product IDs

/// Unique identifier for a user (always positive after cleaning)
pub type UserId = u64;

/// Unique identifier for a product (always positive after cleaning)
pub type ProdId = u64;

// =============================================================================
// Column Names
// =============================================================================

/// Canonical column names of the input dataset.
pub mod columns {
    pub const USER_ID: &str = "UserID";
    pub const PROD_ID: &str = "ProdID";
    pub const RATING: &str = "Rating";
    pub const NAME: &str = "Name";
    pub const BRAND: &str = "Brand";
    pub const CATEGORY: &str = "Category";
    pub const DESCRIPTION: &str = "Description";
    pub const TAGS: &str = "Tags";
    pub const REVIEW_COUNT: &str = "Review Count";

    /// Legacy spelling of the user-id column found in older exports
    pub const LEGACY_USER_ID: &str = "User's ID";

    /// Positional index column written by dataframe exports
    pub const UNNAMED_INDEX: &str = "Unnamed: 0";

    /// Columns a dataset must carry; anything else is optional.
    pub const REQUIRED: [&str; 3] = [USER_ID, PROD_ID, RATING];

    /// Column order used when a cleaned table is rendered back to raw cells.
    pub const CANONICAL: [&str; 9] = [
        USER_ID,
        PROD_ID,
        RATING,
        NAME,
        BRAND,
        CATEGORY,
        DESCRIPTION,
        TAGS,
        REVIEW_COUNT,
    ];
}

// =============================================================================
// Raw Input
// =============================================================================

/// Untyped tabular input: a header row plus string cells.
///
/// Every row has exactly `headers.len()` cells; the CSV reader pads short rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Position of a column by exact (case-sensitive) name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Cleaned Rows
// =============================================================================

/// One cleaned interaction row.
///
/// IDs and rating are guaranteed positive; text fields are never missing
/// (empty string instead) and never contain the `|` delimiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub prod_id: ProdId,
    pub rating: f64,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub tags: String,
    pub review_count: u64,
}

/// Descriptive metadata for one product, as held by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub prod_id: ProdId,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub tags: String,
    pub review_count: u64,
}

impl From<&InteractionRecord> for ProductRecord {
    fn from(record: &InteractionRecord) -> Self {
        Self {
            prod_id: record.prod_id,
            name: record.name.clone(),
            brand: record.brand.clone(),
            category: record.category.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            review_count: record.review_count,
        }
    }
}
