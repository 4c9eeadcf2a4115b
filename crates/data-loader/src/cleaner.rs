//! Normalization and validation of raw interaction rows.
//!
//! `clean` is a pure function: it reads a `RawTable` and returns a fresh
//! `Vec<InteractionRecord>`, leaving the input untouched.
//!
//! ## Rules
//! 1. Resolve columns by name; the legacy `User's ID` header counts as `UserID`
//! 2. Blank cells and the markers `NULL` / `null` are missing values
//! 3. UserID and ProdID must coerce to positive integers, Rating to a positive number
//! 4. Rows failing any of the three checks are dropped (a rating of 0 means "not rated")
//! 5. Text fields lose the `|` delimiter; missing text becomes an empty string
//! 6. `Review Count` is optional and defaults to 0
//!
//! Output order follows input order with dropped rows removed; nothing
//! downstream relies on positions.

use crate::error::{DataLoadError, Result};
use crate::types::{InteractionRecord, ProductRecord, RawTable, columns};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

/// Cell values that mean "no value" besides blank cells
const NULL_MARKERS: [&str; 2] = ["NULL", "null"];

/// Reserved delimiter removed from every text field
const RESERVED_DELIMITER: char = '|';

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    user_id: usize,
    prod_id: usize,
    rating: usize,
    name: Option<usize>,
    brand: Option<usize>,
    category: Option<usize>,
    description: Option<usize>,
    tags: Option<usize>,
    review_count: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self> {
        let normalized: Vec<&str> = headers.iter().map(|h| normalize_header(h)).collect();

        // The canonical spelling wins if an export carries both
        let find = |name: &str| normalized.iter().position(|h| *h == name);
        let user_id = find(columns::USER_ID).or_else(|| find(columns::LEGACY_USER_ID));

        let required = |position: Option<usize>, name: &str| {
            position.ok_or_else(|| DataLoadError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Self {
            user_id: required(user_id, columns::USER_ID)?,
            prod_id: required(find(columns::PROD_ID), columns::PROD_ID)?,
            rating: required(find(columns::RATING), columns::RATING)?,
            name: find(columns::NAME),
            brand: find(columns::BRAND),
            category: find(columns::CATEGORY),
            description: find(columns::DESCRIPTION),
            tags: find(columns::TAGS),
            review_count: find(columns::REVIEW_COUNT),
        })
    }
}

fn normalize_header(header: &str) -> &str {
    header.trim()
}

/// Clean a raw table into validated interaction records.
///
/// # Errors
/// `DataLoadError::MissingColumn` if UserID, ProdID or Rating is not in the
/// header. Individual bad rows are never an error; they are dropped.
#[instrument(skip(raw), fields(rows = raw.len()))]
pub fn clean(raw: &RawTable) -> Result<Vec<InteractionRecord>> {
    let map = ColumnMap::resolve(&raw.headers)?;
    debug!("Resolved columns: {:?}", map);

    // Indexed parallel iterators keep input order on collect
    let records: Vec<InteractionRecord> = raw
        .rows
        .par_iter()
        .filter_map(|row| clean_row(row, &map))
        .collect();

    info!(
        "Cleaned {} rows -> {} valid interactions ({} dropped)",
        raw.len(),
        records.len(),
        raw.len() - records.len()
    );
    Ok(records)
}

/// Render cleaned records back into canonical raw cells.
///
/// `clean(&to_raw_table(&records))` reproduces `records`.
pub fn to_raw_table(records: &[InteractionRecord]) -> RawTable {
    let mut table = RawTable::new(columns::CANONICAL.iter().map(|c| c.to_string()).collect());
    for record in records {
        table.push_row(vec![
            record.user_id.to_string(),
            record.prod_id.to_string(),
            record.rating.to_string(),
            record.name.clone(),
            record.brand.clone(),
            record.category.clone(),
            record.description.clone(),
            record.tags.clone(),
            record.review_count.to_string(),
        ]);
    }
    table
}

/// Apply the row rules to a catalog-only product.
///
/// A ProdID of 0 drops the product; text fields lose the reserved
/// delimiter and null markers, as they would in `clean`.
pub fn clean_product(product: ProductRecord) -> Option<ProductRecord> {
    if product.prod_id == 0 {
        return None;
    }
    Some(ProductRecord {
        prod_id: product.prod_id,
        name: clean_text(&product.name),
        brand: clean_text(&product.brand),
        category: clean_text(&product.category),
        description: clean_text(&product.description),
        tags: clean_text(&product.tags),
        review_count: product.review_count,
    })
}

fn clean_row(row: &[String], map: &ColumnMap) -> Option<InteractionRecord> {
    let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
    let text = |idx: Option<usize>| idx.map(|i| clean_text(cell(i))).unwrap_or_default();

    let user_id = coerce_id(cell(map.user_id))?;
    let prod_id = coerce_id(cell(map.prod_id))?;
    let rating = coerce_rating(cell(map.rating))?;

    Some(InteractionRecord {
        user_id,
        prod_id,
        rating,
        name: text(map.name),
        brand: text(map.brand),
        category: text(map.category),
        description: text(map.description),
        tags: text(map.tags),
        review_count: map
            .review_count
            .map(|i| coerce_count(cell(i)))
            .unwrap_or(0),
    })
}

fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || NULL_MARKERS.contains(&trimmed)
}

/// Parse a numeric cell; missing or non-numeric values become `None`
fn coerce_number(value: &str) -> Option<f64> {
    if is_missing(value) {
        return None;
    }
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// IDs must be positive whole numbers ("12" and "12.0" are both 12)
fn coerce_id(value: &str) -> Option<u64> {
    coerce_number(value)
        .filter(|v| *v > 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
        .map(|v| v as u64)
}

fn coerce_rating(value: &str) -> Option<f64> {
    coerce_number(value).filter(|v| *v > 0.0)
}

fn coerce_count(value: &str) -> u64 {
    coerce_number(value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.trunc() as u64)
        .unwrap_or(0)
}

fn clean_text(value: &str) -> String {
    let stripped: String = value.chars().filter(|c| *c != RESERVED_DELIMITER).collect();
    if is_missing(&stripped) {
        String::new()
    } else {
        stripped
    }
}
