//! # Data Loader Crate
//!
//! This crate turns a raw product-interaction export into validated, typed data.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (InteractionRecord, ProductRecord, RawTable)
//! - **parser**: Read CSV exports into a `RawTable`
//! - **cleaner**: Normalize, coerce and filter raw rows into `InteractionRecord`s
//! - **catalog**: Deduplicated `ProductCatalog` with lookup and name search
//! - **error**: Error types for loading and cleaning
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{clean, parser, ProductCatalog};
//! use std::path::Path;
//!
//! let raw = parser::read_table(Path::new("data/clean_data.csv"))?;
//! let interactions = clean(&raw)?;
//! let catalog = ProductCatalog::from_interactions(&interactions);
//!
//! for product in catalog.search_by_name("blue", 3) {
//!     println!("{} - {}", product.prod_id, product.name);
//! }
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod cleaner;
pub mod catalog;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    ProdId,
    // Core types
    RawTable,
    InteractionRecord,
    ProductRecord,
};
pub use cleaner::{clean, clean_product, to_raw_table};
pub use catalog::ProductCatalog;
