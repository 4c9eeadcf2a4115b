//! Error types for the engine crate.
//!
//! Two families:
//! - `EngineError`: building or configuring a snapshot failed. Fatal for that
//!   build; a previously published snapshot keeps serving. A build that
//!   finishes after a newer rebuild was published is dropped as `Superseded`.
//! - `QueryError`: a query could not be answered against the current snapshot.
//!   Always recoverable, the caller decides whether to retry or report.
//!
//! Getting fewer results than requested is not an error.

use data_loader::{DataLoadError, ProdId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Dataset unreadable or missing a required column
    #[error("Data error: {0}")]
    Data(#[from] DataLoadError),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The background build task panicked or was cancelled
    #[error("Snapshot rebuild task failed: {0}")]
    RebuildTaskFailed(String),

    /// A rebuild started later was published first; this build was dropped
    #[error("Rebuild {ticket} superseded by rebuild {published}")]
    Superseded { ticket: u64, published: u64 },
}

/// Lookup failures; every variant means "not found"
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("No product name contains '{query}'")]
    NoNameMatch { query: String },

    #[error("Product {prod_id} is not in the catalog")]
    ProductNotFound { prod_id: ProdId },

    /// In the catalog but never rated, so it has no co-rating vector
    #[error("Product {prod_id} has no interactions and is not in the collaborative index")]
    NotInCollaborativeIndex { prod_id: ProdId },
}

impl QueryError {
    /// The product ID the query was about, if any
    pub fn prod_id(&self) -> Option<ProdId> {
        match self {
            Self::NoNameMatch { .. } => None,
            Self::ProductNotFound { prod_id } | Self::NotInCollaborativeIndex { prod_id } => {
                Some(*prod_id)
            }
        }
    }
}

/// Convenience type alias for build/config Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
