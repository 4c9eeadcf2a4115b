//! # Engine Crate
//!
//! Ties the cleaned data and the three recommendation sources into
//! queryable snapshots.
//!
//! ## Components
//! - **EngineConfig**: tunables with serde defaults, loadable from JSON
//! - **Snapshot**: one immutable build of catalog, indexes and scores
//! - **SnapshotStore**: the published snapshot, swapped atomically on rebuild
//! - **RecommendationService**: query front door returning presentation rows
//!
//! ## Example
//! ```no_run
//! use engine::{EngineConfig, RecommendationService, Snapshot};
//!
//! let raw = data_loader::parser::read_table("data/ratings.csv".as_ref())?;
//! let config = EngineConfig::default();
//! let service = RecommendationService::from_snapshot(Snapshot::build(&raw, &config)?, config);
//!
//! for candidate in service.search("widget")? {
//!     println!("{} {}", candidate.prod_id, candidate.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod snapshot;

pub use config::EngineConfig;
pub use error::{EngineError, QueryError, Result};
pub use service::{ProductSummary, RatedSummary, RecommendationService};
pub use snapshot::{Snapshot, SnapshotStats, SnapshotStore};
