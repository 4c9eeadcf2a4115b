//! # Sources Crate
//!
//! The three independent recommendation strategies, each built once per
//! snapshot from cleaned data and read-only afterwards.
//!
//! ## Components
//!
//! ### Content Source
//! Text similarity between products:
//! - Weighted composite document per product (tags, category, brand, description)
//! - TF-IDF vectors over unigrams and bigrams
//! - Full pairwise cosine matrix
//!
//! ### Collaborative Source
//! "Products rated like this one":
//! - Users x products rating matrix (mean of duplicate ratings, 0 = unrated)
//! - Full pairwise cosine matrix between product columns
//!
//! ### Rating Source
//! Bayesian-shrinkage score per product and a raw popularity ordering.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{ContentSimilarityIndex, CollaborativeSimilarityIndex, InteractionMatrix, RatingScorer};
//!
//! let content = ContentSimilarityIndex::build(&catalog, &VectorizerConfig::default());
//! let matrix = InteractionMatrix::build(&interactions);
//! let collaborative = CollaborativeSimilarityIndex::build(&matrix);
//! let ratings = RatingScorer::build(&interactions);
//!
//! let similar = content.similar(42, 10);
//! let best = ratings.top_rated(10);
//! ```
//!
//! ## Performance Notes
//!
//! Similarity matrices cost O(N^2) time and memory in the number of products.
//! Rows of the upper triangle are computed in parallel with Rayon.

// Public modules
pub mod types;
pub mod similarity;
pub mod stopwords;
pub mod vectorizer;
pub mod content;
pub mod interaction;
pub mod collaborative;
pub mod rating;

// Re-export commonly used types
pub use types::ScoredProduct;
pub use similarity::SimilarityMatrix;
pub use vectorizer::{FeatureVector, FeatureVectorizer, FieldWeights, VectorizerConfig};
pub use content::ContentSimilarityIndex;
pub use interaction::InteractionMatrix;
pub use collaborative::CollaborativeSimilarityIndex;
pub use rating::{RatedProduct, RatingScorer};
