//! FeatureVectorizer: weighted product documents and their TF-IDF vectors.
//!
//! ## Algorithm
//! 1. Build one composite document per product by repeating fields:
//!    Tags x3, Category x2, Brand x1, Description x1 (repetition is the weight)
//! 2. Tokenize: lowercase, split on non-word characters, keep tokens of 2+ chars
//! 3. Drop English stop words, then emit unigrams and bigrams
//! 4. Keep terms found in at least `min_df` documents, capped at `max_features`
//!    terms ranked by document frequency (corpus frequency, then term, break ties)
//! 5. Weight: raw count x smoothed idf, `idf = ln((1 + n) / (1 + df)) + 1`
//! 6. L2-normalize each vector, so cosine similarity is a plain dot product

use crate::similarity::{SparseEntry, sparse_dot, sparse_norm};
use crate::stopwords::StopWords;
use data_loader::ProductRecord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// How many times each field is repeated in the composite document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub tags: usize,
    pub category: usize,
    pub brand: usize,
    pub description: usize,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            tags: 3,
            category: 2,
            brand: 1,
            description: 1,
        }
    }
}

/// Vocabulary and weighting settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub max_features: usize,
    pub min_df: usize,
    pub ngram_range: (usize, usize),
    pub stop_words_english: bool,
    pub field_weights: FieldWeights,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            min_df: 2,
            ngram_range: (1, 2),
            stop_words_english: true,
            field_weights: FieldWeights::default(),
        }
    }
}

/// Sparse, L2-normalized TF-IDF vector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<SparseEntry>,
}

impl FeatureVector {
    pub fn entries(&self) -> &[SparseEntry] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        sparse_norm(&self.entries)
    }

    pub fn dot(&self, other: &FeatureVector) -> f64 {
        sparse_dot(&self.entries, &other.entries)
    }
}

/// Fitted TF-IDF model.
///
/// Use the builder methods to configure, then `fit_transform` once per
/// snapshot build.
#[derive(Debug, Clone)]
pub struct FeatureVectorizer {
    config: VectorizerConfig,
    stop_words: Option<StopWords>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl FeatureVectorizer {
    pub fn new(config: VectorizerConfig) -> Self {
        let stop_words = config.stop_words_english.then(StopWords::english);
        Self {
            config,
            stop_words,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Configure vocabulary cap (default: 5000)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.config.max_features = max_features;
        self
    }

    /// Configure minimum document frequency (default: 2)
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.config.min_df = min_df;
        self
    }

    /// Configure n-gram range (default: 1..=2)
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.config.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Composite document for a product, fields repeated by weight
    pub fn composite_document(&self, product: &ProductRecord) -> String {
        let weights = &self.config.field_weights;
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(std::iter::repeat_n(product.tags.as_str(), weights.tags));
        parts.extend(std::iter::repeat_n(product.category.as_str(), weights.category));
        parts.extend(std::iter::repeat_n(product.brand.as_str(), weights.brand));
        parts.extend(std::iter::repeat_n(product.description.as_str(), weights.description));
        parts.join(" ")
    }

    /// Tokenize and expand a document into its n-gram terms
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2)
            .filter(|t| self.stop_words.as_ref().is_none_or(|sw| !sw.contains(t)))
            .collect();

        let (min_n, max_n) = self.config.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n == 0 || n > tokens.len() {
                continue;
            }
            terms.extend(tokens.windows(n).map(|gram| gram.join(" ")));
        }
        terms
    }

    /// Fit vocabulary and idf over `documents` and return one vector per document
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub fn fit_transform<S: AsRef<str> + Sync>(&mut self, documents: &[S]) -> Vec<FeatureVector> {
        let analyzed: Vec<Vec<String>> = documents
            .par_iter()
            .map(|doc| self.analyze(doc.as_ref()))
            .collect();

        self.fit_analyzed(&analyzed);
        analyzed.iter().map(|terms| self.vectorize(terms)).collect()
    }

    /// Vector for a new document against the fitted vocabulary
    pub fn transform(&self, document: &str) -> FeatureVector {
        self.vectorize(&self.analyze(document))
    }

    fn fit_analyzed(&mut self, analyzed: &[Vec<String>]) {
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut term_freq: HashMap<&str, usize> = HashMap::new();

        for terms in analyzed {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in terms {
                *term_freq.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut kept: Vec<(&str, usize, usize)> = doc_freq
            .iter()
            .filter(|&(_, &df)| df >= self.config.min_df)
            .map(|(&term, &df)| (term, df, term_freq[term]))
            .collect();
        kept.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.0.cmp(b.0))
        });
        let candidates = kept.len();
        kept.truncate(self.config.max_features);

        // Stable, alphabetical dimension order
        kept.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = analyzed.len() as f64;
        self.idf = kept
            .iter()
            .map(|&(_, df, _)| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        self.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(idx, (term, _, _))| (term.to_string(), idx))
            .collect();

        debug!(
            "{} distinct terms, {} pass min_df={}",
            doc_freq.len(),
            candidates,
            self.config.min_df
        );
        if self.vocabulary.is_empty() {
            warn!("Vocabulary is empty after pruning; every product vector is zero");
        }
        info!("Fitted TF-IDF vocabulary of {} terms", self.vocabulary.len());
    }

    fn vectorize(&self, terms: &[String]) -> FeatureVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in terms {
            if let Some(&idx) = self.vocabulary.get(term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<SparseEntry> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        entries.sort_by_key(|&(idx, _)| idx);

        let norm = sparse_norm(&entries);
        if norm > 0.0 {
            for entry in &mut entries {
                entry.1 /= norm;
            }
        }
        FeatureVector { entries }
    }
}

impl Default for FeatureVectorizer {
    fn default() -> Self {
        Self::new(VectorizerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(tags: &str, category: &str, brand: &str, description: &str) -> ProductRecord {
        ProductRecord {
            prod_id: 1,
            name: String::new(),
            brand: brand.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            tags: tags.to_string(),
            review_count: 0,
        }
    }

    #[test]
    fn test_composite_document_repeats_fields() {
        let vectorizer = FeatureVectorizer::default();
        let doc = vectorizer.composite_document(&product("t", "c", "b", "d"));
        assert_eq!(doc, "t t t c c b d");
    }

    #[test]
    fn test_analyze_drops_stop_words_and_short_tokens() {
        let vectorizer = FeatureVectorizer::default();
        let terms = vectorizer.analyze("The Blue-widget is a x great_tool");
        assert_eq!(
            terms,
            vec![
                "blue",
                "widget",
                "great_tool",
                "blue widget",
                "widget great_tool"
            ]
        );
    }

    #[test]
    fn test_min_df_excludes_rare_terms() {
        let mut vectorizer = FeatureVectorizer::default().with_ngram_range(1, 1);
        let docs = ["shampoo hair", "shampoo soap", "lipstick"];
        let vectors = vectorizer.fit_transform(&docs);

        assert_eq!(vectorizer.vocabulary_size(), 1);
        assert!(vectorizer.term_index("shampoo").is_some());
        assert!(vectorizer.term_index("lipstick").is_none());
        assert!(vectors[2].is_zero());
        assert!((vectors[0].norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_features_prefers_frequent_documents() {
        let mut vectorizer = FeatureVectorizer::default()
            .with_ngram_range(1, 1)
            .with_min_df(1)
            .with_max_features(1);
        vectorizer.fit_transform(&["soap rare", "soap", "soap"]);
        assert_eq!(vectorizer.vocabulary_size(), 1);
        assert!(vectorizer.term_index("soap").is_some());
    }

    #[test]
    fn test_identical_documents_have_unit_similarity() {
        let mut vectorizer = FeatureVectorizer::default();
        let vectors = vectorizer.fit_transform(&["red lipstick matte", "red lipstick matte"]);
        assert!((vectors[0].dot(&vectors[1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_idf_is_smoothed() {
        let mut vectorizer = FeatureVectorizer::default()
            .with_ngram_range(1, 1)
            .with_min_df(1);
        // "common" in both docs, "unique" in one
        let vectors = vectorizer.fit_transform(&["common unique", "common"]);
        let common = vectorizer.term_index("common").unwrap();
        let unique = vectorizer.term_index("unique").unwrap();

        let weights: HashMap<usize, f64> = vectors[0].entries().iter().copied().collect();
        let idf_common = (3.0f64 / 3.0).ln() + 1.0;
        let idf_unique = (3.0f64 / 2.0).ln() + 1.0;
        let norm = (idf_common * idf_common + idf_unique * idf_unique).sqrt();
        assert!((weights[&common] - idf_common / norm).abs() < 1e-12);
        assert!((weights[&unique] - idf_unique / norm).abs() < 1e-12);
    }
}
