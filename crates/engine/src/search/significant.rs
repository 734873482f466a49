//! Significant term discovery
//!
//! Compares how often a phrase of one field occurs in a result set against
//! how often it occurs in the whole corpus. A phrase is reported when:
//!
//! - it occurs in at least `minimum` percent of the result documents,
//! - it is not a stop word and contains no punctuation,
//! - `(result rate / corpus rate) * 100 >= threshold`.
//!
//! Both parameters are percentages. Counting is per document: a phrase that
//! occurs twice in one document counts once. This is a frequency ranking,
//! not a statistical test.

use memdb_core::{flatten_document, remove_numeric_indices, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use super::hasher::{KeyHasher, MatchKind};
use super::index::DocumentIndex;
use super::tokenizer::{contains_punctuation, is_stopword, phrases};

/// Default ratio threshold, in percent
pub const DEFAULT_THRESHOLD: f64 = 200.0;

/// Default minimum occurrence rate, in percent
pub const DEFAULT_MINIMUM: f64 = 33.34;

/// Thresholds for [`SignificantTermsAnalyzer`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificantTermsOptions {
    /// Minimum `(result rate / corpus rate) * 100`
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Minimum share of result documents containing the phrase, in percent
    #[serde(default = "default_minimum")]
    pub minimum: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_minimum() -> f64 {
    DEFAULT_MINIMUM
}

impl Default for SignificantTermsOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            minimum: DEFAULT_MINIMUM,
        }
    }
}

/// A reported phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignificantTerm {
    /// Lower-cased phrase as written
    pub term: String,
    /// Result documents containing it
    pub doc_count: usize,
}

/// Finds phrases over-represented in a result set
#[derive(Debug, Clone, Copy)]
pub struct SignificantTermsAnalyzer<'a> {
    index: &'a DocumentIndex,
    options: SignificantTermsOptions,
}

impl<'a> SignificantTermsAnalyzer<'a> {
    /// Analyzer comparing against `index`
    pub fn new(index: &'a DocumentIndex, options: SignificantTermsOptions) -> Self {
        Self { index, options }
    }

    /// Significant phrases of `field` across the documents `ids`
    ///
    /// Ids no longer in the index are skipped but still count towards the
    /// size of the result set. Sorted by descending document count, then by
    /// term.
    pub fn analyze(&self, ids: &[String], field: &str) -> Result<Vec<SignificantTerm>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut plain_terms: HashMap<String, String> = HashMap::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for id in ids {
            let document = match self.index.get(id) {
                Ok(document) => document,
                Err(Error::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            for (hash, plain) in self.field_phrases(&document, field)? {
                *counts.entry(hash.clone()).or_default() += 1;
                plain_terms.insert(hash, plain);
            }
        }

        let result_size = ids.len() as f64;
        let corpus_size = self.index.document_count() as f64;
        let mut terms = Vec::new();

        for (hash, count) in counts {
            let Some(term) = plain_terms.remove(&hash) else {
                continue;
            };
            if is_stopword(&term) || contains_punctuation(&term) {
                continue;
            }

            let result_rate = count as f64 / result_size;
            if result_rate * 100.0 < self.options.minimum {
                continue;
            }

            let corpus_count = self.index.lookup_len(&hash);
            if corpus_count == 0 || corpus_size == 0.0 {
                continue;
            }
            let corpus_rate = corpus_count as f64 / corpus_size;

            if (result_rate / corpus_rate) * 100.0 >= self.options.threshold {
                terms.push(SignificantTerm {
                    term,
                    doc_count: count,
                });
            }
        }

        terms.sort_by(compare_terms);
        debug!(
            target: "memdb::search",
            field = %field,
            documents = ids.len(),
            significant = terms.len(),
            "Significant terms computed"
        );
        Ok(terms)
    }

    /// Partial-match hash -> plain phrase, for one field of one document
    fn field_phrases(&self, document: &Value, field: &str) -> Result<HashMap<String, String>> {
        let mut result = HashMap::new();
        let Some(object) = document.as_object() else {
            return Ok(result);
        };

        let limit = self.index.options().phrase_word_limit;
        for (path, value) in flatten_document(object) {
            if remove_numeric_indices(&path) != field {
                continue;
            }
            if let Value::String(text) = value {
                let phrases = phrases(&text, limit);
                for (plain, stemmed) in phrases.iter() {
                    let hash = KeyHasher::hash_str(field, stemmed, MatchKind::Partial)?;
                    result.insert(hash, plain.to_string());
                }
            }
        }
        Ok(result)
    }
}

fn compare_terms(a: &SignificantTerm, b: &SignificantTerm) -> Ordering {
    b.doc_count
        .cmp(&a.doc_count)
        .then_with(|| a.term.to_lowercase().cmp(&b.term.to_lowercase()))
}
