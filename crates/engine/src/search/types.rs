//! Search request options and results

use serde::Serialize;
use serde_json::Value;

use super::significant::SignificantTerm;

// ============================================================================
// SearchOptions
// ============================================================================

/// Significant terms to compute alongside a search
#[derive(Debug, Clone, PartialEq)]
pub struct SignificantTermsRequest {
    /// Dot-notation field to analyse
    pub field: String,
    /// Override of the configured ratio threshold, in percent
    pub threshold: Option<f64>,
    /// Override of the configured minimum occurrence, in percent
    pub minimum: Option<f64>,
}

impl SignificantTermsRequest {
    /// Analyse `field` with the configured thresholds
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            threshold: None,
            minimum: None,
        }
    }
}

/// Pagination and extras for a search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOptions {
    /// Offset into the sorted matches
    pub from: usize,
    /// Page size; the configured default when `None`
    pub size: Option<usize>,
    /// Significant terms to compute over all matches
    pub significant_terms: Option<SignificantTermsRequest>,
}

impl SearchOptions {
    /// Builder: set offset
    pub fn with_from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    /// Builder: set page size
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Builder: request significant terms for `field`
    pub fn with_significant_terms(mut self, request: SignificantTermsRequest) -> Self {
        self.significant_terms = Some(request);
        self
    }
}

// ============================================================================
// SearchResults
// ============================================================================

/// A matching document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Document id
    pub id: String,
    /// Parsed document
    pub document: Value,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Matches before pagination
    pub total_matches: usize,
    /// The requested page, sorted by id
    pub hits: Vec<SearchHit>,
    /// Present when significant terms were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significant_terms: Option<Vec<SignificantTerm>>,
    /// Time taken, in milliseconds
    pub took: u64,
}

impl SearchResults {
    /// Number of hits on this page
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether this page is empty
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Ids on this page
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.id.as_str()).collect()
    }
}
