//! Search module: indexing and retrieval of JSON documents
//!
//! This module contains:
//! - `stemmer`: Porter stemmer
//! - `tokenizer`: punctuation padding and phrase extraction
//! - `hasher`: lookup keys for `(field, value, match kind)` triples
//! - `index`: the in-memory document table and inverted lookups
//! - `criteria`: parsed search criteria
//! - `query`: criteria evaluation and pagination
//! - `significant`: significant term discovery
//! - `types`: search results returned to callers

pub mod criteria;
pub mod hasher;
pub mod index;
pub mod query;
pub mod significant;
pub mod stemmer;
pub mod tokenizer;
mod types;

pub use criteria::{Criteria, Criterion, Group, GroupKind, MatchType};
pub use hasher::{KeyHasher, MatchKind};
pub use index::{DocumentIndex, IndexOptions, IndexStats};
pub use query::{QueryEvaluator, SearchPage};
pub use significant::{
    SignificantTerm, SignificantTermsAnalyzer, SignificantTermsOptions, DEFAULT_MINIMUM,
    DEFAULT_THRESHOLD,
};
pub use tokenizer::{phrases, Phrases};
pub use types::{SearchHit, SearchOptions, SearchResults, SignificantTermsRequest};
