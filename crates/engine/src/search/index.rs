//! In-memory inverted index over JSON documents
//!
//! This module provides:
//! - The document table: id -> raw bytes + the lookup keys the document produced
//! - The lookup table: lookup key -> ids of the documents holding it
//! - The set of all live ids, used for match-all and negated queries
//!
//! # Invariant
//!
//! An id appears in a lookup entry if and only if that lookup key is listed
//! in the id's document entry. Empty lookup entries are deleted.
//!
//! # Locking
//!
//! Each structure sits behind its own `RwLock`. A mutation takes all three
//! write locks in the fixed order documents → lookups → all ids and holds
//! them until the change is complete, so readers never observe a half-applied
//! insert or remove. Readers take only the locks they need, in the same order.

use memdb_core::{
    flatten_document, parse_document, remove_numeric_indices, AppState, ApplicationState,
    DocumentLimits, Error, Result,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::hasher::{KeyHasher, MatchKind};
use super::tokenizer::{phrases, DEFAULT_PHRASE_WORD_LIMIT};

// ============================================================================
// Options and stats
// ============================================================================

/// Tunables for indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Size and nesting limits applied to every document
    pub limits: DocumentLimits,
    /// Longest phrase (in tokens) indexed for partial matches
    pub phrase_word_limit: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            limits: DocumentLimits::default(),
            phrase_word_limit: DEFAULT_PHRASE_WORD_LIMIT,
        }
    }
}

/// Counters reported by [`DocumentIndex::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Live documents
    pub document_count: usize,
    /// Distinct lookup keys
    pub inverted_index_count: usize,
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    raw: Vec<u8>,
    inverted_keys: Vec<String>,
}

// ============================================================================
// DocumentIndex
// ============================================================================

/// The in-memory document store and its inverted lookups
pub struct DocumentIndex {
    documents: RwLock<HashMap<String, IndexedDocument>>,
    lookups: RwLock<HashMap<String, Vec<String>>>,
    all_ids: RwLock<BTreeSet<String>>,
    state: Arc<ApplicationState>,
    options: IndexOptions,
}

impl DocumentIndex {
    /// Create an empty index
    pub fn new(state: Arc<ApplicationState>, options: IndexOptions) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            lookups: RwLock::new(HashMap::new()),
            all_ids: RwLock::new(BTreeSet::new()),
            state,
            options,
        }
    }

    /// Indexing options in effect
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Shared application state
    pub fn state(&self) -> &Arc<ApplicationState> {
        &self.state
    }

    /// Index `raw` under `id`, replacing any previous version
    ///
    /// The document must be a JSON object within the configured limits;
    /// otherwise `InvalidDocument` is returned and the index is untouched.
    pub fn index(&self, id: &str, raw: &[u8]) -> Result<()> {
        let document = parse_document(raw, &self.options.limits)?;
        let inverted_keys = self.lookup_keys_for(&document)?;

        let mut documents = self.documents.write();
        let mut lookups = self.lookups.write();
        let mut all_ids = self.all_ids.write();

        let replaced = Self::remove_locked(id, &mut documents, &mut lookups, &mut all_ids);

        for key in &inverted_keys {
            lookups.entry(key.clone()).or_default().push(id.to_string());
        }
        let key_count = inverted_keys.len();
        documents.insert(
            id.to_string(),
            IndexedDocument {
                raw: raw.to_vec(),
                inverted_keys,
            },
        );
        all_ids.insert(id.to_string());

        debug!(target: "memdb::index", id = %id, keys = key_count, replaced, "Document indexed");
        Ok(())
    }

    /// Lookup keys a document produces, deduplicated, in discovery order
    fn lookup_keys_for(&self, document: &serde_json::Map<String, Value>) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        for (path, value) in flatten_document(document) {
            let field = remove_numeric_indices(&path);

            let full = KeyHasher::hash(&field, &value, MatchKind::Full)?;
            if seen.insert(full.clone()) {
                keys.push(full);
            }

            if let Value::String(text) = &value {
                for stemmed in phrases(text, self.options.phrase_word_limit).stemmed {
                    let partial = KeyHasher::hash_str(&field, &stemmed, MatchKind::Partial)?;
                    if seen.insert(partial.clone()) {
                        keys.push(partial);
                    }
                }
            }
        }

        Ok(keys)
    }

    /// Remove `id`; returns whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let mut documents = self.documents.write();
        let mut lookups = self.lookups.write();
        let mut all_ids = self.all_ids.write();

        let removed = Self::remove_locked(id, &mut documents, &mut lookups, &mut all_ids);
        if removed {
            debug!(target: "memdb::index", id = %id, "Document removed");
        }
        removed
    }

    fn remove_locked(
        id: &str,
        documents: &mut HashMap<String, IndexedDocument>,
        lookups: &mut HashMap<String, Vec<String>>,
        all_ids: &mut BTreeSet<String>,
    ) -> bool {
        let Some(old) = documents.remove(id) else {
            return false;
        };

        for key in &old.inverted_keys {
            if let Some(ids) = lookups.get_mut(key) {
                ids.retain(|existing| existing != id);
                if ids.is_empty() {
                    lookups.remove(key);
                }
            }
        }
        all_ids.remove(id);
        true
    }

    /// Drop every document
    ///
    /// The application is `truncating` while the tables are cleared, then
    /// returns to the state it was in. A node still starting up or
    /// recovering stays so; only an `active` node becomes `active` again.
    pub fn remove_all(&self) {
        let previous = match self.state.get() {
            AppState::Truncating => AppState::Active,
            state => state,
        };
        self.state.set(AppState::Truncating);

        let removed = {
            let mut documents = self.documents.write();
            let mut lookups = self.lookups.write();
            let mut all_ids = self.all_ids.write();

            let removed = documents.len();
            documents.clear();
            lookups.clear();
            all_ids.clear();
            removed
        };

        info!(target: "memdb::index", removed, "All documents removed");
        self.state.set(previous);
    }

    /// The parsed document stored under `id`
    pub fn get(&self, id: &str) -> Result<Value> {
        let documents = self.documents.read();
        let entry = documents
            .get(id)
            .ok_or_else(|| Error::not_found(id))?;
        serde_json::from_slice(&entry.raw)
            .map_err(|e| Error::Serialization(format!("document {} is corrupted: {}", id, e)))
    }

    /// The raw bytes stored under `id`
    pub fn get_raw(&self, id: &str) -> Option<Vec<u8>> {
        self.documents.read().get(id).map(|d| d.raw.clone())
    }

    /// Whether `id` is indexed
    pub fn contains(&self, id: &str) -> bool {
        self.documents.read().contains_key(id)
    }

    /// Number of live documents
    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }

    /// Document and lookup counts
    pub fn stats(&self) -> IndexStats {
        let documents = self.documents.read();
        let lookups = self.lookups.read();
        IndexStats {
            document_count: documents.len(),
            inverted_index_count: lookups.len(),
        }
    }

    /// Every live id, sorted
    pub fn all_ids(&self) -> Vec<String> {
        self.all_ids.read().iter().cloned().collect()
    }

    /// Ids stored against a lookup key, in insertion order
    pub fn lookup(&self, key: &str) -> Vec<String> {
        self.lookups.read().get(key).cloned().unwrap_or_default()
    }

    /// Number of documents holding a lookup key
    pub fn lookup_len(&self, key: &str) -> usize {
        self.lookups.read().get(key).map_or(0, Vec::len)
    }

    /// Every live id that does not hold `key`, sorted
    ///
    /// Both tables are read under one pair of read locks, so the result is a
    /// consistent complement.
    pub fn ids_without(&self, key: &str) -> Vec<String> {
        let lookups = self.lookups.read();
        let all_ids = self.all_ids.read();
        match lookups.get(key) {
            Some(matching) => {
                let matching: HashSet<&str> = matching.iter().map(String::as_str).collect();
                all_ids
                    .iter()
                    .filter(|id| !matching.contains(id.as_str()))
                    .cloned()
                    .collect()
            }
            None => all_ids.iter().cloned().collect(),
        }
    }

    /// Lookup keys recorded for `id`
    pub fn inverted_keys(&self, id: &str) -> Option<Vec<String>> {
        self.documents.read().get(id).map(|d| d.inverted_keys.clone())
    }

    /// Check the bidirectional document/lookup invariant
    ///
    /// Walks every structure; intended for tests and diagnostics.
    pub fn is_consistent(&self) -> bool {
        let documents = self.documents.read();
        let lookups = self.lookups.read();
        let all_ids = self.all_ids.read();

        if documents.len() != all_ids.len() || !documents.keys().all(|id| all_ids.contains(id)) {
            return false;
        }

        let forward = documents.iter().all(|(id, doc)| {
            doc.inverted_keys
                .iter()
                .all(|key| lookups.get(key).map_or(false, |ids| ids.contains(id)))
        });

        let backward = lookups.iter().all(|(key, ids)| {
            !ids.is_empty()
                && ids.iter().all(|id| {
                    documents
                        .get(id)
                        .map_or(false, |doc| doc.inverted_keys.contains(key))
                })
        });

        forward && backward
    }
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("DocumentIndex")
            .field("document_count", &stats.document_count)
            .field("inverted_index_count", &stats.inverted_index_count)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> DocumentIndex {
        DocumentIndex::new(Arc::new(ApplicationState::new()), IndexOptions::default())
    }

    fn full(field: &str, value: Value) -> String {
        KeyHasher::hash(field, &value, MatchKind::Full).unwrap()
    }

    fn partial(field: &str, value: &str) -> String {
        KeyHasher::hash_str(field, value, MatchKind::Partial).unwrap()
    }

    #[test]
    fn test_remove_all_restores_previous_state() {
        let state = Arc::new(ApplicationState::new());
        let activations = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&activations);
        state.on_become_active(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
        let idx = DocumentIndex::new(Arc::clone(&state), IndexOptions::default());
        idx.index("1", br#"{"a":1}"#).unwrap();

        state.set(AppState::Recovering);
        idx.remove_all();
        assert_eq!(state.get(), AppState::Recovering);
        assert_eq!(activations.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(idx.document_count(), 0);

        state.set(AppState::Active);
        idx.index("2", br#"{"a":2}"#).unwrap();
        idx.remove_all();
        assert_eq!(state.get(), AppState::Active);
        assert_eq!(idx.document_count(), 0);
    }

    #[test]
    fn test_index_and_get() {
        let idx = index();
        idx.index("1", br#"{"a":{"b":"red car"}}"#).unwrap();

        assert_eq!(idx.get("1").unwrap(), json!({"a": {"b": "red car"}}));
        assert_eq!(idx.document_count(), 1);
        assert_eq!(idx.all_ids(), vec!["1"]);
        assert!(idx.is_consistent());
    }

    #[test]
    fn test_index_emits_full_and_partial_keys() {
        let idx = index();
        idx.index("1", br#"{"a":{"b":"Red cars"}}"#).unwrap();

        assert_eq!(idx.lookup(&full("a.b", json!("red cars"))), vec!["1"]);
        assert_eq!(idx.lookup(&partial("a.b", "car")), vec!["1"]);
        assert_eq!(idx.lookup(&partial("a.b", "red car")), vec!["1"]);
        assert!(idx.lookup(&partial("a.b", "cars")).is_empty());
    }

    #[test]
    fn test_array_elements_share_field() {
        let idx = index();
        idx.index("1", br#"{"tags":["alpha","beta"]}"#).unwrap();

        assert_eq!(idx.lookup(&full("tags", json!("alpha"))), vec!["1"]);
        assert_eq!(idx.lookup(&full("tags", json!("beta"))), vec!["1"]);
    }

    #[test]
    fn test_repeated_values_do_not_duplicate_ids() {
        let idx = index();
        idx.index("1", br#"{"tags":["same","same"]}"#).unwrap();
        assert_eq!(idx.lookup(&full("tags", json!("same"))), vec!["1"]);
        assert!(idx.is_consistent());
    }

    #[test]
    fn test_non_string_leaves() {
        let idx = index();
        idx.index("1", br#"{"n":30,"ok":true,"none":null}"#).unwrap();
        assert_eq!(idx.lookup(&full("n", json!(30.0))), vec!["1"]);
        assert_eq!(idx.lookup(&full("ok", json!(true))), vec!["1"]);
        assert_eq!(idx.lookup(&full("none", Value::Null)), vec!["1"]);
    }

    #[test]
    fn test_invalid_documents_rejected() {
        let idx = index();
        idx.index("1", br#"{"v":1}"#).unwrap();

        assert!(matches!(idx.index("1", b"not json"), Err(Error::InvalidDocument(_))));
        assert!(matches!(idx.index("1", b"[1,2]"), Err(Error::InvalidDocument(_))));
        assert_eq!(idx.get("1").unwrap(), json!({"v": 1}));
    }

    #[test]
    fn test_reindex_replaces_old_version() {
        let idx = index();
        idx.index("1", br#"{"colour":"red"}"#).unwrap();
        idx.index("1", br#"{"colour":"blue"}"#).unwrap();

        assert!(idx.lookup(&full("colour", json!("red"))).is_empty());
        assert_eq!(idx.lookup(&full("colour", json!("blue"))), vec!["1"]);
        assert_eq!(idx.document_count(), 1);
        assert!(idx.is_consistent());
    }

    #[test]
    fn test_remove_cleans_lookups() {
        let idx = index();
        idx.index("1", br#"{"a":"shared","b":"only one"}"#).unwrap();
        idx.index("2", br#"{"a":"shared"}"#).unwrap();

        assert!(idx.remove("1"));
        assert_eq!(idx.lookup(&full("a", json!("shared"))), vec!["2"]);
        assert!(idx.lookup(&full("b", json!("only one"))).is_empty());
        assert!(idx.inverted_keys("1").is_none());
        assert_eq!(idx.all_ids(), vec!["2"]);
        assert!(idx.is_consistent());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let idx = index();
        idx.index("1", br#"{"a":1}"#).unwrap();
        assert!(idx.remove("1"));
        let after_first = idx.stats();
        assert!(!idx.remove("1"));
        assert!(!idx.remove("never-existed"));
        assert_eq!(idx.stats(), after_first);
    }

    #[test]
    fn test_remove_all() {
        let state = Arc::new(ApplicationState::new());
        let idx = DocumentIndex::new(Arc::clone(&state), IndexOptions::default());
        idx.index("1", br#"{"a":1}"#).unwrap();
        idx.index("2", br#"{"a":2}"#).unwrap();
        state.set(AppState::Active);

        idx.remove_all();

        assert_eq!(
            idx.stats(),
            IndexStats {
                document_count: 0,
                inverted_index_count: 0
            }
        );
        assert!(idx.all_ids().is_empty());
        assert_eq!(state.get(), AppState::Active);
    }

    #[test]
    fn test_get_missing() {
        let idx = index();
        assert!(matches!(idx.get("missing"), Err(Error::NotFound(_))));
        assert!(idx.get_raw("missing").is_none());
    }

    #[test]
    fn test_ids_without() {
        let idx = index();
        idx.index("1", br#"{"c":"red"}"#).unwrap();
        idx.index("2", br#"{"c":"blue"}"#).unwrap();
        idx.index("3", br#"{"c":"red"}"#).unwrap();

        assert_eq!(idx.ids_without(&full("c", json!("red"))), vec!["2"]);
        assert_eq!(idx.ids_without(&full("c", json!("green"))), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_stats() {
        let idx = index();
        idx.index("1", br#"{"a":"x"}"#).unwrap();
        let stats = idx.stats();
        assert_eq!(stats.document_count, 1);
        // one full key and one partial key
        assert_eq!(stats.inverted_index_count, 2);
    }

    #[test]
    fn test_limits_enforced() {
        let options = IndexOptions {
            limits: DocumentLimits {
                max_document_size: 16,
                max_nesting_depth: 2,
            },
            ..IndexOptions::default()
        };
        let idx = DocumentIndex::new(Arc::new(ApplicationState::new()), options);

        assert!(idx.index("big", br#"{"a":"0123456789abcdef"}"#).is_err());
        assert!(idx.index("deep", br#"{"a":{"b":{}}}"#).is_err());
        assert!(idx.index("ok", br#"{"a":{"b":1}}"#).is_ok());
    }

    #[test]
    fn test_concurrent_writers_keep_invariant() {
        let idx = Arc::new(index());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let idx = Arc::clone(&idx);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("{}", i % 10);
                        let body = format!(r#"{{"writer":{},"n":{},"text":"word {}"}}"#, t, i, i);
                        idx.index(&id, body.as_bytes()).unwrap();
                        if i % 7 == 0 {
                            idx.remove(&id);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(idx.is_consistent());
    }
}
