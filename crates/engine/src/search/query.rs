//! Criteria evaluation against a [`DocumentIndex`]
//!
//! Leaves are single lookups: the leaf's `(field, value, kind)` is hashed
//! exactly as indexing hashes document leaves. Negated leaves are the only
//! place a complement is materialised (`all ids \ lookup`).

use memdb_core::Result;
use serde_json::Value;
use std::collections::HashSet;

use super::criteria::{Criteria, Criterion, Group, GroupKind, MatchType};
use super::hasher::{KeyHasher, MatchKind};
use super::index::DocumentIndex;
use super::tokenizer::stemmed_phrase;

/// One page of matching ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    /// Number of matches before pagination
    pub total: usize,
    /// Ids in `[from, from + size)` of the sorted matches
    pub ids: Vec<String>,
    /// Every match, sorted, when requested
    pub all: Option<Vec<String>>,
}

/// Evaluates [`Criteria`] trees
#[derive(Debug, Clone, Copy)]
pub struct QueryEvaluator<'a> {
    index: &'a DocumentIndex,
}

impl<'a> QueryEvaluator<'a> {
    /// Evaluator reading `index`
    pub fn new(index: &'a DocumentIndex) -> Self {
        Self { index }
    }

    /// Ids matching `criteria`, unordered but without duplicates
    pub fn evaluate(&self, criteria: &Criteria) -> Result<Vec<String>> {
        if criteria.is_match_all() {
            return Ok(self.index.all_ids());
        }

        let results = criteria
            .groups
            .iter()
            .map(|group| self.evaluate_group(group))
            .collect::<Result<Vec<_>>>()?;
        Ok(intersect(results))
    }

    /// Matching ids sorted, then sliced to `[from, from + size)`
    pub fn search(
        &self,
        criteria: &Criteria,
        from: usize,
        size: usize,
        also_return_all: bool,
    ) -> Result<SearchPage> {
        let mut ids = self.evaluate(criteria)?;
        ids.sort();

        let total = ids.len();
        let page = ids.iter().skip(from).take(size).cloned().collect();
        Ok(SearchPage {
            total,
            ids: page,
            all: also_return_all.then_some(ids),
        })
    }

    fn evaluate_group(&self, group: &Group) -> Result<Vec<String>> {
        let results = group
            .criteria
            .iter()
            .map(|criterion| self.evaluate_criterion(criterion))
            .collect::<Result<Vec<_>>>()?;

        Ok(match group.kind {
            GroupKind::Or => union(results),
            GroupKind::And => intersect(results),
        })
    }

    fn evaluate_criterion(&self, criterion: &Criterion) -> Result<Vec<String>> {
        match criterion {
            Criterion::Match {
                match_type,
                field,
                value,
            } => self.evaluate_match(*match_type, field, value),
            Criterion::Group(group) => self.evaluate_group(group),
            Criterion::All(parts) => {
                let results = parts
                    .iter()
                    .map(|part| self.evaluate_criterion(part))
                    .collect::<Result<Vec<_>>>()?;
                Ok(intersect(results))
            }
        }
    }

    fn evaluate_match(&self, match_type: MatchType, field: &str, value: &Value) -> Result<Vec<String>> {
        let key = match (match_type.is_partial(), value) {
            (true, Value::String(text)) => {
                KeyHasher::hash_str(field, &stemmed_phrase(text), MatchKind::Partial)?
            }
            _ => KeyHasher::hash(field, value, MatchKind::Full)?,
        };

        if match_type.is_negated() {
            Ok(self.index.ids_without(&key))
        } else {
            Ok(self.index.lookup(&key))
        }
    }
}

/// Deduplicated concatenation, keeping first-seen order
pub fn union(lists: Vec<Vec<String>>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for id in lists.into_iter().flatten() {
        if seen.insert(id.clone()) {
            result.push(id);
        }
    }
    result
}

/// Ids present in every list, in the order of the first; empty input gives no ids
pub fn intersect(lists: Vec<Vec<String>>) -> Vec<String> {
    let mut lists = lists.into_iter();
    let Some(first) = lists.next() else {
        return Vec::new();
    };
    let others: Vec<HashSet<String>> = lists.map(|list| list.into_iter().collect()).collect();

    let mut seen = HashSet::new();
    first
        .into_iter()
        .filter(|id| others.iter().all(|other| other.contains(id)))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
