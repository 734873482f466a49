//! Search criteria
//!
//! Criteria arrive as JSON:
//!
//! ```text
//! {"and"|"or": [
//!     {"equals"|"not_equals"|"contains"|"not_contains": {field: value}},
//!     {"and"|"or": [ ... ]},
//!     ...
//! ]}
//! ```
//!
//! Parsing turns this into a [`Criteria`] tree once, so evaluation never
//! inspects raw JSON. Group and match-type names are case-insensitive;
//! unknown keys are ignored.

use memdb_core::{Error, Result};
use serde_json::{Map, Value};

/// How the children of a group combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Ids present in every child
    And,
    /// Ids present in any child, first-seen order
    Or,
}

impl GroupKind {
    fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "and" => Some(GroupKind::And),
            "or" => Some(GroupKind::Or),
            _ => None,
        }
    }
}

/// Leaf comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Whole value equals (case-insensitive for text)
    Equals,
    /// Complement of `Equals`
    NotEquals,
    /// Text contains the stemmed word or phrase
    Contains,
    /// Complement of `Contains`
    NotContains,
}

impl MatchType {
    fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "equals" => Some(MatchType::Equals),
            "not_equals" => Some(MatchType::NotEquals),
            "contains" => Some(MatchType::Contains),
            "not_contains" => Some(MatchType::NotContains),
            _ => None,
        }
    }

    /// Whether this is a partial (phrase) match
    pub fn is_partial(&self) -> bool {
        matches!(self, MatchType::Contains | MatchType::NotContains)
    }

    /// Whether the result is a complement
    pub fn is_negated(&self) -> bool {
        matches!(self, MatchType::NotEquals | MatchType::NotContains)
    }

    /// Name as written in criteria
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Equals => "equals",
            MatchType::NotEquals => "not_equals",
            MatchType::Contains => "contains",
            MatchType::NotContains => "not_contains",
        }
    }
}

/// One node of a criteria tree
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Compare one field
    Match {
        /// Comparison
        match_type: MatchType,
        /// Dot-notation field, without array positions
        field: String,
        /// Value to compare against
        value: Value,
    },
    /// Nested group
    Group(Group),
    /// Several comparisons written in one object; all must hold.
    /// Empty when the object held nothing recognisable, which matches nothing.
    All(Vec<Criterion>),
}

/// A list of criteria combined by `kind`
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Combination rule
    pub kind: GroupKind,
    /// Children, in the order written
    pub criteria: Vec<Criterion>,
}

/// Parsed search criteria
///
/// No groups means match every document. Several top-level groups are
/// evaluated independently and their results intersected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    /// Top-level groups, in the order written
    pub groups: Vec<Group>,
}

impl Criteria {
    /// Criteria matching every document
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Single `and` group
    pub fn and(criteria: Vec<Criterion>) -> Self {
        Self {
            groups: vec![Group {
                kind: GroupKind::And,
                criteria,
            }],
        }
    }

    /// Single `or` group
    pub fn or(criteria: Vec<Criterion>) -> Self {
        Self {
            groups: vec![Group {
                kind: GroupKind::Or,
                criteria,
            }],
        }
    }

    /// Whether these criteria match every document
    pub fn is_match_all(&self) -> bool {
        self.groups.is_empty()
    }

    /// Parse a request body; an empty body matches everything
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::match_all());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::invalid_criteria(format!("criteria are not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Build criteria from an already-parsed JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_criteria("criteria must be a JSON object"))?;

        let mut groups = Vec::new();
        for (key, children) in object {
            if let Some(kind) = GroupKind::from_key(key) {
                groups.push(parse_group(kind, key, children)?);
            }
        }
        Ok(Self { groups })
    }
}

impl Criterion {
    /// `equals` on `field`
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(MatchType::Equals, field, value)
    }

    /// `not_equals` on `field`
    pub fn not_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(MatchType::NotEquals, field, value)
    }

    /// `contains` on `field`
    pub fn contains(field: impl Into<String>, text: &str) -> Self {
        Self::leaf(MatchType::Contains, field, text)
    }

    /// `not_contains` on `field`
    pub fn not_contains(field: impl Into<String>, text: &str) -> Self {
        Self::leaf(MatchType::NotContains, field, text)
    }

    fn leaf(match_type: MatchType, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criterion::Match {
            match_type,
            field: field.into(),
            value: value.into(),
        }
    }
}

fn parse_group(kind: GroupKind, key: &str, children: &Value) -> Result<Group> {
    let items = children
        .as_array()
        .ok_or_else(|| Error::invalid_criteria(format!("'{}' must hold an array", key)))?;

    let criteria = items
        .iter()
        .map(parse_criterion)
        .collect::<Result<Vec<_>>>()?;
    Ok(Group { kind, criteria })
}

fn parse_criterion(item: &Value) -> Result<Criterion> {
    let object = item
        .as_object()
        .ok_or_else(|| Error::invalid_criteria("each criterion must be a JSON object"))?;

    let mut parts = Vec::new();
    for (key, value) in object {
        if let Some(kind) = GroupKind::from_key(key) {
            parts.push(Criterion::Group(parse_group(kind, key, value)?));
        } else if let Some(match_type) = MatchType::from_key(key) {
            parse_matches(match_type, value, &mut parts)?;
        }
    }

    if parts.len() == 1 {
        Ok(parts.remove(0))
    } else {
        Ok(Criterion::All(parts))
    }
}

fn parse_matches(match_type: MatchType, value: &Value, parts: &mut Vec<Criterion>) -> Result<()> {
    let fields: &Map<String, Value> = value.as_object().ok_or_else(|| {
        Error::invalid_criteria(format!("'{}' must hold a {{field: value}} object", match_type.as_str()))
    })?;

    for (field, expected) in fields {
        if match_type.is_partial() && !expected.is_string() {
            return Err(Error::invalid_criteria(format!(
                "'{}' on '{}' needs a text value",
                match_type.as_str(),
                field
            )));
        }
        parts.push(Criterion::Match {
            match_type,
            field: field.clone(),
            value: expected.clone(),
        });
    }
    Ok(())
}
