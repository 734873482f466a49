//! Lookup key hashing
//!
//! A lookup key is the SHA-512 of the canonical JSON
//! `{"key": <field>, "type": "full"|"partial", "value": <value>}`.
//! Text values are lower-cased and integral floats are written as integers
//! first, so `"Red"`/`"red"` and `30`/`30.0` share a key.

use memdb_core::{sha512_hex, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use std::fmt;

/// How a lookup entry matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The whole leaf value
    Full,
    /// A stemmed phrase inside a text leaf
    Partial,
}

impl MatchKind {
    /// Name used in the canonical form
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Full => "full",
            MatchKind::Partial => "partial",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless hasher for `(field, value, kind)` triples
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyHasher;

impl KeyHasher {
    /// Hash a triple to a 128-character lower-case hex string
    pub fn hash(key: &str, value: &Value, kind: MatchKind) -> Result<String> {
        let canonical = json!({
            "key": key,
            "type": kind.as_str(),
            "value": normalise(value),
        });
        let bytes = serde_json::to_vec(&canonical)?;
        Ok(sha512_hex(&bytes))
    }

    /// Hash a text value
    pub fn hash_str(key: &str, value: &str, kind: MatchKind) -> Result<String> {
        Self::hash(key, &Value::String(value.to_string()), kind)
    }
}

fn normalise(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        Value::Number(n) => Value::Number(integral(n).unwrap_or_else(|| n.clone())),
        other => other.clone(),
    }
}

fn integral(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return None;
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_shape() {
        let h = KeyHasher::hash_str("a.b", "red car", MatchKind::Full).unwrap();
        assert_eq!(h.len(), 128);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = KeyHasher::hash(&"k".to_string(), &json!(5), MatchKind::Full).unwrap();
        let b = KeyHasher::hash("k", &json!(5), MatchKind::Full).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_text_is_case_insensitive() {
        let a = KeyHasher::hash_str("name", "Red Car", MatchKind::Full).unwrap();
        let b = KeyHasher::hash_str("name", "red car", MatchKind::Full).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_integral_floats_match_integers() {
        let a = KeyHasher::hash("age", &json!(30), MatchKind::Full).unwrap();
        let b = KeyHasher::hash("age", &json!(30.0), MatchKind::Full).unwrap();
        let c = KeyHasher::hash("age", &json!(30.5), MatchKind::Full).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_every_component_matters() {
        let base = KeyHasher::hash_str("a", "x", MatchKind::Full).unwrap();
        assert_ne!(base, KeyHasher::hash_str("b", "x", MatchKind::Full).unwrap());
        assert_ne!(base, KeyHasher::hash_str("a", "y", MatchKind::Full).unwrap());
        assert_ne!(base, KeyHasher::hash_str("a", "x", MatchKind::Partial).unwrap());
    }

    #[test]
    fn test_types_are_distinct() {
        let text = KeyHasher::hash("a", &json!("1"), MatchKind::Full).unwrap();
        let number = KeyHasher::hash("a", &json!(1), MatchKind::Full).unwrap();
        let boolean = KeyHasher::hash("a", &json!(true), MatchKind::Full).unwrap();
        let null = KeyHasher::hash("a", &Value::Null, MatchKind::Full).unwrap();
        assert_ne!(text, number);
        assert_ne!(boolean, null);
    }
}
