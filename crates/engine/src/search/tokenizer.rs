//! Text tokenizer for partial matching
//!
//! Pipeline: pad punctuation with spaces → split on whitespace → lowercase
//!           → Porter stem → emit every run of 1..=limit tokens as a phrase
//!
//! Punctuation becomes a token of its own unless it sits inside a word, so
//! `don't` and `example.com` survive intact while `car.` yields `car` and `.`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::stemmer;

/// Default maximum number of tokens in an indexed phrase
pub const DEFAULT_PHRASE_WORD_LIMIT: usize = 3;

/// Standard English stopwords (Lucene's default set).
///
/// High-frequency words carry no signal for significant-term discovery and
/// are skipped there.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

static PUNCTUATION_PADDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w\S+\w)|(\w+)|(\s*\.{3}\s*)|(\s*[^\w\s]\s*)|\s+")
        .expect("padding pattern is valid")
});

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\s]").expect("punctuation pattern is valid")
});

/// Check if a token is a stopword.
#[inline]
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Whether `text` contains any character that is neither a word character nor whitespace
pub fn contains_punctuation(text: &str) -> bool {
    PUNCTUATION.is_match(text)
}

/// Surround every word and punctuation run with spaces
pub fn pad_punctuation(text: &str) -> String {
    PUNCTUATION_PADDING.replace_all(text, " $0 ").into_owned()
}

/// Lower-cased tokens of `text`, punctuation split out
pub fn words(text: &str) -> Vec<String> {
    pad_punctuation(text)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Plain and stemmed phrases of `text`, index-aligned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Phrases {
    /// Lower-cased phrases as written
    pub plain: Vec<String>,
    /// The same phrases with every token stemmed
    pub stemmed: Vec<String>,
}

impl Phrases {
    /// Number of phrases
    pub fn len(&self) -> usize {
        self.plain.len()
    }

    /// Whether no phrase was produced
    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    /// `(plain, stemmed)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.plain
            .iter()
            .map(String::as_str)
            .zip(self.stemmed.iter().map(String::as_str))
    }
}

/// Split `text` into every contiguous run of `1..=limit` tokens
///
/// Phrases are ordered by length first, then by position.
///
/// # Example
///
/// ```
/// use memdb_engine::search::tokenizer::phrases;
///
/// let p = phrases("Red cars", 3);
/// assert_eq!(p.plain, vec!["red", "cars", "red cars"]);
/// assert_eq!(p.stemmed, vec!["red", "car", "red car"]);
/// ```
pub fn phrases(text: &str, limit: usize) -> Phrases {
    let plain_words = words(text);
    let stemmed_words: Vec<String> = plain_words.iter().map(|w| stemmer::stem(w)).collect();

    let mut result = Phrases::default();
    for length in 1..=limit.min(plain_words.len()) {
        for start in 0..=(plain_words.len() - length) {
            let end = start + length;
            result.plain.push(plain_words[start..end].join(" "));
            result.stemmed.push(stemmed_words[start..end].join(" "));
        }
    }
    result
}

/// The stemmed form a `contains` query value is looked up under
///
/// # Example
///
/// ```
/// use memdb_engine::search::tokenizer::stemmed_phrase;
///
/// assert_eq!(stemmed_phrase("Running Quickly"), "run quickli");
/// ```
pub fn stemmed_phrase(text: &str) -> String {
    words(text)
        .iter()
        .map(|w| stemmer::stem(w))
        .collect::<Vec<_>>()
        .join(" ")
}
