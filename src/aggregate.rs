//! Corpus-wide aggregation.
//!
//! [`count`] folds the values extracted from each document into a count
//! table; [`group`] indexes which documents produced each value. Both scan
//! the whole document stream and stop at the first error.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::io::{self, Write};

use crate::document::{Document, DocumentKey};
use crate::error::Result;
use crate::extract;
use crate::field::Scalar;

/// Produces the values a document contributes to an aggregation.
pub trait ValueExtractor {
    type Value: Eq + Hash + Clone;

    fn extract<'d>(&'d self, doc: &'d Document) -> Box<dyn Iterator<Item = Result<Self::Value>> + 'd>;
}

#[derive(Debug, Clone)]
pub struct FieldPath {
    path: String,
}

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl ValueExtractor for FieldPath {
    type Value = Scalar;

    fn extract<'d>(&'d self, doc: &'d Document) -> Box<dyn Iterator<Item = Result<Scalar>> + 'd> {
        Box::new(doc.resolve(&self.path))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BaseFeatures;

impl ValueExtractor for BaseFeatures {
    type Value = String;

    fn extract<'d>(&'d self, doc: &'d Document) -> Box<dyn Iterator<Item = Result<String>> + 'd> {
        Box::new(extract::base_features(doc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    #[default]
    Occurrences,
    PerPaper,
}

pub fn update_counts<K, I>(items: I, counts: &mut HashMap<K, usize>)
where
    K: Eq + Hash,
    I: IntoIterator<Item = K>,
{
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
}

pub fn update_counts_unique<K, I>(items: I, counts: &mut HashMap<K, usize>)
where
    K: Eq + Hash,
    I: IntoIterator<Item = K>,
{
    let distinct: HashSet<K> = items.into_iter().collect();
    update_counts(distinct, counts);
}

pub fn count<I, E>(documents: I, extractor: &E, mode: CountMode) -> Result<HashMap<E::Value, usize>>
where
    I: IntoIterator<Item = Result<Document>>,
    E: ValueExtractor,
{
    let mut counts = HashMap::new();
    for doc in documents {
        let doc = doc?;
        let values = extractor.extract(&doc).collect::<Result<Vec<_>>>()?;
        match mode {
            CountMode::Occurrences => update_counts(values, &mut counts),
            CountMode::PerPaper => update_counts_unique(values, &mut counts),
        }
    }
    Ok(counts)
}

/// Maps each extracted value to the documents that produced it.
pub fn group<I, E>(documents: I, extractor: &E) -> Result<HashMap<E::Value, BTreeSet<DocumentKey>>>
where
    I: IntoIterator<Item = Result<Document>>,
    E: ValueExtractor,
{
    let mut groups: HashMap<E::Value, BTreeSet<DocumentKey>> = HashMap::new();
    for doc in documents {
        let doc = doc?;
        for value in extractor.extract(&doc) {
            groups.entry(value?).or_default().insert(doc.key().clone());
        }
    }
    Ok(groups)
}

// Highest count (or largest set) first, ties by value text.
pub fn count_key<K: ToString>(entry: &(K, usize)) -> (std::cmp::Reverse<usize>, String) {
    (std::cmp::Reverse(entry.1), entry.0.to_string())
}

pub fn set_size_key<K: ToString, V>(entry: &(K, BTreeSet<V>)) -> (std::cmp::Reverse<usize>, String) {
    (std::cmp::Reverse(entry.1.len()), entry.0.to_string())
}

pub fn by_count_desc<K: ToString>(counts: HashMap<K, usize>) -> Vec<(K, usize)> {
    let mut rows: Vec<_> = counts.into_iter().collect();
    rows.sort_by_cached_key(count_key);
    rows
}

pub fn by_set_size_desc<K: ToString, V>(groups: HashMap<K, BTreeSet<V>>) -> Vec<(K, BTreeSet<V>)> {
    let mut rows: Vec<_> = groups.into_iter().collect();
    rows.sort_by_cached_key(set_size_key);
    rows
}

/// Writes one `value{sep}count` line per row. Values are written verbatim, so
/// a value containing `sep` is not escaped.
pub fn write_rows<W, K, V, I>(out: &mut W, rows: I, sep: &str) -> io::Result<()>
where
    W: Write,
    K: Display,
    V: Display,
    I: IntoIterator<Item = (K, V)>,
{
    for (value, count) in rows {
        writeln!(out, "{}{}{}", value, sep, count)?;
    }
    out.flush()
}
