//! Field extraction from packed key-value annotation columns.
//!
//! VEP writes most predictor output into a single `Extra` column such as
//! `SYMBOL=BRCA1;SIFT=tolerated(0.24);CANONICAL=YES`. The pair order is not
//! stable between runs or rows, so values are always looked up by key.

use crate::table::{Row, NA};
use indexmap::IndexMap;

/// Trait for types that can extract a value by field name
///
/// A missing field is `None`; callers decide whether that becomes the
/// [`NA`] sentinel or an error.
pub trait Extractor {
    /// Extract the value stored under `key`
    fn extract(&self, key: &str) -> Option<String>;

    /// Extract a value, falling back to the [`NA`] sentinel
    fn extract_or_na(&self, key: &str) -> String {
        self.extract(key).unwrap_or_else(|| NA.to_string())
    }
}

/// Key-value pairs unpacked from one `Extra` cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFields {
    pairs: IndexMap<String, String>,
}

impl ExtraFields {
    /// Parse a packed `key=value;key=value` cell.
    ///
    /// Tokens are split on the first `=`; tokens without `=` are discarded.
    /// A repeated key keeps its last value.
    pub fn parse(packed: &str) -> Self {
        let pairs = packed
            .split(';')
            .filter_map(|token| token.split_once('='))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Self { pairs }
    }

    /// Parse an optional cell; an absent or missing cell gives no pairs.
    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            Some(packed) if !crate::table::is_missing(packed) => Self::parse(packed),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Extractor for ExtraFields {
    fn extract(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

impl Extractor for Row {
    fn extract(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}
