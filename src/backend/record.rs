use serde::{Deserialize, Serialize};

use super::headers::{CanonicalField, HeaderMap};

/// One complaint entry. Text fields may be empty, `count` never fails.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub age: String,
    pub gender: String,
    pub category: String,
    pub count: u64,
}

/// Outcome of coercing a count cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountCell {
    Parsed(u64),
    /// Cell had content that did not survive coercion; treated as 0.
    Coerced,
    /// Cell was empty; treated as 0.
    Blank,
}

impl CountCell {
    pub fn value(self) -> u64 {
        match self {
            CountCell::Parsed(n) => n,
            CountCell::Coerced | CountCell::Blank => 0,
        }
    }
}

/// Keeps digits, '-' and '.', then parses what is left as a number.
/// Non-numeric, non-finite, negative and out-of-range (2^64 or more) results
/// become 0; fractions are truncated.
pub fn coerce_count(raw: &str) -> CountCell {
    if raw.trim().is_empty() {
        return CountCell::Blank;
    }
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect();

    match kept.parse::<f64>() {
        // u64::MAX as f64 rounds up to 2^64, so the bound is exclusive.
        Ok(n) if n.is_finite() && n >= 0.0 && n < u64::MAX as f64 => CountCell::Parsed(n.trunc() as u64),
        _ => CountCell::Coerced,
    }
}

pub struct RowNormalizer<'a> {
    header_map: &'a HeaderMap,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(header_map: &'a HeaderMap) -> Self {
        Self { header_map }
    }

    /// Builds a record from the cells of one data line. Cells missing at
    /// the end of a short row read as empty text.
    pub fn normalize(&self, cells: &[String]) -> (Record, CountCell) {
        let count = coerce_count(self.cell(cells, CanonicalField::Count));
        let record = Record {
            age: self.cell(cells, CanonicalField::Age).to_string(),
            gender: self.cell(cells, CanonicalField::Gender).to_string(),
            category: self.cell(cells, CanonicalField::Category).to_string(),
            count: count.value(),
        };
        (record, count)
    }

    fn cell<'c>(&self, cells: &'c [String], field: CanonicalField) -> &'c str {
        cells
            .get(self.header_map.column(field).index)
            .map(String::as_str)
            .unwrap_or("")
    }
}
