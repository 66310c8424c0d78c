use serde::{Deserialize, Serialize};

use super::headers::normalize_label;
use super::record::Record;

/// Label shown for the "no constraint" choice.
pub const ALL_LABEL: &str = "전체";

/// One filter dimension: either unconstrained or a specific label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    /// Parses UI or CLI text. "전체" and "all" (any case) mean no constraint.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed == ALL_LABEL || trimmed.eq_ignore_ascii_case("all") {
            Choice::All
        } else {
            Choice::Only(trimmed.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Choice::All => ALL_LABEL,
            Choice::Only(value) => value,
        }
    }
}

/// The pair of age/gender constraints, read fresh for every render.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub age: Choice,
    pub gender: Choice,
}

impl FilterSelection {
    pub fn new(age: Choice, gender: Choice) -> Self {
        Self { age, gender }
    }

    pub fn from_labels(age: &str, gender: &str) -> Self {
        Self::new(Choice::parse(age), Choice::parse(gender))
    }

    /// Age matches when the normalized selection is contained in the
    /// normalized record value, so "20" matches "20대".
    fn age_matches(&self, record: &Record) -> bool {
        match &self.age {
            Choice::All => true,
            Choice::Only(age) => normalize_label(&record.age).contains(&normalize_label(age)),
        }
    }

    fn gender_matches(&self, record: &Record) -> bool {
        match &self.gender {
            Choice::All => true,
            Choice::Only(gender) => normalize_label(&record.gender) == normalize_label(gender),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.age_matches(record) && self.gender_matches(record)
    }
}

pub struct FilterEngine;

impl FilterEngine {
    pub fn apply<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
        records.iter().filter(|r| selection.matches(r)).collect()
    }
}

/// Distinct non-empty values in first-seen order, for populating selectors.
/// Values that normalize equally are listed once.
pub fn distinct_labels<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut labels = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(normalize_label(trimmed)) {
            labels.push(trimmed.to_string());
        }
    }
    labels
}
