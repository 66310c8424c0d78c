use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::record::Record;

/// Label for records whose category is blank.
pub const UNCLASSIFIED_LABEL: &str = "(unclassified)";

/// Display order of aggregated categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum CategoryOrder {
    /// Largest sum first; equal sums keep first-seen order.
    #[default]
    Descending,
    /// Order in which categories first appear.
    FirstSeen,
}

impl CategoryOrder {
    pub fn all() -> &'static [CategoryOrder] {
        &[CategoryOrder::Descending, CategoryOrder::FirstSeen]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CategoryOrder::Descending => "By count",
            CategoryOrder::FirstSeen => "First seen",
        }
    }
}

/// Relative weight of a category against the largest one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emphasis {
    High,
    Medium,
    Low,
}

impl Emphasis {
    /// Above 80% of the max is High, above 50% Medium, else Low.
    /// There is no emphasis when the max is 0.
    pub fn classify(count: u64, max: u64) -> Option<Emphasis> {
        if max == 0 {
            return None;
        }
        let percentage = count as f64 / max as f64 * 100.0;
        Some(if percentage > 80.0 {
            Emphasis::High
        } else if percentage > 50.0 {
            Emphasis::Medium
        } else {
            Emphasis::Low
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub count: u64,
}

/// Per-category sums of a filtered record set plus the grand total.
/// An empty `groups` list means no records matched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub groups: Vec<CategoryTotal>,
    pub total: u64,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn max_count(&self) -> u64 {
        self.groups.iter().map(|g| g.count).max().unwrap_or(0)
    }

    pub fn labels(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.category.clone()).collect()
    }

    pub fn values(&self) -> Vec<u64> {
        self.groups.iter().map(|g| g.count).collect()
    }

    pub fn emphasis(&self, group: &CategoryTotal) -> Option<Emphasis> {
        Emphasis::classify(group.count, self.max_count())
    }
}

pub struct Aggregator;

impl Aggregator {
    pub fn aggregate<'a>(
        records: impl IntoIterator<Item = &'a Record>,
        order: CategoryOrder,
    ) -> AggregationResult {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<CategoryTotal> = Vec::new();
        let mut total = 0u64;

        for record in records {
            let label = if record.category.trim().is_empty() {
                UNCLASSIFIED_LABEL
            } else {
                record.category.as_str()
            };
            let slot = *index.entry(label).or_insert_with(|| {
                groups.push(CategoryTotal {
                    category: label.to_string(),
                    count: 0,
                });
                groups.len() - 1
            });
            groups[slot].count = groups[slot].count.saturating_add(record.count);
            total = total.saturating_add(record.count);
        }

        if order == CategoryOrder::Descending {
            // Stable, so ties stay in first-seen order.
            groups.sort_by(|a, b| b.count.cmp(&a.count));
        }

        AggregationResult { groups, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::filter::{FilterEngine, FilterSelection};

    fn record(age: &str, gender: &str, category: &str, count: u64) -> Record {
        Record {
            age: age.into(),
            gender: gender.into(),
            category: category.into(),
            count,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("20대", "남성", "교통", 5),
            record("30대", "여성", "환경", 3),
            record("20대", "여성", "교통", 2),
        ]
    }

    fn pairs(result: &AggregationResult) -> Vec<(&str, u64)> {
        result
            .groups
            .iter()
            .map(|g| (g.category.as_str(), g.count))
            .collect()
    }

    #[test]
    fn test_unfiltered_scenario() {
        let records = sample();
        let filtered = FilterEngine::apply(&records, &FilterSelection::from_labels("전체", "전체"));
        let result = Aggregator::aggregate(filtered, CategoryOrder::Descending);
        assert_eq!(pairs(&result), vec![("교통", 7), ("환경", 3)]);
        assert_eq!(result.total, 10);
    }

    #[test]
    fn test_gender_scenario() {
        let records = sample();
        let filtered = FilterEngine::apply(&records, &FilterSelection::from_labels("전체", "여성"));
        let first_seen = Aggregator::aggregate(filtered.iter().copied(), CategoryOrder::FirstSeen);
        assert_eq!(pairs(&first_seen), vec![("환경", 3), ("교통", 2)]);
        assert_eq!(first_seen.total, 5);

        let descending = Aggregator::aggregate(filtered, CategoryOrder::Descending);
        assert_eq!(pairs(&descending), vec![("환경", 3), ("교통", 2)]);
    }

    #[test]
    fn test_descending_ties_keep_first_seen() {
        let records = vec![
            record("", "", "b", 1),
            record("", "", "a", 4),
            record("", "", "c", 1),
        ];
        let result = Aggregator::aggregate(&records, CategoryOrder::Descending);
        assert_eq!(pairs(&result), vec![("a", 4), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn test_blank_category_is_unclassified() {
        let records = vec![record("", "", "", 2), record("", "", "  ", 1), record("", "", "x", 0)];
        let result = Aggregator::aggregate(&records, CategoryOrder::FirstSeen);
        assert_eq!(pairs(&result), vec![(UNCLASSIFIED_LABEL, 3), ("x", 0)]);
        // Records themselves are untouched.
        assert_eq!(records[0].category, "");
    }

    #[test]
    fn test_empty_is_distinct_from_zero_count() {
        let none: Vec<Record> = Vec::new();
        let empty = Aggregator::aggregate(&none, CategoryOrder::Descending);
        assert!(empty.is_empty());
        assert_eq!(empty.total, 0);

        let zero = Aggregator::aggregate(&[record("", "", "교통", 0)], CategoryOrder::Descending);
        assert!(!zero.is_empty());
        assert_eq!(zero.total, 0);
    }

    #[test]
    fn test_total_equals_sum_of_groups_and_is_repeatable() {
        let records = sample();
        let selection = FilterSelection::from_labels("20", "전체");
        let first = Aggregator::aggregate(FilterEngine::apply(&records, &selection), CategoryOrder::Descending);
        let second = Aggregator::aggregate(FilterEngine::apply(&records, &selection), CategoryOrder::Descending);
        assert_eq!(first, second);
        assert_eq!(first.total, first.groups.iter().map(|g| g.count).sum::<u64>());
    }

    #[test]
    fn test_emphasis_thresholds() {
        assert_eq!(Emphasis::classify(9, 10), Some(Emphasis::High));
        assert_eq!(Emphasis::classify(8, 10), Some(Emphasis::Medium));
        assert_eq!(Emphasis::classify(5, 10), Some(Emphasis::Low));
        assert_eq!(Emphasis::classify(0, 0), None);
    }
}
