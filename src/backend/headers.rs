use serde::{Deserialize, Serialize};

use super::error::{LoadError, LoadResult};

/// The four semantic columns a complaint dataset must provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    Age,
    Gender,
    Category,
    Count,
}

impl CanonicalField {
    pub fn all() -> &'static [CanonicalField] {
        &[
            CanonicalField::Age,
            CanonicalField::Gender,
            CanonicalField::Category,
            CanonicalField::Count,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Age => "age",
            CanonicalField::Gender => "gender",
            CanonicalField::Category => "category",
            CanonicalField::Count => "count",
        }
    }

    /// Accepted header spellings, already in normalized form.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Age => &["연령", "연령대", "나이", "age"],
            CanonicalField::Gender => &["성별", "gender", "sex"],
            CanonicalField::Category => &["분야", "카테고리", "유형", "category", "type"],
            CanonicalField::Count => &["건수", "수", "빈도", "건", "count", "cnt", "frequency"],
        }
    }

    fn index(&self) -> usize {
        match self {
            CanonicalField::Age => 0,
            CanonicalField::Gender => 1,
            CanonicalField::Category => 2,
            CanonicalField::Count => 3,
        }
    }
}

/// Strips a leading BOM, trims, lowercases and drops all whitespace.
/// Shared by header matching and filter comparison.
pub fn normalize_label(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// A header column bound to a canonical field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundColumn {
    pub index: usize,
    pub header: String,
}

/// Resolved association between canonical fields and the source's header row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeaderMap {
    columns: [BoundColumn; 4],
}

impl HeaderMap {
    /// Binds each canonical field to the first header whose normalized form
    /// is one of its aliases. Fails if any field stays unbound.
    pub fn resolve(headers: &[String]) -> LoadResult<Self> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_label(h)).collect();

        let mut bound: [Option<BoundColumn>; 4] = Default::default();
        for field in CanonicalField::all() {
            let aliases = field.aliases();
            bound[field.index()] = normalized
                .iter()
                .position(|n| aliases.contains(&n.as_str()))
                .map(|index| BoundColumn {
                    index,
                    header: headers[index].clone(),
                });
        }

        let missing: Vec<String> = CanonicalField::all()
            .iter()
            .filter(|f| bound[f.index()].is_none())
            .map(|f| f.name().to_string())
            .collect();

        match bound {
            [Some(age), Some(gender), Some(category), Some(count)] => Ok(Self {
                columns: [age, gender, category, count],
            }),
            _ => Err(LoadError::Headers {
                missing,
                seen: headers.to_vec(),
            }),
        }
    }

    pub fn column(&self, field: CanonicalField) -> &BoundColumn {
        &self.columns[field.index()]
    }

    /// Literal header text bound to `field`.
    pub fn header(&self, field: CanonicalField) -> &str {
        &self.column(field).header
    }
}
