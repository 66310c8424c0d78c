use serde::Serialize;
use std::sync::Arc;

use super::analysis::{AggregationResult, Aggregator, CategoryOrder, Emphasis};
use super::error::LoadResult;
use super::filter::{ALL_LABEL, FilterEngine, FilterSelection, distinct_labels};
use super::formatting::format_grouped;
use super::loader::Dataset;

pub const KPI_LABEL: &str = "총 민원 건수";
pub const KPI_ERROR_TITLE: &str = "데이터 오류";
pub const KPI_PLACEHOLDER: &str = "-";
pub const CHART_TITLE: &str = "분야별 민원 건수";
pub const SERIES_LABEL: &str = "민원 건수";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Kpi {
    Total { label: String, value: String },
    Error { title: String, value: String, detail: String },
    /// Nothing loaded yet.
    Pending,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartModel {
    pub title: String,
    pub series_label: String,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub show_legend: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Card {
    pub category: String,
    pub count: u64,
    pub emphasis: Option<Emphasis>,
}

/// Everything the presentation layer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderModel {
    pub kpi: Kpi,
    /// `None` means the chart must be cleared.
    pub chart: Option<ChartModel>,
    pub cards: Vec<Card>,
    pub aggregation: AggregationResult,
}

impl RenderModel {
    fn without_data(kpi: Kpi) -> Self {
        Self {
            kpi,
            chart: None,
            cards: Vec::new(),
            aggregation: AggregationResult::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum DatasetState {
    NotLoaded,
    Loaded(Arc<Dataset>),
    Failed(String),
}

/// Owns the loaded dataset for the session and turns filter selections
/// into render models.
pub struct DashboardController {
    state: DatasetState,
    order: CategoryOrder,
}

impl DashboardController {
    pub fn new(order: CategoryOrder) -> Self {
        Self {
            state: DatasetState::NotLoaded,
            order,
        }
    }

    /// Replaces the dataset wholesale with the outcome of a load.
    pub fn install(&mut self, result: LoadResult<Dataset>) {
        self.state = match result {
            Ok(dataset) => DatasetState::Loaded(Arc::new(dataset)),
            Err(e) => DatasetState::Failed(e.to_string()),
        };
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.state {
            DatasetState::Loaded(dataset) => Some(dataset.as_ref()),
            _ => None,
        }
    }

    pub fn set_order(&mut self, order: CategoryOrder) {
        self.order = order;
    }

    /// Filters and aggregates from scratch. No state is kept between calls.
    pub fn aggregate(&self, selection: &FilterSelection) -> Option<AggregationResult> {
        self.dataset().map(|dataset| {
            let filtered = FilterEngine::apply(dataset.records(), selection);
            Aggregator::aggregate(filtered, self.order)
        })
    }

    pub fn render(&self, selection: &FilterSelection) -> RenderModel {
        let aggregation = match &self.state {
            DatasetState::NotLoaded => return RenderModel::without_data(Kpi::Pending),
            DatasetState::Failed(detail) => {
                return RenderModel::without_data(Kpi::Error {
                    title: KPI_ERROR_TITLE.to_string(),
                    value: KPI_PLACEHOLDER.to_string(),
                    detail: detail.clone(),
                });
            }
            DatasetState::Loaded(_) => self.aggregate(selection).unwrap_or_default(),
        };

        let kpi = Kpi::Total {
            label: KPI_LABEL.to_string(),
            value: format_grouped(aggregation.total),
        };

        let chart = (!aggregation.is_empty()).then(|| ChartModel {
            title: CHART_TITLE.to_string(),
            series_label: SERIES_LABEL.to_string(),
            labels: aggregation.labels(),
            values: aggregation.values(),
            show_legend: false,
        });

        let cards = aggregation
            .groups
            .iter()
            .map(|g| Card {
                category: g.category.clone(),
                count: g.count,
                emphasis: aggregation.emphasis(g),
            })
            .collect();

        RenderModel {
            kpi,
            chart,
            cards,
            aggregation,
        }
    }

    /// Age selector entries: the sentinel followed by the dataset's labels.
    pub fn age_options(&self) -> Vec<String> {
        self.options(|dataset| distinct_labels(dataset.records().iter().map(|r| r.age.as_str())))
    }

    pub fn gender_options(&self) -> Vec<String> {
        self.options(|dataset| distinct_labels(dataset.records().iter().map(|r| r.gender.as_str())))
    }

    fn options(&self, labels: impl Fn(&Dataset) -> Vec<String>) -> Vec<String> {
        let mut options = vec![ALL_LABEL.to_string()];
        if let Some(dataset) = self.dataset() {
            options.extend(labels(dataset));
        }
        options
    }
}

impl Default for DashboardController {
    fn default() -> Self {
        Self::new(CategoryOrder::default())
    }
}
