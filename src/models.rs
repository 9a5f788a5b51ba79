use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Performance,
    Fcp,
    Lcp,
    Cls,
}

impl Metric {
    pub const PREFERRED_ORDER: [Metric; 4] = [Metric::Performance, Metric::Fcp, Metric::Lcp, Metric::Cls];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Fcp => "fcp",
            Self::Lcp => "lcp",
            Self::Cls => "cls",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::PREFERRED_ORDER
            .into_iter()
            .find(|metric| metric.as_str() == value)
    }

    pub fn label(self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricValues {
    pub performance: Option<f64>,
    pub fcp: Option<f64>,
    pub lcp: Option<f64>,
    pub cls: Option<f64>,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Performance => self.performance,
            Metric::Fcp => self.fcp,
            Metric::Lcp => self.lcp,
            Metric::Cls => self.cls,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Performance => &mut self.performance,
            Metric::Fcp => &mut self.fcp,
            Metric::Lcp => &mut self.lcp,
            Metric::Cls => &mut self.cls,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRow {
    pub url: String,
    pub strategy: Option<String>,
    pub poll_time: Option<i64>,
    pub datetime: Option<DateTime<Utc>>,
    pub metrics: MetricValues,
    pub extras: Vec<Option<String>>,
}

impl MeasurementRow {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            strategy: None,
            poll_time: None,
            datetime: None,
            metrics: MetricValues::default(),
            extras: Vec::new(),
        }
    }
}

pub fn epoch_to_datetime(poll_time: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(poll_time, 0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub rows: Vec<MeasurementRow>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn has_strategy(&self) -> bool {
        self.has_column("strategy")
    }

    pub fn has_datetime(&self) -> bool {
        self.has_column("poll_time")
    }

    pub fn with_rows(&self, rows: Vec<MeasurementRow>) -> Self {
        Self {
            columns: self.columns.clone(),
            extra_columns: self.extra_columns.clone(),
            rows,
        }
    }

    pub fn rows_for_url<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a MeasurementRow> + 'a {
        self.rows.iter().filter(move |row| row.url == url)
    }

    pub fn distinct_urls(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|row| Some(row.url.as_str())))
    }

    pub fn distinct_strategies(&self) -> Vec<String> {
        distinct(self.rows.iter().map(|row| row.strategy.as_deref()))
    }

    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().filter_map(|row| row.datetime).map(|dt| dt.date_naive());
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), date| (lo.min(date), hi.max(date))))
    }
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values.flatten() {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterForm {
    pub start: Option<String>,
    pub end: Option<String>,
    pub urls: Vec<String>,
    pub metrics: Vec<String>,
    pub strategy: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub applied: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateSelection {
    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Datetime,
    Url,
    Strategy,
    Metric(Metric),
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Datetime => "datetime",
            Self::Url => "url",
            Self::Strategy => "strategy",
            Self::Metric(metric) => metric.as_str(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "datetime" | "poll_time" => Some(Self::Datetime),
            "url" => Some(Self::Url),
            "strategy" => Some(Self::Strategy),
            other => Metric::parse(other).map(Self::Metric),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawSort {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for RawSort {
    fn default() -> Self {
        Self {
            key: SortKey::Datetime,
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Criteria {
    pub dates: DateSelection,
    pub urls: Vec<String>,
    pub metrics: Vec<Metric>,
    pub strategy: Option<String>,
    pub sort: RawSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAverage {
    pub metric: Metric,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSummary {
    pub url: String,
    pub row_count: usize,
    pub averages: Vec<MetricAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub metric: Metric,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlChart {
    pub url: String,
    pub strategy: String,
    pub series: Vec<ChartSeries>,
}

impl UrlChart {
    pub fn title(&self) -> String {
        format!("URL: {} ({})", self.url, self.strategy)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub urls: Vec<String>,
    pub metrics: Vec<Metric>,
    pub strategies: Vec<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub render_id: String,
    pub db_path: String,
    pub notices: Vec<Notice>,
    pub options: FilterOptions,
    pub criteria: Criteria,
    pub summaries: Vec<UrlSummary>,
    pub charts: Vec<UrlChart>,
    pub raw: Option<Table>,
}

impl DashboardView {
    pub fn halted(&self) -> bool {
        self.raw.is_none()
    }
}
