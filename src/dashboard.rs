use crate::aggregate::{chart_series, summarize};
use crate::cache::TtlCache;
use crate::config::AppSettings;
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::filters::{available_metrics, filter_by_date, filter_by_strategy, filter_by_urls, sort_rows};
use crate::models::{
    Criteria, DashboardView, DateSelection, FilterForm, FilterOptions, Metric, Notice, RawSort, SortKey, Table,
};
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub const NO_DATA_MESSAGE: &str = "Could not find db data.";

#[derive(Debug)]
pub struct Dashboard {
    db: Database,
    cache: TtlCache<Table>,
}

impl Dashboard {
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            db: Database::new(&settings.db_path),
            cache: TtlCache::new(settings.cache_ttl),
        }
    }

    pub fn load(&self, force: bool) -> AppResult<Arc<Table>> {
        self.cache.get_or_try_load(force, || self.db.load())
    }

    pub fn reload(&self) {
        self.cache.invalidate();
    }

    pub fn db_path(&self) -> &Path {
        self.db.path()
    }

    pub fn cache_is_fresh(&self) -> bool {
        self.cache.is_fresh()
    }

    pub fn render_cycle(&self, form: &FilterForm) -> DashboardView {
        let render_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("render", render_id = %render_id);
        let _guard = span.enter();

        let mut view = match self.load(false) {
            Ok(table) if table.is_empty() => {
                tracing::warn!("results store returned no rows");
                halted(vec![Notice::warning(NO_DATA_MESSAGE)])
            }
            Ok(table) => build_view(&table, form),
            Err(error) => {
                if error.halts_render() {
                    tracing::error!(error = %error, "render halted");
                } else {
                    tracing::error!(error = %error, "load failed, continuing with no data");
                }
                halted(load_failure_notices(&error, self.db.path()))
            }
        };

        view.render_id = render_id;
        view.db_path = self.db.path().display().to_string();
        view
    }
}

fn load_failure_notices(error: &AppError, db_path: &Path) -> Vec<Notice> {
    match error {
        AppError::Connection(_) => vec![Notice::error(format!(
            "Could not connect to the database at {}.",
            db_path.display()
        ))],
        AppError::Query(_) => vec![
            Notice::error(format!("Failed to load data: {}", error)),
            Notice::warning(NO_DATA_MESSAGE),
        ],
        _ => vec![Notice::error(format!("Failed to load data: {}", error))],
    }
}

fn halted(notices: Vec<Notice>) -> DashboardView {
    DashboardView {
        notices,
        ..DashboardView::default()
    }
}

pub fn build_view(table: &Table, form: &FilterForm) -> DashboardView {
    let mut options = FilterOptions::default();
    let mut notices = Vec::new();

    let bounds = table.date_bounds();
    if let Some((min_date, max_date)) = bounds {
        options.min_date = Some(min_date);
        options.max_date = Some(max_date);
    }

    let dates = resolve_dates(form, bounds);
    let mut data = if table.has_datetime() {
        filter_by_date(table, &dates)
    } else {
        table.clone()
    };

    options.urls = data.distinct_urls();
    let urls = if form.applied {
        dedup(form.urls.iter().cloned())
    } else {
        options.urls.iter().take(1).cloned().collect()
    };
    data = filter_by_urls(&data, &urls);

    options.metrics = available_metrics(table);
    let metrics = if form.applied {
        resolve_metrics(&form.metrics, &options.metrics)
    } else {
        options.metrics.iter().take(1).copied().collect()
    };

    let strategy = if table.has_strategy() {
        options.strategies = data.distinct_strategies();
        form.strategy
            .as_ref()
            .filter(|selected| options.strategies.contains(selected))
            .or_else(|| options.strategies.first())
            .cloned()
    } else {
        None
    };
    data = filter_by_strategy(&data, strategy.as_deref());

    let sort = resolve_sort(form, &options.metrics);

    if urls.is_empty() {
        notices.push(Notice::info("Select at least one URL to display."));
    } else if data.is_empty() {
        notices.push(Notice::info("No measurements match the current filters."));
    }
    if metrics.is_empty() {
        notices.push(Notice::info("Select at least one metric to display."));
    }

    let (summaries, charts) = if urls.is_empty() || metrics.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        (summarize(&data, &urls, &metrics), chart_series(&data, &urls, &metrics))
    };

    tracing::debug!(
        rows = data.len(),
        urls = urls.len(),
        metrics = metrics.len(),
        charts = charts.len(),
        "dashboard view built"
    );

    DashboardView {
        notices,
        options,
        criteria: Criteria {
            dates,
            urls,
            metrics,
            strategy,
            sort,
        },
        summaries,
        charts,
        raw: Some(sort_rows(&data, sort)),
        ..DashboardView::default()
    }
}

fn resolve_dates(form: &FilterForm, bounds: Option<(NaiveDate, NaiveDate)>) -> DateSelection {
    if !form.applied {
        return match bounds {
            Some((min_date, max_date)) => DateSelection::range(min_date, max_date),
            None => DateSelection::default(),
        };
    }

    let clamp = |date: NaiveDate| match bounds {
        Some((lo, hi)) => date.clamp(lo, hi),
        None => date,
    };
    let start = form.start.as_deref().and_then(parse_date).map(clamp);
    let end = form.end.as_deref().and_then(parse_date).map(clamp);
    match (start, end) {
        (Some(start), Some(end)) if start > end => DateSelection::range(end, start),
        _ => DateSelection { start, end },
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn resolve_metrics(requested: &[String], available: &[Metric]) -> Vec<Metric> {
    let mut out = Vec::new();
    for metric in requested.iter().filter_map(|name| Metric::parse(name.trim())) {
        if available.contains(&metric) && !out.contains(&metric) {
            out.push(metric);
        }
    }
    out
}

fn resolve_sort(form: &FilterForm, available: &[Metric]) -> RawSort {
    let key = form
        .sort
        .as_deref()
        .and_then(SortKey::parse)
        .filter(|key| match key {
            SortKey::Metric(metric) => available.contains(metric),
            _ => true,
        });
    match key {
        Some(key) => RawSort {
            key,
            descending: form.order.as_deref() != Some("asc"),
        },
        None => RawSort::default(),
    }
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
