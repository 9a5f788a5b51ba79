use crate::models::{DateSelection, MeasurementRow, Metric, RawSort, SortKey, Table};
use chrono::Days;
use std::cmp::Ordering;

/// Keeps rows in `[start 00:00, end + 1 day 00:00)` UTC. An incomplete
/// selection passes the table through unchanged.
pub fn filter_by_date(table: &Table, dates: &DateSelection) -> Table {
    let Some((start, end)) = dates.bounds() else {
        return table.clone();
    };
    let lower = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    let upper = end
        .checked_add_days(Days::new(1))
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc());

    let rows = table
        .rows
        .iter()
        .filter(|row| match row.datetime {
            Some(dt) => lower.map_or(true, |lo| dt >= lo) && upper.map_or(true, |hi| dt < hi),
            None => false,
        })
        .cloned()
        .collect();
    narrowed(table, rows, "date")
}

/// Keeps rows whose url is selected. An empty selection keeps nothing.
pub fn filter_by_urls(table: &Table, urls: &[String]) -> Table {
    let rows = table
        .rows
        .iter()
        .filter(|row| urls.iter().any(|url| *url == row.url))
        .cloned()
        .collect();
    narrowed(table, rows, "url")
}

pub fn filter_by_strategy(table: &Table, strategy: Option<&str>) -> Table {
    let Some(strategy) = strategy else {
        return table.clone();
    };
    if !table.has_strategy() {
        return table.clone();
    }
    let rows = table
        .rows
        .iter()
        .filter(|row| row.strategy.as_deref() == Some(strategy))
        .cloned()
        .collect();
    narrowed(table, rows, "strategy")
}

pub fn available_metrics(table: &Table) -> Vec<Metric> {
    Metric::PREFERRED_ORDER
        .into_iter()
        .filter(|metric| table.has_column(metric.as_str()))
        .collect()
}

pub fn sort_rows(table: &Table, sort: RawSort) -> Table {
    let mut rows = table.rows.clone();
    rows.sort_by(|a, b| compare_rows(a, b, sort));
    table.with_rows(rows)
}

fn compare_rows(a: &MeasurementRow, b: &MeasurementRow, sort: RawSort) -> Ordering {
    match sort.key {
        SortKey::Datetime => compare_optional(a.datetime.as_ref(), b.datetime.as_ref(), sort.descending, Ord::cmp),
        SortKey::Url => directed(a.url.cmp(&b.url), sort.descending),
        SortKey::Strategy => compare_optional(a.strategy.as_ref(), b.strategy.as_ref(), sort.descending, Ord::cmp),
        SortKey::Metric(metric) => compare_optional(
            a.metrics.get(metric).as_ref(),
            b.metrics.get(metric).as_ref(),
            sort.descending,
            |x: &f64, y: &f64| x.total_cmp(y),
        ),
    }
}

fn compare_optional<T, F>(a: Option<&T>, b: Option<&T>, descending: bool, cmp: F) -> Ordering
where
    F: Fn(&T, &T) -> Ordering,
{
    match (a, b) {
        (Some(x), Some(y)) => directed(cmp(x, y), descending),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn directed(ordering: Ordering, descending: bool) -> Ordering {
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

fn narrowed(table: &Table, rows: Vec<MeasurementRow>, filter: &'static str) -> Table {
    tracing::debug!(filter, before = table.len(), after = rows.len(), "filter applied");
    table.with_rows(rows)
}
