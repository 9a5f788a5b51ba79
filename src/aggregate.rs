use crate::models::{ChartSeries, MeasurementRow, Metric, MetricAverage, Table, UrlChart, UrlSummary};

pub fn mean<'a>(rows: impl IntoIterator<Item = &'a MeasurementRow>, metric: Metric) -> Option<f64> {
    let (sum, count) = rows
        .into_iter()
        .filter_map(|row| row.metrics.get(metric))
        .fold((0.0_f64, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn summarize(table: &Table, urls: &[String], metrics: &[Metric]) -> Vec<UrlSummary> {
    urls.iter()
        .filter_map(|url| {
            let rows: Vec<&MeasurementRow> = table.rows_for_url(url).collect();
            if rows.is_empty() {
                tracing::debug!(url = %url, "no rows for url, skipping summary");
                return None;
            }
            let averages = metrics
                .iter()
                .map(|metric| MetricAverage {
                    metric: *metric,
                    mean: mean(rows.iter().copied(), *metric),
                })
                .collect();
            Some(UrlSummary {
                url: url.clone(),
                row_count: rows.len(),
                averages,
            })
        })
        .collect()
}

pub fn chart_series(table: &Table, urls: &[String], metrics: &[Metric]) -> Vec<UrlChart> {
    urls.iter()
        .filter_map(|url| {
            let mut rows: Vec<&MeasurementRow> = table.rows_for_url(url).collect();
            let strategy = rows.first()?.strategy.clone().unwrap_or_default();
            rows.sort_by_key(|row| row.datetime);

            let series = metrics
                .iter()
                .map(|metric| ChartSeries {
                    metric: *metric,
                    points: rows
                        .iter()
                        .filter_map(|row| Some((row.datetime?, row.metrics.get(*metric)?)))
                        .collect(),
                })
                .collect();
            Some(UrlChart {
                url: url.clone(),
                strategy,
                series,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::epoch_to_datetime;

    fn row(url: &str, poll_time: i64, performance: Option<f64>) -> MeasurementRow {
        let mut row = MeasurementRow::new(url);
        row.strategy = Some("mobile".to_string());
        row.poll_time = Some(poll_time);
        row.datetime = epoch_to_datetime(poll_time);
        row.metrics.performance = performance;
        row
    }

    fn table(rows: Vec<MeasurementRow>) -> Table {
        Table {
            columns: vec!["url".into(), "strategy".into(), "poll_time".into(), "performance".into()],
            extra_columns: Vec::new(),
            rows,
        }
    }

    #[test]
    fn mean_skips_missing_values() {
        let rows = [row("a", 1, Some(10.0)), row("a", 2, None), row("a", 3, Some(20.0))];
        assert_eq!(mean(rows.iter(), Metric::Performance), Some(15.0));
        assert_eq!(mean(rows.iter(), Metric::Lcp), None);
        assert_eq!(mean(std::iter::empty(), Metric::Performance), None);
    }

    #[test]
    fn summaries_skip_urls_without_rows() {
        let t = table(vec![row("a", 1, Some(80.0)), row("a", 2, Some(90.0))]);
        let urls = vec!["a".to_string(), "missing".to_string()];
        let summaries = summarize(&t, &urls, &[Metric::Performance]);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].url, "a");
        assert_eq!(summaries[0].row_count, 2);
        assert_eq!(summaries[0].averages[0].mean, Some(85.0));
    }

    #[test]
    fn chart_points_are_time_ascending() {
        let t = table(vec![row("a", 300, Some(3.0)), row("a", 100, Some(1.0)), row("a", 200, None)]);
        let charts = chart_series(&t, &["a".to_string(), "b".to_string()], &[Metric::Performance]);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].strategy, "mobile");
        let values: Vec<f64> = charts[0].series[0].points.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }
}
