use crate::models::{Criteria, MeasurementRow, Metric, RawSort, SortKey, Table};
use crate::render::criteria_query;
use maud::{html, Markup};

const DATETIME_COLUMN: &str = "datetime";

pub fn display_columns(table: &Table) -> Vec<String> {
    let mut columns = table.columns.clone();
    if table.has_datetime() {
        columns.push(DATETIME_COLUMN.to_string());
    }
    columns
}

pub fn cell_text(table: &Table, row: &MeasurementRow, column: &str) -> String {
    match column {
        "url" => row.url.clone(),
        "strategy" => row.strategy.clone().unwrap_or_default(),
        "poll_time" => row.poll_time.map(|v| v.to_string()).unwrap_or_default(),
        DATETIME_COLUMN => row
            .datetime
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        other => match Metric::parse(other) {
            Some(metric) => row.metrics.get(metric).map(|v| v.to_string()).unwrap_or_default(),
            None => table
                .extra_columns
                .iter()
                .position(|extra| extra == other)
                .and_then(|idx| row.extras.get(idx).cloned().flatten())
                .unwrap_or_default(),
        },
    }
}

fn header(column: &str, criteria: &Criteria) -> Markup {
    let Some(key) = SortKey::parse(column) else {
        return html! { th { (column) } };
    };
    let active = criteria.sort.key == key;
    let next = RawSort {
        key,
        descending: !(active && criteria.sort.descending),
    };
    let marker = match (active, criteria.sort.descending) {
        (false, _) => "",
        (true, true) => " \u{25BC}",
        (true, false) => " \u{25B2}",
    };
    html! {
        th {
            a href={ "/?" (criteria_query(criteria, next)) } { (column) (marker) }
        }
    }
}

pub fn raw_table(table: &Table, criteria: &Criteria) -> Markup {
    let columns = display_columns(table);
    html! {
        details.raw-data {
            summary { "View Raw Data (" (table.len()) " rows)" }
            @if table.is_empty() {
                p.placeholder { "No rows to show." }
            } @else {
                table.raw {
                    thead {
                        tr {
                            @for column in &columns {
                                (header(column, criteria))
                            }
                        }
                    }
                    tbody {
                        @for row in &table.rows {
                            tr {
                                @for column in &columns {
                                    td { (cell_text(table, row, column)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::epoch_to_datetime;

    fn table() -> Table {
        let mut row = MeasurementRow::new("https://a.test");
        row.strategy = Some("mobile".to_string());
        row.poll_time = Some(1_700_000_000);
        row.datetime = epoch_to_datetime(1_700_000_000);
        row.metrics.performance = Some(80.5);
        row.extras = vec![Some("7".to_string())];
        Table {
            columns: vec!["id".into(), "url".into(), "strategy".into(), "poll_time".into(), "performance".into()],
            extra_columns: vec!["id".into()],
            rows: vec![row],
        }
    }

    #[test]
    fn appends_datetime_column() {
        let columns = display_columns(&table());
        assert_eq!(columns.first().map(String::as_str), Some("id"));
        assert_eq!(columns.last().map(String::as_str), Some("datetime"));
    }

    #[test]
    fn formats_cells() {
        let t = table();
        let row = &t.rows[0];
        assert_eq!(cell_text(&t, row, "id"), "7");
        assert_eq!(cell_text(&t, row, "performance"), "80.5");
        assert_eq!(cell_text(&t, row, "datetime"), "2023-11-14 22:13:20");
        assert_eq!(cell_text(&t, row, "lcp"), "");
    }

    #[test]
    fn active_sort_header_toggles_direction() {
        let criteria = Criteria::default();
        let html = raw_table(&table(), &criteria).into_string();
        assert!(html.contains("sort=datetime&amp;order=asc"));
        assert!(html.contains("sort=url&amp;order=desc"));
        assert!(html.contains("<th>id</th>"));
    }
}
