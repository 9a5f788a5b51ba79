use crate::errors::{AppError, AppResult};
use crate::models::{epoch_to_datetime, MeasurementRow, Metric, Table};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const RESULTS_TABLE: &str = "pagespeed_results";
const SELECT_ALL_SQL: &str = "SELECT * FROM pagespeed_results";

#[derive(Debug, Clone)]
pub struct Database {
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> Self {
        Self {
            db_path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn load(&self) -> AppResult<Table> {
        let started = Instant::now();
        tracing::info!(path = %self.db_path.display(), "loading pagespeed results");

        let conn = self.open()?;
        let result = read_table(&conn);
        if let Err((_, error)) = conn.close() {
            tracing::warn!(error = %error, "closing results store failed");
        }

        match &result {
            Ok(table) => tracing::info!(
                rows = table.len(),
                columns = table.columns.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "loaded pagespeed results"
            ),
            Err(error) => tracing::warn!(error = %error, "reading pagespeed results failed"),
        }
        result
    }

    fn open(&self) -> AppResult<Connection> {
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| {
            AppError::Connection(format!(
                "could not open results store at {}: {}",
                self.db_path.display(),
                err
            ))
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum ColumnRole {
    Url,
    Strategy,
    PollTime,
    Metric(Metric),
    Extra(usize),
}

fn read_table(conn: &Connection) -> AppResult<Table> {
    let mut stmt = conn.prepare(SELECT_ALL_SQL).map_err(query_error)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    if !columns.iter().any(|column| column == "url") {
        return Err(AppError::Query(format!("{} has no url column", RESULTS_TABLE)));
    }

    let mut extra_columns = Vec::new();
    let roles: Vec<ColumnRole> = columns
        .iter()
        .map(|column| match column.as_str() {
            "url" => ColumnRole::Url,
            "strategy" => ColumnRole::Strategy,
            "poll_time" => ColumnRole::PollTime,
            other => match Metric::parse(other) {
                Some(metric) => ColumnRole::Metric(metric),
                None => {
                    extra_columns.push(other.to_string());
                    ColumnRole::Extra(extra_columns.len() - 1)
                }
            },
        })
        .collect();

    let mut rows = stmt.query([]).map_err(query_error)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(query_error)? {
        let mut record = MeasurementRow::new(String::new());
        record.extras = vec![None; extra_columns.len()];

        for (idx, role) in roles.iter().enumerate() {
            let value = row.get_ref(idx).map_err(query_error)?;
            match *role {
                ColumnRole::Url => record.url = text_value(value).unwrap_or_default(),
                ColumnRole::Strategy => record.strategy = text_value(value),
                ColumnRole::PollTime => {
                    record.poll_time = coerce_poll_time(value)?;
                    record.datetime = record.poll_time.and_then(epoch_to_datetime);
                }
                ColumnRole::Metric(metric) => record.metrics.set(metric, coerce_metric(value)),
                ColumnRole::Extra(slot) => record.extras[slot] = text_value(value),
            }
        }
        out.push(record);
    }

    Ok(Table {
        columns,
        extra_columns,
        rows: out,
    })
}

fn query_error(err: rusqlite::Error) -> AppError {
    AppError::Query(err.to_string())
}

fn coerce_poll_time(value: ValueRef<'_>) -> AppResult<Option<i64>> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(v) => Ok(Some(v)),
        ValueRef::Real(v) if v.is_finite() => Ok(Some(v.floor() as i64)),
        ValueRef::Real(v) => Err(AppError::Query(format!("poll_time is not finite: {}", v))),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            let trimmed = text.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                return Ok(Some(v));
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Some(v.floor() as i64)),
                _ => Err(AppError::Query(format!("poll_time is not numeric: {:?}", trimmed))),
            }
        }
        ValueRef::Blob(_) => Err(AppError::Query("poll_time is a blob".to_string())),
    }
}

fn coerce_metric(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Integer(v) => Some(v as f64),
        ValueRef::Real(v) if v.is_finite() => Some(v),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite()),
        _ => None,
    }
}

fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(v) => Some(v.to_string()),
        ValueRef::Real(v) => Some(v.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Some(format!("<{} bytes>", bytes.len())),
    }
}
