use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use pagespeed_dashboard_lib::config::AppSettings;
use pagespeed_dashboard_lib::dashboard::Dashboard;
use pagespeed_dashboard_lib::models::{FilterForm, Metric, NoticeLevel};
use pagespeed_dashboard_lib::server::{router, AppState};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tower::ServiceExt;

const SCHEMA_SQL: &str = include_str!("fixtures/schema.sql");

// 2024-03-01 00:00:00 UTC
const MARCH_1: i64 = 1_709_251_200;

fn seed_store(path: &Path) {
    let conn = Connection::open(path).expect("open store");
    conn.execute_batch(SCHEMA_SQL).expect("schema");
    for (offset, score) in [(9 * 3600, 80.0), (15 * 3600, 90.0), (86_400 + 10 * 3600, 70.0)] {
        insert(&conn, "https://a.test", "mobile", MARCH_1 + offset, score);
    }
}

fn insert(conn: &Connection, url: &str, strategy: &str, poll_time: i64, performance: f64) {
    conn.execute(
        "INSERT INTO pagespeed_results (url, strategy, poll_time, performance, fcp, lcp, cls)
         VALUES (?1, ?2, ?3, ?4, 1.1, 2.2, 0.01)",
        params![url, strategy, poll_time, performance],
    )
    .expect("insert");
}

fn settings_for(path: PathBuf) -> AppSettings {
    AppSettings {
        db_path: path,
        ..AppSettings::default()
    }
}

fn full_range_form() -> FilterForm {
    FilterForm {
        start: Some("2024-03-01".to_string()),
        end: Some("2024-03-02".to_string()),
        urls: vec!["https://a.test".to_string()],
        metrics: vec!["performance".to_string()],
        strategy: Some("mobile".to_string()),
        applied: true,
        ..FilterForm::default()
    }
}

#[test]
fn end_to_end_single_url_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("pagespeed.db");
    seed_store(&db_path);

    let dashboard = Dashboard::new(&settings_for(db_path));
    let view = dashboard.render_cycle(&full_range_form());
    assert!(!view.halted());
    assert!(view.notices.is_empty());

    assert_eq!(view.summaries.len(), 1);
    let average = &view.summaries[0].averages[0];
    assert_eq!(average.metric, Metric::Performance);
    assert_eq!(pagespeed_dashboard_lib::render::format_mean(average.mean), "80.0");

    assert_eq!(view.charts.len(), 1);
    assert_eq!(view.charts[0].title(), "URL: https://a.test (mobile)");
    let points = &view.charts[0].series[0].points;
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![80.0, 90.0, 70.0]);
    assert!(points.windows(2).all(|pair| pair[0].0 < pair[1].0));

    let raw = view.raw.expect("raw table");
    let raw_values: Vec<f64> = raw.rows.iter().filter_map(|row| row.metrics.performance).collect();
    assert_eq!(raw_values, vec![70.0, 90.0, 80.0]);
}

#[test]
fn reload_discards_memoized_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("pagespeed.db");
    seed_store(&db_path);

    let dashboard = Dashboard::new(&settings_for(db_path.clone()));
    assert_eq!(dashboard.load(false).expect("first load").len(), 3);

    let conn = Connection::open(&db_path).expect("open store");
    insert(&conn, "https://b.test", "desktop", MARCH_1, 50.0);
    drop(conn);

    assert_eq!(dashboard.load(false).expect("cached load").len(), 3);
    dashboard.reload();
    assert_eq!(dashboard.load(false).expect("fresh load").len(), 4);
}

#[test]
fn empty_store_warns_and_halts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("pagespeed.db");
    let conn = Connection::open(&db_path).expect("open store");
    conn.execute_batch(SCHEMA_SQL).expect("schema");
    drop(conn);

    let view = Dashboard::new(&settings_for(db_path)).render_cycle(&FilterForm::default());
    assert!(view.halted());
    assert_eq!(view.notices.len(), 1);
    assert_eq!(view.notices[0].level, NoticeLevel::Warning);
    assert_eq!(view.notices[0].message, "Could not find db data.");
}

#[test]
fn broken_schema_degrades_to_no_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("pagespeed.db");
    let conn = Connection::open(&db_path).expect("open store");
    conn.execute_batch("CREATE TABLE unrelated (x INTEGER);").expect("schema");
    drop(conn);

    let view = Dashboard::new(&settings_for(db_path)).render_cycle(&FilterForm::default());
    assert!(view.halted());
    let levels: Vec<NoticeLevel> = view.notices.iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Error, NoticeLevel::Warning]);
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

#[tokio::test]
async fn index_renders_cards_charts_and_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("pagespeed.db");
    seed_store(&db_path);
    let app = router(AppState::new(Dashboard::new(&settings_for(db_path))));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Performance Averages"));
    assert!(html.contains("80.0"));
    assert!(html.contains("<svg"));
    assert!(html.contains("View Raw Data (3 rows)"));
}

#[tokio::test]
async fn empty_url_selection_renders_no_sections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("pagespeed.db");
    seed_store(&db_path);
    let app = router(AppState::new(Dashboard::new(&settings_for(db_path))));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/?applied=1&metric=performance")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let html = body_text(response).await;
    assert!(html.contains("Select at least one URL to display."));
    assert!(!html.contains("Performance Averages"));
    assert!(!html.contains("<svg"));
}

#[tokio::test]
async fn json_endpoint_reports_connection_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = router(AppState::new(Dashboard::new(&settings_for(dir.path().join("missing.db")))));

    let response = app
        .oneshot(Request::builder().uri("/api/dashboard").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload: serde_json::Value = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(payload["notices"][0]["level"], "error");
    assert!(payload["notices"][0]["message"]
        .as_str()
        .is_some_and(|message| message.contains("missing.db")));
    assert!(payload["raw"].is_null());
}

#[tokio::test]
async fn reload_redirects_home() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("pagespeed.db");
    seed_store(&db_path);
    let app = router(AppState::new(Dashboard::new(&settings_for(db_path))));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/reload")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn healthz_reports_cache_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("pagespeed.db");
    seed_store(&db_path);
    let dashboard = Dashboard::new(&settings_for(db_path));
    dashboard.load(false).expect("warm cache");
    let app = router(AppState::new(dashboard));

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload: serde_json::Value = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["cacheFresh"], true);
    assert!(payload["dbPath"]
        .as_str()
        .is_some_and(|path| path.ends_with("pagespeed.db")));
}
