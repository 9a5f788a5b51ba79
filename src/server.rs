use crate::dashboard::Dashboard;
use crate::errors::{AppError, AppResult};
use crate::models::{DashboardView, FilterForm};
use crate::render::render_page;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/reload", post(reload))
        .route("/api/dashboard", get(dashboard_json))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listen: SocketAddr, state: AppState) -> AppResult<()> {
    let listener = TcpListener::bind(listen).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "dashboard listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

pub fn parse_form(raw: &str) -> FilterForm {
    let mut form = FilterForm::default();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let value = value.into_owned();
        match key.as_ref() {
            "applied" => form.applied = true,
            "start" => form.start = Some(value),
            "end" => form.end = Some(value),
            "url" => form.urls.push(value),
            "metric" => form.metrics.push(value),
            "strategy" => form.strategy = Some(value),
            "sort" => form.sort = Some(value),
            "order" => form.order = Some(value),
            _ => {}
        }
    }
    form
}

async fn index(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let form = parse_form(raw.as_deref().unwrap_or_default());
    let dashboard = state.dashboard.clone();
    let page = tokio::task::spawn_blocking(move || render_page(&dashboard.render_cycle(&form))).await;

    match page {
        Ok(body) => Html(body).into_response(),
        Err(error) => {
            tracing::error!(error = %error, "render task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, to_client_error(AppError::Internal(error.to_string()))).into_response()
        }
    }
}

async fn dashboard_json(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let form = parse_form(raw.as_deref().unwrap_or_default());
    match render_view(&state, form).await {
        Ok(view) => Json(view).into_response(),
        Err(error) => (StatusCode::INTERNAL_SERVER_ERROR, to_client_error(error)).into_response(),
    }
}

async fn reload(State(state): State<AppState>) -> Redirect {
    state.dashboard.reload();
    Redirect::to("/")
}

async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "dbPath": state.dashboard.db_path().display().to_string(),
        "cacheFresh": state.dashboard.cache_is_fresh(),
    }))
}

async fn render_view(state: &AppState, form: FilterForm) -> AppResult<DashboardView> {
    let dashboard = state.dashboard.clone();
    tokio::task::spawn_blocking(move || dashboard.render_cycle(&form))
        .await
        .map_err(|error| AppError::Internal(error.to_string()))
}

fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::parse_form;

    #[test]
    fn repeated_keys_accumulate() {
        let form = parse_form("applied=1&url=https%3A%2F%2Fa.test&url=https%3A%2F%2Fb.test&metric=fcp&strategy=mobile");
        assert!(form.applied);
        assert_eq!(form.urls, vec!["https://a.test".to_string(), "https://b.test".to_string()]);
        assert_eq!(form.metrics, vec!["fcp".to_string()]);
        assert_eq!(form.strategy.as_deref(), Some("mobile"));
        assert!(form.start.is_none());
    }

    #[test]
    fn empty_query_is_a_first_visit() {
        let form = parse_form("");
        assert!(!form.applied);
        assert!(form.urls.is_empty());
    }
}
