// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// `/` serves the dashboard page; everything else lives under `/api/v1/`.
// Kline interactions return the re-rendered chart markup so a client can
// swap it in without waiting for the WebSocket push.
//
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::ApiState;
use crate::app_state::AppState;
use crate::chart::ZoomTransform;
use crate::dashboard::page::render_page;
use crate::dashboard::DashboardController;
use crate::error::DashboardError;
use crate::types::{ContainerId, Resolution, Viewport};

// =============================================================================
// Router construction
// =============================================================================

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Page ────────────────────────────────────────────────────
        .route("/", get(index))
        .route("/api/v1/health", get(health))
        .route("/api/v1/containers/:id", get(container))
        // ── Controls ────────────────────────────────────────────────
        .route("/api/v1/resolution/:res", post(select_resolution))
        .route("/api/v1/kline/hover", get(kline_hover))
        .route("/api/v1/kline/zoom", post(kline_zoom))
        .route("/api/v1/kline/resize", post(kline_resize))
        // ── WebSocket ───────────────────────────────────────────────
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ──────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Page
// =============================================================================

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let config = state.config.read().clone();
    Html(render_page(&config, state.resolution(), &state.page))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_secs: u64,
    resolution: Resolution,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.uptime_secs(),
        resolution: state.resolution(),
    })
}

async fn container(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, DashboardError> {
    let id: ContainerId = id.parse()?;
    Ok(Html(state.page.get(id)?.to_html()))
}

// =============================================================================
// Controls
// =============================================================================

async fn select_resolution(
    State(controller): State<DashboardController>,
    Path(res): Path<String>,
) -> Result<Redirect, DashboardError> {
    let resolution: Resolution = res.parse()?;
    controller.select_resolution(resolution).await?;
    info!(resolution = %resolution, "resolution changed via API");
    Ok(Redirect::to("/"))
}

#[derive(Deserialize)]
struct HoverQuery {
    x: f64,
}

async fn kline_hover(
    State(controller): State<DashboardController>,
    Query(query): Query<HoverQuery>,
) -> Result<impl IntoResponse, DashboardError> {
    Ok(Json(controller.hover(query.x)?))
}

async fn kline_zoom(
    State(controller): State<DashboardController>,
    Json(transform): Json<ZoomTransform>,
) -> Result<Html<String>, DashboardError> {
    Ok(Html(controller.zoom(transform)?))
}

#[derive(Deserialize)]
struct ResizeRequest {
    width: f64,
    height: f64,
}

async fn kline_resize(
    State(controller): State<DashboardController>,
    Json(req): Json<ResizeRequest>,
) -> Result<Html<String>, DashboardError> {
    Ok(Html(controller.resize(Viewport::new(req.width, req.height))?))
}
