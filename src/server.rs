use std::{future::Future, path::Path, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Path as UrlPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de, Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::{config::ServerConfig, error::ScanError, registry::JobRegistry, types::JobSnapshot};

#[derive(Clone)]
pub struct AppState {
    registry: Arc<JobRegistry>,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default = "default_start_port", deserialize_with = "lenient_port")]
    pub start_port: i64,
    #[serde(default = "default_end_port", deserialize_with = "lenient_port")]
    pub end_port: i64,
}

/// Port numbers as sent by forms: integers, floats (truncated toward zero)
/// or decimal strings. Range checks happen later, in validation.
fn lenient_port<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Int(n) => Ok(n),
        PortValue::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
        PortValue::Float(f) => Err(de::Error::custom(format!("invalid port number: {f}"))),
        PortValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("invalid port number: {s:?}"))),
    }
}

fn default_start_port() -> i64 {
    1
}

fn default_end_port() -> i64 {
    1024
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScanStarted {
    pub scan_id: String,
    pub message: String,
    pub status: String, // always "started"
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Liveness {
    pub status: String,
    pub message: String,
    pub time: f64,
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = match &self {
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            ScanError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Build the HTTP surface: the JSON job API under `/api`, the `/test` liveness
/// probe, and the static UI from `ui_dir` for everything else.
pub fn router(registry: Arc<JobRegistry>, ui_dir: impl AsRef<Path>) -> Router {
    let api = Router::new()
        .route("/scan", post(post_scan))
        .route("/scan/{scan_id}/progress", get(get_progress))
        .with_state(AppState { registry });

    let static_svc = ServeDir::new(ui_dir).append_index_html_on_directories(true);

    Router::new()
        .nest("/api", api)
        .route("/test", get(liveness))
        .fallback_service(static_svc)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind, start the eviction sweeper and serve until `shutdown` resolves.
///
/// Outstanding runners are not awaited here; callers follow up with
/// [`JobRegistry::shutdown`].
pub async fn spawn_server(
    config: ServerConfig,
    registry: Arc<JobRegistry>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    registry.spawn_sweeper(config.retention, config.sweep_interval);

    let app = router(Arc::clone(&registry), &config.ui_dir);
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(addr = %listener.local_addr()?, ui_dir = %config.ui_dir.display(), "serving scan API");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;
    Ok(())
}

async fn post_scan(
    State(app): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanStarted>, ScanError> {
    let Json(req) = payload.map_err(|e| ScanError::InvalidBody(e.body_text()))?;
    let ip = req.ip.unwrap_or_default();

    let scan_id = match app.registry.start_scan(&ip, req.start_port, req.end_port).await {
        Ok(id) => id,
        Err(e) if e.is_validation() => return Err(e),
        Err(e) => {
            error!(error = %e, ip = %ip, "failed to start scan");
            return Err(e);
        }
    };

    Ok(Json(ScanStarted {
        scan_id,
        message: format!(
            "Started scanning {} from port {} to {}",
            ip.trim(),
            req.start_port,
            req.end_port
        ),
        status: "started".into(),
    }))
}

async fn get_progress(
    State(app): State<AppState>,
    UrlPath(scan_id): UrlPath<String>,
) -> Result<Json<JobSnapshot>, ScanError> {
    app.registry.get(&scan_id).await.map(Json)
}

async fn liveness() -> Json<Liveness> {
    let now = OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1e9;
    Json(Liveness {
        status: "working".into(),
        message: "Port scanner is running!".into(),
        time: now,
    })
}
