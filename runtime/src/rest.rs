// Copyright 2026 Brand Audit Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API.
//!
//! Every endpoint answers with a `success` flag plus either its payload or
//! an `error` string. Batch progress is also streamed as Server-Sent Events.

use crate::acquisition::url_norm::normalize;
use crate::export::{self, ExportFormat};
use crate::orchestrator::Orchestrator;
use crate::progress::ProgressSender;
use crate::renderer::BrowserLauncher;
use crate::snapshot::capture_elements;
use crate::types::{parse_url_list, AuditRequest, AuditResult, Screenshot};
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

/// State shared by all handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub launcher: Arc<dyn BrowserLauncher>,
    pub progress: ProgressSender,
    pub analyzer_name: String,
    pub started_at: Instant,
}

impl AppState {
    /// Wire `orchestrator` to broadcast on `progress`.
    pub fn new(
        orchestrator: Orchestrator,
        launcher: Arc<dyn BrowserLauncher>,
        progress: ProgressSender,
        analyzer_name: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator: orchestrator.with_progress(progress.clone()),
            launcher,
            progress,
            analyzer_name: analyzer_name.into(),
            started_at: Instant::now(),
        }
    }
}

/// JSON body extractor whose rejection keeps the `{success, error}` shape.
struct ApiJson<T>(T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(error_response(rejection.status(), rejection.body_text())),
        }
    }
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "success": false, "error": error.into() })),
    )
        .into_response()
}

/// Build the axum Router with all REST endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/events", get(events_sse))
        .route("/api/v1/audit", post(handle_audit))
        .route("/api/v1/audit/url", post(handle_audit_url))
        .route("/api/v1/discover", post(handle_discover))
        .route("/api/v1/screenshots", post(handle_screenshots))
        .route("/api/v1/export", post(handle_export))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `127.0.0.1:port` until the future is dropped.
pub async fn start(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Serve the API on an already-bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    tracing::info!("REST API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ── Wire types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBody {
    #[serde(default)]
    pub guideline_text: String,
    /// Newline- or comma-separated.
    #[serde(default)]
    pub urls: String,
    #[serde(default)]
    pub auto_discover: bool,
    /// Lets a client subscribe to `/api/v1/events` before submitting.
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<AuditResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub logs: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleBody {
    #[serde(default)]
    pub guideline_text: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleResponse {
    pub success: bool,
    pub result: AuditResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverBody {
    #[serde(default)]
    pub start_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub success: bool,
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotBody {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub selectors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotResponse {
    pub success: bool,
    pub screenshots: Vec<Screenshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Handlers ────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "analyzer": state.analyzer_name,
        "uptimeSeconds": state.started_at.elapsed().as_secs_f64(),
    }))
}

#[derive(Deserialize, Default)]
struct EventsParams {
    request_id: Option<String>,
}

/// Stream progress events, optionally only those of one batch.
async fn events_sse(
    Query(params): Query<EventsParams>,
    State(state): State<Arc<AppState>>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.progress.subscribe();
    let filter = params.request_id;

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(ref id) = filter {
                        if &event.request_id != id {
                            continue;
                        }
                    }
                    if let Ok(json) = serde_json::to_string(&event) {
                        yield Ok(Event::default().data(json));
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn handle_audit(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<BatchBody>,
) -> (StatusCode, Json<BatchResponse>) {
    let request = AuditRequest::new(body.guideline_text, parse_url_list(&body.urls))
        .with_auto_discover(body.auto_discover);
    let request_id = body
        .request_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("audit-{}", uuid::Uuid::new_v4().simple()));

    match state.orchestrator.run_with_id(&request, &request_id).await {
        Ok(run) => (
            StatusCode::OK,
            Json(BatchResponse {
                success: true,
                request_id: Some(run.request_id),
                results: Some(run.results),
                error: None,
                logs: run.logs,
            }),
        ),
        Err(e) => {
            let status = if e.is_batch_fatal() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(BatchResponse {
                    success: false,
                    request_id: Some(request_id),
                    results: None,
                    error: Some(e.to_string()),
                    logs: vec![format!("Audit rejected: {e}")],
                }),
            )
        }
    }
}

async fn handle_audit_url(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SingleBody>,
) -> Json<SingleResponse> {
    let result = state
        .orchestrator
        .audit_url(&body.guideline_text, &body.url)
        .await;
    Json(SingleResponse {
        success: result.is_success(),
        error: result.error_message.clone(),
        result,
    })
}

async fn handle_discover(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<DiscoverBody>,
) -> Json<DiscoverResponse> {
    match state.orchestrator.discover(&body.start_url).await {
        Ok(links) => Json(DiscoverResponse {
            success: true,
            links,
            error: None,
        }),
        Err(e) => Json(DiscoverResponse {
            success: false,
            links: Vec::new(),
            error: Some(e.to_string()),
        }),
    }
}

async fn handle_screenshots(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ScreenshotBody>,
) -> Json<ScreenshotResponse> {
    let failed = |e: crate::error::AuditError| {
        Json(ScreenshotResponse {
            success: false,
            screenshots: Vec::new(),
            error: Some(e.to_string()),
        })
    };

    let url = match normalize(&body.url) {
        Ok(u) => u,
        Err(e) => return failed(e),
    };
    let opts = state.orchestrator.capture_options();
    match capture_elements(state.launcher.as_ref(), &url, &body.selectors, opts).await {
        Ok(screenshots) => Json(ScreenshotResponse {
            success: true,
            screenshots,
            error: None,
        }),
        Err(e) => failed(e),
    }
}

#[derive(Deserialize)]
struct ExportParams {
    format: Option<String>,
}

/// Render a posted result array as CSV, JSON or Markdown.
async fn handle_export(
    Query(params): Query<ExportParams>,
    ApiJson(results): ApiJson<Vec<AuditResult>>,
) -> Response {
    let format = match params.format.as_deref().unwrap_or("json").parse::<ExportFormat>() {
        Ok(f) => f,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    match export::render(&results, format) {
        Ok(body) => {
            let disposition = format!(
                "attachment; filename=\"brand-audit.{}\"",
                format.extension()
            );
            (
                [
                    (header::CONTENT_TYPE, format.content_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")),
    }
}
