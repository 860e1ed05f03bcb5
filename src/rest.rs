//! HTTP REST API.
//!
//! One read-only operation: `GET /scrape?url=...` returns the
//! normalized `{title, qualities}` object. Errors map to distinct
//! statuses with a human-readable `detail` message. `GET /health`
//! reports engine state for orchestrators.

use crate::dispatch::Extractor;
use crate::error::ExtractError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<Extractor>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/scrape", get(scrape))
        .layer(cors)
        .with_state(state)
}

/// Serve the REST API on the given port until the listener dies.
pub async fn start(port: u16, state: Arc<Extractor>) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct ScrapeParams {
    /// The URL of the media page to scrape.
    url: String,
}

async fn scrape(
    State(state): State<Arc<Extractor>>,
    Query(params): Query<ScrapeParams>,
) -> Response {
    match state.handle(&params.url).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            warn!("scrape failed for {}: {e}", params.url);
            error_response(&e)
        }
    }
}

/// Map an [`ExtractError`] to its status code and a FastAPI-style
/// `{"detail": ...}` body, which the original bot clients expect.
fn error_response(e: &ExtractError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(serde_json::json!({ "detail": e.to_string() }))).into_response()
}

async fn health(State(state): State<Arc<Extractor>>) -> Json<serde_json::Value> {
    let (engine_running, active_sessions) = state.engine_status().await;
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "engine_running": engine_running,
        "active_sessions": active_sessions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn serve_ephemeral() -> String {
        let state = Arc::new(Extractor::new());
        let app = router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_health_reports_engine_not_running() {
        let base = serve_ephemeral().await;
        let body: serde_json::Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["engine_running"], false);
        assert_eq!(body["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_unsupported_site_maps_to_404_with_host_in_detail() {
        let base = serve_ephemeral().await;
        let resp = reqwest::get(format!(
            "{base}/scrape?url=https://www.example.com/video/1"
        ))
        .await
        .unwrap();
        assert_eq!(resp.status().as_u16(), 404);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("example.com"));
    }

    #[tokio::test]
    async fn test_malformed_url_maps_to_400() {
        let base = serve_ephemeral().await;
        let resp = reqwest::get(format!("{base}/scrape?url=not-a-url"))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_missing_url_param_is_rejected() {
        let base = serve_ephemeral().await;
        let resp = reqwest::get(format!("{base}/scrape")).await.unwrap();
        assert!(resp.status().is_client_error());
    }
}
