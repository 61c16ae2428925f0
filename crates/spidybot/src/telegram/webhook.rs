//! HTTP server for the Telegram webhook plus health and metrics routes
//!
//! Endpoints:
//! - `POST <WEBHOOK_URL path>` - Telegram updates (teloxide's router)
//! - `GET /` - service banner (JSON)
//! - `GET /health` - liveness check with uptime (JSON)
//! - `GET /metrics` - Prometheus metrics in text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{axum_to_router, Options};
use teloxide::update_listeners::UpdateListener;
use tokio::net::TcpListener;
use url::Url;

use spidycore::core::metrics;

/// Application state for the status routes
#[derive(Clone)]
struct AppState {
    start_time: Instant,
}

/// Routes served next to the webhook: `/`, `/health`, `/metrics`
pub fn status_router() -> Router {
    let state = AppState {
        start_time: Instant::now(),
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(state))
}

/// Registers the webhook with Telegram and starts the HTTP server.
///
/// Returns the update listener to hand to the dispatcher. The server stops
/// when the listener is stopped (Ctrl+C through the dispatcher).
pub async fn start_webhook(
    bot: Bot,
    url: Url,
    port: u16,
    secret: Option<String>,
) -> anyhow::Result<impl UpdateListener<Err = Infallible>> {
    if url.path() == "/" {
        anyhow::bail!("WEBHOOK_URL needs a path (e.g. /telegram_webhook), `/` is reserved for the status route");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let mut options = Options::new(addr, url.clone());
    if let Some(secret) = secret {
        options = options.secret_token(secret);
    }

    let (listener, stop_flag, webhook_router) = axum_to_router(bot, options).await?;
    let app = webhook_router.merge(status_router());

    log::info!("Starting webhook server on http://{}", addr);
    log::info!("  {} - Telegram updates", url.path());
    log::info!("  /health  - Health check (liveness)");
    log::info!("  /metrics - Prometheus metrics");

    let tcp = TcpListener::bind(addr).await?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
            log::error!("Webhook server error: {}", e);
        }
    });

    Ok(listener)
}

/// Serves only the status routes (polling mode).
pub async fn serve_status(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    log::info!("Starting status server on http://{}", addr);
    axum::serve(listener, status_router()).await?;
    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Telegram Bot Backend is running. Updates are received on the configured webhook path."
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health_status = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "service": "spidybot",
        "version": env!("CARGO_PKG_VERSION"),
    });

    (StatusCode::OK, Json(health_status))
}

async fn metrics_handler() -> Response {
    match metrics::render() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_body(path: &str) -> (StatusCode, String) {
        let response = status_router()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_route() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json["message"].as_str().unwrap().contains("running"));
    }

    #[tokio::test]
    async fn test_health_route() {
        let (status, body) = get_body("/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "spidybot");
    }

    #[tokio::test]
    async fn test_metrics_route() {
        metrics::init_metrics();
        let (status, body) = get_body("/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("spidybot_requests_total"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = get_body("/telegram_webhook").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
