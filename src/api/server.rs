//! HTTP server for the REST API

use crate::api::handlers;
use crate::config::CorsOrigins;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the CORS layer for the configured origins
pub fn cors_layer(origins: &CorsOrigins) -> Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origins {
        CorsOrigins::Any => Ok(cors.allow_origin(Any)),
        CorsOrigins::List(list) => {
            let values = list
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin).map_err(|e| {
                        AppError::Config(format!("Invalid CORS origin {}: {}", origin, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(cors.allow_origin(values))
        }
    }
}

/// Build the router with all routes
pub fn build_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        // ================================================================
        // Health check
        // ================================================================
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::health_check))
        // ================================================================
        // Countries
        // ================================================================
        .route("/countries", get(handlers::list_countries))
        .route("/countries/refresh", post(handlers::refresh_countries))
        .route("/countries/image", get(handlers::get_summary_image))
        .route(
            "/countries/:name",
            get(handlers::get_country).delete(handlers::delete_country),
        )
        // ================================================================
        // Status
        // ================================================================
        .route("/status", get(handlers::get_status))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server manager
pub struct ApiServer {
    state: Arc<AppState>,
    cors: CorsLayer,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(state: Arc<AppState>, cors: CorsLayer) -> Self {
        Self {
            state,
            cors,
            shutdown_tx: None,
            task: None,
        }
    }

    /// Bind and start serving in the background, returns the bound address
    pub async fn start(&mut self, addr: SocketAddr) -> Result<SocketAddr> {
        let app = build_router(self.state.clone(), self.cors.clone());

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind to {}: {}", addr, e);
            AppError::Io(e)
        })?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        info!("Starting country exchange API server on {}", local_addr);

        self.task = Some(tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        }));

        info!("");
        info!("=== Endpoints ===");
        info!("  GET    http://{}/health", local_addr);
        info!("  POST   http://{}/countries/refresh", local_addr);
        info!("  GET    http://{}/countries", local_addr);
        info!("  GET    http://{}/countries/{{name}}", local_addr);
        info!("  DELETE http://{}/countries/{{name}}", local_addr);
        info!("  GET    http://{}/countries/image", local_addr);
        info!("  GET    http://{}/status", local_addr);

        Ok(local_addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
    }

    /// Stop and wait for in-flight requests to finish
    pub async fn shutdown(mut self) {
        self.stop();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("API server task failed: {}", e);
            }
        }
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{CountryResponse, StatsResponse};
    use crate::db::sqlite::models::CountryRecord;
    use crate::state::testing::{state_in, static_sources};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;

    fn seed(state: &AppState) {
        let record = |name: &str, population: i64, gdp: Option<f64>| CountryRecord {
            id: None,
            name: name.to_string(),
            capital: None,
            region: Some("europe".to_string()),
            population,
            currency_code: gdp.map(|_| "EUR".to_string()),
            exchange_rate: gdp.map(|_| 0.9),
            estimated_gdp: gdp,
            flag_url: None,
            last_refreshed_at: Utc::now(),
        };

        state
            .sqlite
            .merge_countries(
                &[
                    record("france", 67_000_000, Some(9.0e10)),
                    record("monaco", 39_000, None),
                    record("spain", 47_000_000, Some(7.0e10)),
                ],
                Utc::now(),
            )
            .unwrap();
    }

    fn router(state: Arc<AppState>) -> Router {
        build_router(state, cors_layer(&CorsOrigins::Any).unwrap())
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_list_sorted_by_gdp() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path(), static_sources(None, None));
        seed(&state);

        let (status, body) =
            send(router(state), Method::GET, "/countries?region=Europe&sort=gdp_desc").await;
        assert_eq!(status, StatusCode::OK);

        let countries: Vec<CountryResponse> = serde_json::from_slice(&body).unwrap();
        let names: Vec<_> = countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["france", "spain", "monaco"]);
        assert!(countries[2].estimated_gdp.is_none());
    }

    #[tokio::test]
    async fn test_get_and_delete_country() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path(), static_sources(None, None));
        seed(&state);

        let (status, body) = send(router(state.clone()), Method::GET, "/countries/FRANCE").await;
        assert_eq!(status, StatusCode::OK);
        let country: CountryResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(country.name, "france");

        let (status, body) = send(router(state.clone()), Method::DELETE, "/countries/France").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, body) = send(router(state.clone()), Method::DELETE, "/countries/france").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["code"], "NOT_FOUND");

        let (status, _) = send(router(state), Method::GET, "/countries/atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_and_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path(), static_sources(None, None));

        let (status, body) = send(router(state.clone()), Method::GET, "/status").await;
        assert_eq!(status, StatusCode::OK);
        let stats: StatsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats.total_countries, 0);
        assert!(stats.last_refreshed_at.is_none());

        let (status, _) = send(router(state), Method::GET, "/countries/image").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_upstream_failure_is_503() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path(), static_sources(None, Some(r#"{"rates":{"EUR":0.9}}"#)));

        let (status, body) = send(router(state), Method::POST, "/countries/refresh").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["code"], "UPSTREAM_UNAVAILABLE");
        assert_eq!(error["details"], serde_json::json!(["countries"]));
    }

    #[tokio::test]
    async fn test_image_served_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path(), static_sources(None, None));
        state.summary.save(b"<svg/>", None).unwrap();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/countries/image")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    }

    #[test]
    fn test_cors_layer_rejects_bad_origin() {
        let origins = CorsOrigins::List(vec!["http://ok.example".to_string(), "bad\norigin".to_string()]);
        assert!(matches!(cors_layer(&origins), Err(AppError::Config(_))));
    }
}
