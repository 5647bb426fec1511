//! WDS proxy routes
//!
//! Stateless relays for browser clients: each route accepts a JSON POST,
//! forwards the body verbatim to one fixed WDS endpoint, and passes the
//! upstream status and body back. Preflight requests are answered by the
//! permissive CORS layer; any other non-POST method gets a 405 envelope.

use crate::config::Config;
use crate::error::Result;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Shared state for the proxy routes
pub struct ProxyState {
    client: Client,
    vector_data_url: Url,
    series_info_url: Url,
    cube_metadata_url: Url,
}

impl ProxyState {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(crate::error::AppError::from)?;

        Ok(Self {
            client,
            vector_data_url: config.wds_endpoint("getDataFromVectorsAndLatestNPeriods")?,
            series_info_url: config.wds_endpoint("getSeriesInfoFromVector")?,
            cube_metadata_url: config.wds_endpoint("getCubeMetadata")?,
        })
    }
}

/// Router for the three proxy routes
pub fn proxy_router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route(
            "/proxy/vector-data",
            post(forward_vector_data).fallback(method_not_allowed),
        )
        .route(
            "/proxy/series-info",
            post(forward_series_info).fallback(method_not_allowed),
        )
        .route(
            "/proxy/cube-metadata",
            post(forward_cube_metadata).fallback(method_not_allowed),
        )
        .with_state(state)
}

async fn forward_vector_data(
    State(state): State<Arc<ProxyState>>,
    Json(payload): Json<Value>,
) -> Response {
    forward(&state, state.vector_data_url.clone(), payload).await
}

async fn forward_series_info(
    State(state): State<Arc<ProxyState>>,
    Json(payload): Json<Value>,
) -> Response {
    forward(&state, state.series_info_url.clone(), payload).await
}

async fn forward_cube_metadata(
    State(state): State<Arc<ProxyState>>,
    Json(payload): Json<Value>,
) -> Response {
    forward(&state, state.cube_metadata_url.clone(), payload).await
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

/// Forward one payload to one upstream URL: exactly one upstream call, the
/// upstream status/body relayed on success, an error envelope otherwise.
async fn forward(state: &ProxyState, url: Url, payload: Value) -> Response {
    debug!("Forwarding request to {}", url);

    let upstream = state
        .client
        .post(url.clone())
        .header("Accept", "application/json")
        .json(&payload)
        .send()
        .await;

    let response = match upstream {
        Ok(response) => response,
        Err(e) => {
            error!("Upstream request to {} failed: {}", url, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "details": e.to_string(),
                })),
            )
                .into_response();
        }
    };

    let status = response.status();
    if !status.is_success() {
        error!("Upstream {} returned {}", url, status);
        let relayed =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (
            relayed,
            Json(json!({
                "error": format!(
                    "Statistics Canada API returned {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown error")
                ),
            })),
        )
            .into_response();
    }

    match response.json::<Value>().await {
        Ok(body) => (
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::OK),
            Json(body),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to read upstream body from {}: {}", url, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn router() -> Router {
        proxy_router(Arc::new(ProxyState::new(&test_config()).unwrap()))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn get_is_method_not_allowed() {
        let response = router()
            .oneshot(
                Request::get("/proxy/vector-data")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn every_route_rejects_non_post() {
        for path in ["/proxy/vector-data", "/proxy/series-info", "/proxy/cube-metadata"] {
            let response = router()
                .oneshot(
                    Request::builder()
                        .method(Method::PUT)
                        .uri(path)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", path);
        }
    }

    /// Serve a stub upstream on an ephemeral port
    async fn spawn_upstream(app: Router) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn router_against(addr: std::net::SocketAddr) -> Router {
        let mut config = test_config();
        config.wds_base_url = Url::parse(&format!("http://{}", addr)).unwrap();
        proxy_router(Arc::new(ProxyState::new(&config).unwrap()))
    }

    #[tokio::test]
    async fn upstream_failure_status_is_relayed_with_envelope() {
        let upstream = Router::new().route(
            "/getDataFromVectorsAndLatestNPeriods",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let addr = spawn_upstream(upstream).await;

        let response = router_against(addr)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/proxy/vector-data")
                    .header("content-type", "application/json")
                    .body(Body::from("[]"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["error"],
            "Statistics Canada API returned 503: Service Unavailable"
        );
    }

    #[tokio::test]
    async fn upstream_success_body_passes_through_unchanged() {
        // the stub echoes the payload it received, proving the body is
        // forwarded verbatim in both directions
        let upstream = Router::new().route(
            "/getSeriesInfoFromVector",
            post(|Json(payload): Json<Value>| async move {
                Json(json!([{ "status": "SUCCESS", "object": { "received": payload } }]))
            }),
        );
        let addr = spawn_upstream(upstream).await;

        let response = router_against(addr)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/proxy/series-info")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"[{"vectorId":"41690973"}]"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["status"], "SUCCESS");
        assert_eq!(
            body[0]["object"]["received"],
            json!([{ "vectorId": "41690973" }])
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_internal_error_with_details() {
        // nothing is listening on this port
        let addr: std::net::SocketAddr = "127.0.0.1:1".parse().unwrap();
        let response = router_against(addr)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/proxy/cube-metadata")
                    .header("content-type", "application/json")
                    .body(Body::from("[]"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/proxy/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
