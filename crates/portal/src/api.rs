//! HTTP API: the two dashboard endpoints plus health and metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use portal_lib::{
    aggregate,
    argocd::{summarize, ArgoApi},
    health::{components, ComponentStatus, HealthRegistry},
    prom::PromApi,
    stub, ApplicationList, ErrorBody, PortalMetrics, UpstreamError,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state. Upstreams are trait objects so tests can
/// drop in fakes.
#[derive(Clone)]
pub struct AppState {
    pub argo: Arc<dyn ArgoApi>,
    /// `None` means development stub mode: no backend is ever queried.
    pub prom: Option<Arc<dyn PromApi>>,
    pub health_registry: HealthRegistry,
    pub metrics: PortalMetrics,
    /// Fall back to the baseline snapshot when the query battery fails
    pub dev_mode: bool,
}

fn error_response(status: u16, message: impl Into<String>) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(ErrorBody::new(message))).into_response()
}

/// GET /api/argocd/applications — the read-only ArgoCD status relay
async fn argocd_applications(State(state): State<Arc<AppState>>) -> Response {
    state.metrics.inc_request("argocd_applications");
    let started = Instant::now();

    match state.argo.list_applications().await {
        Ok(raw) => {
            state
                .metrics
                .observe_upstream("argocd", started.elapsed().as_secs_f64());
            state.health_registry.set_healthy(components::ARGOCD).await;

            let applications = raw.into_iter().map(summarize).collect();
            let list = ApplicationList {
                applications,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            };
            (StatusCode::OK, Json(list)).into_response()
        }
        Err(err) => {
            error!(error = %err, "ArgoCD relay failed");
            state.metrics.inc_upstream_error("argocd");
            state
                .health_registry
                .set_degraded(components::ARGOCD, err.to_string())
                .await;

            let message = match &err {
                UpstreamError::MissingToken => "ArgoCD token not configured".to_string(),
                UpstreamError::Status { status } => format!("ArgoCD API error: {status}"),
                _ => "Failed to fetch ArgoCD applications".to_string(),
            };
            error_response(err.http_status(), message)
        }
    }
}

/// GET /api/cluster/metrics — the Prometheus aggregation relay
async fn cluster_metrics(State(state): State<Arc<AppState>>) -> Response {
    state.metrics.inc_request("cluster_metrics");

    let Some(prom) = &state.prom else {
        // Development stub mode: nothing to query.
        info!("Serving synthetic cluster snapshot");
        state.metrics.inc_stub_response();
        return (StatusCode::OK, Json(stub::jittered())).into_response();
    };

    let started = Instant::now();
    match aggregate::collect_snapshot(prom.as_ref()).await {
        Ok(snapshot) => {
            state
                .metrics
                .observe_upstream("prometheus", started.elapsed().as_secs_f64());
            state
                .health_registry
                .set_healthy(components::PROMETHEUS)
                .await;
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        Err(err) => {
            error!(error = %err, "Metrics aggregation failed");
            state.metrics.inc_upstream_error("prometheus");
            state
                .health_registry
                .set_degraded(components::PROMETHEUS, err.to_string())
                .await;

            if state.dev_mode {
                info!("Falling back to the baseline snapshot");
                state.metrics.inc_stub_response();
                return (StatusCode::OK, Json(stub::baseline())).into_response();
            }
            error_response(500, "Failed to fetch metrics")
        }
    }
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint (the portal's own metrics)
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return error_response(500, "metrics encoding failed");
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/argocd/applications", get(argocd_applications))
        .route("/api/cluster/metrics", get(cluster_metrics))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use portal_lib::argocd::RawApplication;
    use portal_lib::prom::{queries, Sample};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct FakeArgo {
        response: Box<dyn Fn() -> Result<Vec<RawApplication>, UpstreamError> + Send + Sync>,
        calls: AtomicUsize,
    }

    impl FakeArgo {
        fn ok(items: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                response: Box::new(move || Ok(serde_json::from_value(items.clone()).unwrap())),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(make: impl Fn() -> UpstreamError + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                response: Box::new(move || Err(make())),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ArgoApi for FakeArgo {
        async fn list_applications(&self) -> Result<Vec<RawApplication>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.response)()
        }
    }

    /// Answers the query battery from a fixed table; unknown queries
    /// return an empty result like a real Prometheus with no matches.
    struct FakeProm {
        table: HashMap<&'static str, Vec<Sample>>,
        fail: bool,
    }

    #[async_trait]
    impl PromApi for FakeProm {
        async fn instant_query(&self, query: &str) -> Result<Vec<Sample>, UpstreamError> {
            if self.fail {
                return Err(UpstreamError::Status { status: 503 });
            }
            Ok(self.table.get(query).cloned().unwrap_or_default())
        }
    }

    fn sample(labels: &[(&str, &str)], value: f64) -> Sample {
        Sample {
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value,
        }
    }

    fn test_state(argo: Arc<FakeArgo>, prom: Option<Arc<dyn PromApi>>, dev_mode: bool) -> Arc<AppState> {
        let health_registry = HealthRegistry::new();
        Arc::new(AppState {
            argo,
            prom,
            health_registry,
            metrics: PortalMetrics::new(),
            dev_mode,
        })
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn missing_token_maps_to_500_with_config_error() {
        let argo = FakeArgo::failing(|| UpstreamError::MissingToken);
        let state = test_state(argo.clone(), None, false);
        let (status, body) = get(create_router(state), "/api/argocd/applications").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "ArgoCD token not configured");
        assert_eq!(argo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_upstream_yields_empty_list_and_timestamp() {
        let argo = FakeArgo::ok(json!([]));
        let state = test_state(argo, None, false);
        let (status, body) = get(create_router(state), "/api/argocd/applications").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applications"], json!([]));
        assert!(body["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn upstream_status_code_is_propagated() {
        let argo = FakeArgo::failing(|| UpstreamError::Status { status: 502 });
        let state = test_state(argo, None, false);
        let (status, body) = get(create_router(state), "/api/argocd/applications").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "ArgoCD API error: 502");
    }

    #[tokio::test]
    async fn applications_are_reduced_to_the_summary_shape() {
        let argo = FakeArgo::ok(json!([{
            "metadata": {"name": "portfolio", "namespace": "argocd"},
            "spec": {
                "source": {"repoURL": "https://example.com/r.git", "targetRevision": "HEAD"},
                "destination": {"server": "in-cluster", "namespace": "portfolio"}
            },
            "status": {"sync": {"status": "Synced"}}
        }]));
        let state = test_state(argo, None, false);
        let (status, body) = get(create_router(state), "/api/argocd/applications").await;

        assert_eq!(status, StatusCode::OK);
        let app = &body["applications"][0];
        assert_eq!(app["name"], "portfolio");
        assert_eq!(app["health"], "Unknown");
        assert_eq!(app["sync"], "Synced");
        assert_eq!(app["resources"], json!([]));
    }

    #[tokio::test]
    async fn disjoint_query_results_merge_with_zero_defaults() {
        let mut table = HashMap::new();
        table.insert(queries::TOTAL_PODS, vec![sample(&[], 2.0)]);
        table.insert(
            queries::NAMESPACE_CPU,
            vec![sample(&[("namespace", "ns-a")], 0.25)],
        );
        table.insert(
            queries::NAMESPACE_MEMORY,
            vec![sample(&[("namespace", "ns-b")], 1024.0)],
        );
        let prom: Arc<dyn PromApi> = Arc::new(FakeProm { table, fail: false });

        let state = test_state(FakeArgo::ok(json!([])), Some(prom), false);
        let (status, body) = get(create_router(state), "/api/cluster/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalPods"], 2);
        let namespaces = body["namespaces"].as_array().unwrap();
        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[0]["namespace"], "ns-a");
        assert_eq!(namespaces[0]["memoryUsage"], 0.0);
        assert_eq!(namespaces[1]["namespace"], "ns-b");
        assert_eq!(namespaces[1]["cpuUsage"], 0.0);
    }

    #[tokio::test]
    async fn identical_fixtures_produce_identical_snapshots() {
        let mut table = HashMap::new();
        table.insert(
            queries::POD_CPU,
            vec![
                sample(&[("namespace", "web"), ("pod", "web-0")], 0.01),
                sample(&[("namespace", "web"), ("pod", "web-1")], 0.02),
            ],
        );
        table.insert(
            queries::POD_STATUS,
            vec![sample(&[("namespace", "web"), ("pod", "web-0"), ("phase", "Running")], 1.0)],
        );
        let prom: Arc<dyn PromApi> = Arc::new(FakeProm { table, fail: false });
        let state = test_state(FakeArgo::ok(json!([])), Some(prom), false);
        let router = create_router(state);

        let (_, first) = get(router.clone(), "/api/cluster/metrics").await;
        let (_, second) = get(router, "/api/cluster/metrics").await;
        assert_eq!(first, second);
        assert_eq!(first["pods"][0]["status"], "Running");
        assert_eq!(first["pods"][1]["status"], "Unknown");
    }

    #[tokio::test]
    async fn stub_mode_serves_synthetic_snapshot() {
        let state = test_state(FakeArgo::ok(json!([])), None, true);
        let (status, body) = get(create_router(state), "/api/cluster/metrics").await;

        assert_eq!(status, StatusCode::OK);
        // Counts are never jittered
        assert_eq!(body["totalPods"], 28);
        assert_eq!(body["totalNodes"], 1);
        assert_eq!(body["namespaces"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn dev_mode_falls_back_to_baseline_on_failure() {
        let prom: Arc<dyn PromApi> = Arc::new(FakeProm {
            table: HashMap::new(),
            fail: true,
        });
        let state = test_state(FakeArgo::ok(json!([])), Some(prom), true);
        let (status, body) = get(create_router(state), "/api/cluster/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCpu"], 0.252);
        assert_eq!(body["totalPods"], 28);
    }

    #[tokio::test]
    async fn production_failure_is_a_generic_500() {
        let prom: Arc<dyn PromApi> = Arc::new(FakeProm {
            table: HashMap::new(),
            fail: true,
        });
        let state = test_state(FakeArgo::ok(json!([])), Some(prom), false);
        let (status, body) = get(create_router(state), "/api/cluster/metrics").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch metrics");
    }

    #[tokio::test]
    async fn healthz_reflects_upstream_degradation() {
        let argo = FakeArgo::failing(|| UpstreamError::Status { status: 502 });
        let state = test_state(argo, None, false);
        state.health_registry.register(components::ARGOCD).await;
        let router = create_router(state);

        let (_, _) = get(router.clone(), "/api/argocd/applications").await;
        let (status, body) = get(router, "/healthz").await;

        // Degraded upstream still means the portal itself is serving
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn readyz_follows_registry_state() {
        let state = test_state(FakeArgo::ok(json!([])), None, false);
        let router = create_router(state.clone());

        let (status, _) = get(router.clone(), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        state.health_registry.set_ready(true).await;
        let (status, body) = get(router, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_portal_counters() {
        let state = test_state(FakeArgo::ok(json!([])), None, true);
        let router = create_router(state);

        let _ = get(router.clone(), "/api/cluster/metrics").await;
        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("portal_requests_total"));
        assert!(text.contains("portal_stub_responses_total"));
    }
}
