//! Cluster Portal - read-only dashboard backend
//!
//! Relays ArgoCD application status and aggregated Prometheus cluster
//! metrics to the dashboard frontends. Stateless: every request is a
//! fresh pass-through of upstream state.

use anyhow::{Context, Result};
use portal_lib::{
    argocd::ArgoClient,
    health::{components, HealthRegistry},
    prom::{PromApi, PromClient},
    PortalMetrics,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting cluster-portal");

    let config = config::PortalConfig::load()?;
    info!(
        argocd_url = %config.argocd_url,
        dev_mode = config.dev_mode,
        stub_metrics = config.use_stub_metrics(),
        "Portal configured"
    );

    let ca_cert_pem = match &config.argocd_ca_cert {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("Failed to read CA certificate {path}"))?,
        ),
        None => None,
    };
    let argo = ArgoClient::new(
        &config.argocd_url,
        config.argocd_token.clone(),
        ca_cert_pem.as_deref(),
    )?;

    let prom: Option<Arc<dyn PromApi>> = if config.use_stub_metrics() {
        None
    } else {
        Some(Arc::new(PromClient::new(config.effective_prometheus_url())?))
    };

    let health_registry = HealthRegistry::new();
    health_registry.register(components::ARGOCD).await;
    health_registry.register(components::PROMETHEUS).await;

    let metrics = PortalMetrics::new();

    let app_state = Arc::new(api::AppState {
        argo: Arc::new(argo),
        prom,
        health_registry: health_registry.clone(),
        metrics,
        dev_mode: config.dev_mode,
    });

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    api_handle.abort();

    Ok(())
}
