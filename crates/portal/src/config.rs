//! Portal configuration

use anyhow::Result;
use serde::Deserialize;

const DEFAULT_PROMETHEUS_URL: &str = "http://prometheus.monitoring.svc.cluster.local:9090";

/// Portal configuration, read from `PORTAL_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// ArgoCD server base URL
    #[serde(default = "default_argocd_url")]
    pub argocd_url: String,

    /// ArgoCD bearer token; empty means unconfigured
    #[serde(default)]
    pub argocd_token: String,

    /// Optional CA certificate (PEM path) for the ArgoCD TLS endpoint
    #[serde(default)]
    pub argocd_ca_cert: Option<String>,

    /// Prometheus base URL; unset falls back to the in-cluster default,
    /// or to the synthetic snapshot in development mode
    #[serde(default)]
    pub prometheus_url: Option<String>,

    /// Development mode: serve the synthetic snapshot when no
    /// Prometheus URL is configured, and fall back to it on failure
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_api_port() -> u16 {
    8080
}

fn default_argocd_url() -> String {
    "https://argocd-server.argocd.svc.cluster.local".to_string()
}

impl PortalConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PORTAL"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| PortalConfig {
            api_port: default_api_port(),
            argocd_url: default_argocd_url(),
            argocd_token: String::new(),
            argocd_ca_cert: None,
            prometheus_url: None,
            dev_mode: false,
        }))
    }

    /// Whether the metrics endpoint should serve the synthetic snapshot
    /// instead of querying a backend.
    pub fn use_stub_metrics(&self) -> bool {
        self.dev_mode && self.prometheus_url.is_none()
    }

    /// The Prometheus URL to query when not in stub mode.
    pub fn effective_prometheus_url(&self) -> &str {
        self.prometheus_url
            .as_deref()
            .unwrap_or(DEFAULT_PROMETHEUS_URL)
    }
}
