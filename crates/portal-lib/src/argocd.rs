//! Read-only relay for the ArgoCD application API
//!
//! One authenticated GET against `/api/v1/applications`, reduced to the
//! summary shape in [`crate::models`]. No caching, no retries: every
//! invocation is a fresh pass-through of the upstream state.

use crate::error::UpstreamError;
use crate::models::{ApplicationSummary, Destination, HealthStatus, ResourceSummary, SyncStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Upstream application-list wire shape, kept only as long as it takes
/// to reduce it to an [`ApplicationSummary`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawApplication {
    pub metadata: RawMetadata,
    pub spec: RawSpec,
    #[serde(default)]
    pub status: RawAppStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMetadata {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSpec {
    pub source: RawSource,
    pub destination: Destination,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSource {
    #[serde(rename = "repoURL", default)]
    pub repo_url: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(rename = "targetRevision", default)]
    pub target_revision: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAppStatus {
    #[serde(default)]
    pub health: Option<RawStatusRef>,
    #[serde(default)]
    pub sync: Option<RawStatusRef>,
    #[serde(default)]
    pub resources: Option<Vec<RawResource>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStatusRef {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawResource {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub health: Option<RawStatusRef>,
}

#[derive(Debug, Deserialize)]
struct AppListResponse {
    // ArgoCD serializes an empty project as `"items": null`
    #[serde(default)]
    items: Option<Vec<RawApplication>>,
}

fn status_of(field: &Option<RawStatusRef>) -> Option<&str> {
    field.as_ref().and_then(|f| f.status.as_deref())
}

/// Reduce one upstream application to the read-only summary shape.
/// Missing health/sync fields become `Unknown`, a missing source path
/// becomes the empty string, missing resources become an empty list.
pub fn summarize(app: RawApplication) -> ApplicationSummary {
    let health = status_of(&app.status.health)
        .map(HealthStatus::parse)
        .unwrap_or_default();
    let sync = status_of(&app.status.sync)
        .map(SyncStatus::parse)
        .unwrap_or_default();

    let resources = app
        .status
        .resources
        .unwrap_or_default()
        .into_iter()
        .map(|r| {
            let health = status_of(&r.health)
                .map(HealthStatus::parse)
                .unwrap_or_default();
            ResourceSummary {
                kind: r.kind,
                name: r.name,
                namespace: r.namespace,
                status: r.status,
                health,
            }
        })
        .collect();

    ApplicationSummary {
        name: app.metadata.name,
        namespace: app.metadata.namespace,
        repo_url: app.spec.source.repo_url,
        path: app.spec.source.path.unwrap_or_default(),
        target_revision: app.spec.source.target_revision,
        destination: app.spec.destination,
        health,
        sync,
        resources,
    }
}

/// Seam for the ArgoCD upstream, so handlers can be tested against a
/// fake without a server.
#[async_trait]
pub trait ArgoApi: Send + Sync {
    async fn list_applications(&self) -> Result<Vec<RawApplication>, UpstreamError>;
}

/// reqwest-backed ArgoCD client.
pub struct ArgoClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl ArgoClient {
    /// Build a client for the given server. When `ca_cert_pem` is set the
    /// certificate is added as a trusted root; otherwise the default
    /// rustls roots apply.
    pub fn new(base_url: &str, token: impl Into<String>, ca_cert_pem: Option<&[u8]>) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(30));
        if let Some(pem) = ca_cert_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .context("Invalid ArgoCD CA certificate")?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder.build().context("Failed to create HTTP client")?;
        let base_url = Url::parse(base_url).context("Invalid ArgoCD URL")?;

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }
}

#[async_trait]
impl ArgoApi for ArgoClient {
    async fn list_applications(&self) -> Result<Vec<RawApplication>, UpstreamError> {
        // Configuration error: refuse before touching the network.
        if self.token.is_empty() {
            return Err(UpstreamError::MissingToken);
        }

        let url = self
            .base_url
            .join("/api/v1/applications")
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Upstream internals stay in the log, not in the client response.
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "ArgoCD API error");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let list: AppListResponse = response.json().await?;
        Ok(list.items.unwrap_or_default())
    }
}
