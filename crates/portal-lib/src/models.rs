//! Response shapes served by the portal
//!
//! Everything here is built fresh per request and serialized camelCase
//! to match what the dashboard clients consume. No record is cached or
//! mutated after it is returned.

use serde::{Deserialize, Serialize};

/// Application health as reported by ArgoCD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Progressing,
    Suspended,
    Missing,
    #[default]
    Unknown,
}

impl HealthStatus {
    /// Map an upstream status string, defaulting to `Unknown` for
    /// anything unrecognized or absent.
    pub fn parse(s: &str) -> Self {
        match s {
            "Healthy" => HealthStatus::Healthy,
            "Degraded" => HealthStatus::Degraded,
            "Progressing" => HealthStatus::Progressing,
            "Suspended" => HealthStatus::Suspended,
            "Missing" => HealthStatus::Missing,
            _ => HealthStatus::Unknown,
        }
    }
}

/// GitOps sync state as reported by ArgoCD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Synced,
    OutOfSync,
    #[default]
    Unknown,
}

impl SyncStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Synced" => SyncStatus::Synced,
            "OutOfSync" => SyncStatus::OutOfSync,
            _ => SyncStatus::Unknown,
        }
    }
}

/// Deploy target of an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub server: String,
    pub namespace: String,
}

/// One Kubernetes resource managed by an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub status: String,
    pub health: HealthStatus,
}

/// Read-only summary of one ArgoCD application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    pub path: String,
    pub target_revision: String,
    pub destination: Destination,
    pub health: HealthStatus,
    pub sync: SyncStatus,
    pub resources: Vec<ResourceSummary>,
}

/// Payload of the application-status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationList {
    pub applications: Vec<ApplicationSummary>,
    /// RFC 3339 capture time
    pub timestamp: String,
}

/// Aggregated resource usage for one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceUsage {
    pub namespace: String,
    /// Fractional cores
    pub cpu_usage: f64,
    /// Bytes
    pub memory_usage: f64,
    pub pod_count: u64,
    pub cpu_requests: f64,
    pub cpu_limits: f64,
    pub memory_requests: f64,
    pub memory_limits: f64,
}

impl NamespaceUsage {
    /// Zero-valued record for a namespace no query has populated yet.
    pub fn empty(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            cpu_usage: 0.0,
            memory_usage: 0.0,
            pod_count: 0,
            cpu_requests: 0.0,
            cpu_limits: 0.0,
            memory_requests: 0.0,
            memory_limits: 0.0,
        }
    }
}

/// Resource usage and phase of one pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodUsage {
    pub name: String,
    pub namespace: String,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub status: String,
}

impl PodUsage {
    pub fn empty(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            cpu_usage: 0.0,
            memory_usage: 0.0,
            status: "Unknown".to_string(),
        }
    }
}

/// Payload of the cluster-metrics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    pub total_cpu: f64,
    pub total_memory: f64,
    pub total_pods: u64,
    pub total_nodes: u64,
    pub namespaces: Vec<NamespaceUsage>,
    pub pods: Vec<PodUsage>,
}

/// The only failure payload shape the portal emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
