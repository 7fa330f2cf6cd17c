//! Cluster metrics views

use anyhow::Result;
use portal_lib::ClusterSnapshot;
use serde::Serialize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_phase, format_bytes, format_cpu, print_table, OutputFormat};

const METRICS_PATH: &str = "/api/cluster/metrics";

#[derive(Serialize, Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Pods")]
    pods: u64,
    #[tabled(rename = "CPU Req")]
    cpu_requests: String,
    #[tabled(rename = "CPU Lim")]
    cpu_limits: String,
    #[tabled(rename = "Mem Req")]
    memory_requests: String,
    #[tabled(rename = "Mem Lim")]
    memory_limits: String,
}

#[derive(Serialize, Tabled)]
struct PodRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Serialize, Tabled)]
struct SummaryRow {
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Pods")]
    pods: u64,
    #[tabled(rename = "Nodes")]
    nodes: u64,
}

/// Show cluster-wide totals
pub async fn summary(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let snapshot: ClusterSnapshot = client.get(METRICS_PATH).await?;

    let rows = vec![SummaryRow {
        cpu: format_cpu(snapshot.total_cpu),
        memory: format_bytes(snapshot.total_memory),
        pods: snapshot.total_pods,
        nodes: snapshot.total_nodes,
    }];

    print_table(&rows, format);
    Ok(())
}

/// Show per-namespace usage
pub async fn namespaces(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let snapshot: ClusterSnapshot = client.get(METRICS_PATH).await?;

    let rows: Vec<NamespaceRow> = snapshot
        .namespaces
        .iter()
        .map(|ns| NamespaceRow {
            namespace: ns.namespace.clone(),
            cpu: format_cpu(ns.cpu_usage),
            memory: format_bytes(ns.memory_usage),
            pods: ns.pod_count,
            cpu_requests: format_cpu(ns.cpu_requests),
            cpu_limits: format_cpu(ns.cpu_limits),
            memory_requests: format_bytes(ns.memory_requests),
            memory_limits: format_bytes(ns.memory_limits),
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}

/// Show per-pod usage
pub async fn pods(client: &ApiClient, format: OutputFormat, namespace: Option<String>) -> Result<()> {
    let snapshot: ClusterSnapshot = client.get(METRICS_PATH).await?;

    let rows: Vec<PodRow> = snapshot
        .pods
        .iter()
        .filter(|p| namespace.as_deref().map_or(true, |ns| p.namespace == ns))
        .map(|p| PodRow {
            name: p.name.clone(),
            namespace: p.namespace.clone(),
            cpu: format_cpu(p.cpu_usage),
            memory: format_bytes(p.memory_usage),
            status: color_phase(&p.status),
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}
