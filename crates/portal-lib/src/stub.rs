//! Synthetic cluster snapshot for development
//!
//! Serves the dashboards something to render when no Prometheus backend
//! is reachable. [`jittered`] perturbs cpu by ±20% and memory by ±10%,
//! independently per record, so repeated polls look live; counts and
//! pod phases are never touched. This is a development stub, not a
//! fallback policy.

use crate::models::{ClusterSnapshot, NamespaceUsage, PodUsage};
use rand::Rng;

const MIB: f64 = 1024.0 * 1024.0;

fn namespace(
    name: &str,
    cpu: f64,
    memory_mib: f64,
    pods: u64,
    cpu_req: f64,
    cpu_lim: f64,
    mem_req_mib: f64,
    mem_lim_mib: f64,
) -> NamespaceUsage {
    NamespaceUsage {
        namespace: name.to_string(),
        cpu_usage: cpu,
        memory_usage: memory_mib * MIB,
        pod_count: pods,
        cpu_requests: cpu_req,
        cpu_limits: cpu_lim,
        memory_requests: mem_req_mib * MIB,
        memory_limits: mem_lim_mib * MIB,
    }
}

fn pod(name: &str, ns: &str, cpu: f64, memory_mib: f64) -> PodUsage {
    PodUsage {
        name: name.to_string(),
        namespace: ns.to_string(),
        cpu_usage: cpu,
        memory_usage: memory_mib * MIB,
        status: "Running".to_string(),
    }
}

/// The fixed baseline snapshot: a plausible small single-node cluster.
pub fn baseline() -> ClusterSnapshot {
    ClusterSnapshot {
        total_cpu: 0.252,
        total_memory: 1228.0 * MIB,
        total_pods: 28,
        total_nodes: 1,
        namespaces: vec![
            namespace("argocd", 0.042, 256.0, 5, 0.25, 0.5, 256.0, 512.0),
            namespace("blog", 0.018, 128.0, 3, 0.1, 0.2, 128.0, 256.0),
            namespace("portfolio", 0.015, 96.0, 1, 0.05, 0.15, 100.0, 200.0),
            namespace("todo", 0.021, 112.0, 2, 0.1, 0.2, 128.0, 256.0),
            namespace("monitoring", 0.089, 384.0, 3, 0.2, 0.6, 384.0, 768.0),
            namespace("ingress-nginx", 0.011, 64.0, 1, 0.1, 0.2, 90.0, 180.0),
            namespace("kube-system", 0.056, 192.0, 13, 0.25, 0.5, 256.0, 512.0),
        ],
        pods: vec![
            pod("argocd-server-7b9f8c8d4f-x7k2m", "argocd", 0.015, 128.0),
            pod("argocd-repo-server-6d8f7b9c5d-p4n8k", "argocd", 0.012, 96.0),
            pod("prometheus-server-7c8b9d5f4d-m9k7j", "monitoring", 0.045, 256.0),
            pod("grafana-6f5d8b9c7a-h5m3n", "monitoring", 0.022, 80.0),
            pod("blog-app-5d7f9c8b4a-x2j9k", "blog", 0.008, 64.0),
            pod("portfolio-app-4c6d8b7a5f-p7k2m", "portfolio", 0.015, 96.0),
            pod("todo-app-3b5c7d6a4e-m4j8n", "todo", 0.011, 56.0),
            pod("ingress-nginx-controller-7f8d9c5b4a-x9k6m", "ingress-nginx", 0.011, 64.0),
            pod("coredns-5d78c9db5f-j8k7m", "kube-system", 0.003, 24.0),
            pod("metrics-server-6d94bc8694-p9k3n", "kube-system", 0.008, 32.0),
        ],
    }
}

/// Baseline with per-record jitter applied to cpu and memory usage.
pub fn jittered() -> ClusterSnapshot {
    let mut rng = rand::thread_rng();
    let mut snapshot = baseline();

    snapshot.total_cpu *= rng.gen_range(0.8..1.2);
    snapshot.total_memory *= rng.gen_range(0.9..1.1);

    for ns in &mut snapshot.namespaces {
        ns.cpu_usage *= rng.gen_range(0.8..1.2);
        ns.memory_usage *= rng.gen_range(0.9..1.1);
    }
    for p in &mut snapshot.pods {
        p.cpu_usage *= rng.gen_range(0.8..1.2);
        p.memory_usage *= rng.gen_range(0.9..1.1);
    }

    snapshot
}
