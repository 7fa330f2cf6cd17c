//! Merging partial query results into one cluster snapshot
//!
//! Each Prometheus query contributes one field to the per-namespace and
//! per-pod records. The merge is a last-write-wins overlay onto
//! zero-initialized defaults: a key seen by any query appears exactly
//! once in the output, with fields the other queries never mentioned
//! left at zero. Everything in this module is pure; the only I/O happens
//! behind the [`PromApi`] trait in [`collect_snapshot`].

use crate::error::UpstreamError;
use crate::models::{ClusterSnapshot, NamespaceUsage, PodUsage};
use crate::prom::{queries, PromApi, Sample};
use std::collections::HashMap;
use std::hash::Hash;

/// Per-namespace query results, one entry per query in the battery.
#[derive(Debug, Default)]
pub struct NamespaceSeries {
    pub cpu: Vec<Sample>,
    pub memory: Vec<Sample>,
    pub pod_count: Vec<Sample>,
    pub cpu_requests: Vec<Sample>,
    pub cpu_limits: Vec<Sample>,
    pub memory_requests: Vec<Sample>,
    pub memory_limits: Vec<Sample>,
}

/// Per-pod query results.
#[derive(Debug, Default)]
pub struct PodSeries {
    pub cpu: Vec<Sample>,
    pub memory: Vec<Sample>,
    pub phase: Vec<Sample>,
}

/// Scalar of the first series in a result, or zero when the query
/// matched nothing.
pub fn first_value(samples: &[Sample]) -> f64 {
    samples.first().map(|s| s.value).unwrap_or(0.0)
}

/// Overlay one query's samples onto the merged map. Records are created
/// on first sight from `default_of`; `apply` writes this query's field.
fn overlay<K, R>(
    map: &mut HashMap<K, R>,
    samples: &[Sample],
    key_of: impl Fn(&Sample) -> Option<K>,
    default_of: impl Fn(&Sample) -> R,
    apply: impl Fn(&mut R, f64),
) where
    K: Eq + Hash,
{
    for sample in samples {
        let Some(key) = key_of(sample) else { continue };
        let record = map.entry(key).or_insert_with(|| default_of(sample));
        apply(record, sample.value);
    }
}

fn namespace_key(sample: &Sample) -> Option<String> {
    sample.label("namespace").map(str::to_string)
}

fn pod_key(sample: &Sample) -> Option<(String, String)> {
    let namespace = sample.label("namespace")?;
    let pod = sample.label("pod")?;
    Some((namespace.to_string(), pod.to_string()))
}

/// Merge the per-namespace battery, keyed by the `namespace` label.
/// Output is sorted by namespace so identical inputs produce identical
/// responses.
pub fn merge_namespaces(series: &NamespaceSeries) -> Vec<NamespaceUsage> {
    let mut map: HashMap<String, NamespaceUsage> = HashMap::new();
    let default_of = |s: &Sample| NamespaceUsage::empty(s.label("namespace").unwrap_or_default());

    overlay(&mut map, &series.cpu, namespace_key, default_of, |r, v| {
        r.cpu_usage = v
    });
    overlay(&mut map, &series.memory, namespace_key, default_of, |r, v| {
        r.memory_usage = v
    });
    overlay(&mut map, &series.pod_count, namespace_key, default_of, |r, v| {
        r.pod_count = v as u64
    });
    overlay(&mut map, &series.cpu_requests, namespace_key, default_of, |r, v| {
        r.cpu_requests = v
    });
    overlay(&mut map, &series.cpu_limits, namespace_key, default_of, |r, v| {
        r.cpu_limits = v
    });
    overlay(&mut map, &series.memory_requests, namespace_key, default_of, |r, v| {
        r.memory_requests = v
    });
    overlay(&mut map, &series.memory_limits, namespace_key, default_of, |r, v| {
        r.memory_limits = v
    });

    let mut merged: Vec<_> = map.into_values().collect();
    merged.sort_by(|a, b| a.namespace.cmp(&b.namespace));
    merged
}

/// Merge the per-pod battery, keyed by `(namespace, pod)`. Phase rows
/// carry a 0/1 indicator per phase; only the row whose value is 1 sets
/// the pod's status, and only for pods the CPU or memory queries already
/// produced. Output is sorted by key.
pub fn merge_pods(series: &PodSeries) -> Vec<PodUsage> {
    let mut map: HashMap<(String, String), PodUsage> = HashMap::new();
    let default_of = |s: &Sample| {
        PodUsage::empty(
            s.label("pod").unwrap_or_default(),
            s.label("namespace").unwrap_or_default(),
        )
    };

    overlay(&mut map, &series.cpu, pod_key, default_of, |r, v| {
        r.cpu_usage = v
    });
    overlay(&mut map, &series.memory, pod_key, default_of, |r, v| {
        r.memory_usage = v
    });

    for sample in &series.phase {
        if sample.value != 1.0 {
            continue;
        }
        let Some(key) = pod_key(sample) else { continue };
        let Some(phase) = sample.label("phase") else { continue };
        // Pods with only phase data are not reported.
        if let Some(record) = map.get_mut(&key) {
            record.status = phase.to_string();
        }
    }

    let mut merged: Vec<_> = map.into_values().collect();
    merged.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
    merged
}

/// Issue the full query battery concurrently and merge the results.
/// Any single query failure fails the whole snapshot; there is no
/// partial-result degradation and no retry.
pub async fn collect_snapshot(prom: &dyn PromApi) -> Result<ClusterSnapshot, UpstreamError> {
    let (
        total_cpu,
        total_memory,
        total_pods,
        total_nodes,
        ns_cpu,
        ns_memory,
        ns_pod_count,
        ns_cpu_requests,
        ns_cpu_limits,
        ns_memory_requests,
        ns_memory_limits,
        pod_cpu,
        pod_memory,
        pod_phase,
    ) = futures_util::try_join!(
        prom.instant_query(queries::TOTAL_CPU),
        prom.instant_query(queries::TOTAL_MEMORY),
        prom.instant_query(queries::TOTAL_PODS),
        prom.instant_query(queries::TOTAL_NODES),
        prom.instant_query(queries::NAMESPACE_CPU),
        prom.instant_query(queries::NAMESPACE_MEMORY),
        prom.instant_query(queries::NAMESPACE_POD_COUNT),
        prom.instant_query(queries::NAMESPACE_CPU_REQUESTS),
        prom.instant_query(queries::NAMESPACE_CPU_LIMITS),
        prom.instant_query(queries::NAMESPACE_MEMORY_REQUESTS),
        prom.instant_query(queries::NAMESPACE_MEMORY_LIMITS),
        prom.instant_query(queries::POD_CPU),
        prom.instant_query(queries::POD_MEMORY),
        prom.instant_query(queries::POD_STATUS),
    )?;

    let namespaces = merge_namespaces(&NamespaceSeries {
        cpu: ns_cpu,
        memory: ns_memory,
        pod_count: ns_pod_count,
        cpu_requests: ns_cpu_requests,
        cpu_limits: ns_cpu_limits,
        memory_requests: ns_memory_requests,
        memory_limits: ns_memory_limits,
    });

    let pods = merge_pods(&PodSeries {
        cpu: pod_cpu,
        memory: pod_memory,
        phase: pod_phase,
    });

    Ok(ClusterSnapshot {
        total_cpu: first_value(&total_cpu),
        total_memory: first_value(&total_memory),
        total_pods: first_value(&total_pods) as u64,
        total_nodes: first_value(&total_nodes) as u64,
        namespaces,
        pods,
    })
}
