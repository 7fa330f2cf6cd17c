//! Prometheus instant-query client
//!
//! Thin wrapper over `GET /api/v1/query`. Each query returns a flat list
//! of label-set/value pairs; everything heavier (rate windows, grouping)
//! lives in the query text itself.

use crate::error::UpstreamError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// The fixed query battery issued on every metrics poll. Label filters
/// exclude the pause container and empty namespaces, matching what the
/// dashboards expect from cAdvisor and kube-state-metrics.
pub mod queries {
    pub const TOTAL_CPU: &str = r#"sum(rate(container_cpu_usage_seconds_total{namespace!="",container!="POD",container!=""}[5m]))"#;
    pub const TOTAL_MEMORY: &str =
        r#"sum(container_memory_usage_bytes{namespace!="",container!="POD",container!=""})"#;
    pub const TOTAL_PODS: &str = "count(kube_pod_info)";
    pub const TOTAL_NODES: &str = "count(kube_node_info)";

    pub const NAMESPACE_CPU: &str = r#"sum(rate(container_cpu_usage_seconds_total{namespace!="",container!="POD",container!=""}[5m])) by (namespace)"#;
    pub const NAMESPACE_MEMORY: &str = r#"sum(container_memory_usage_bytes{namespace!="",container!="POD",container!=""}) by (namespace)"#;
    pub const NAMESPACE_POD_COUNT: &str = "count(kube_pod_info) by (namespace)";
    pub const NAMESPACE_CPU_REQUESTS: &str = r#"sum(kube_pod_container_resource_requests{resource="cpu",namespace!=""}) by (namespace)"#;
    pub const NAMESPACE_CPU_LIMITS: &str = r#"sum(kube_pod_container_resource_limits{resource="cpu",namespace!=""}) by (namespace)"#;
    pub const NAMESPACE_MEMORY_REQUESTS: &str = r#"sum(kube_pod_container_resource_requests{resource="memory",namespace!=""}) by (namespace)"#;
    pub const NAMESPACE_MEMORY_LIMITS: &str = r#"sum(kube_pod_container_resource_limits{resource="memory",namespace!=""}) by (namespace)"#;

    pub const POD_CPU: &str = r#"sum(rate(container_cpu_usage_seconds_total{namespace!="",container!="POD",container!="",pod!=""}[5m])) by (pod,namespace)"#;
    pub const POD_MEMORY: &str = r#"sum(container_memory_usage_bytes{namespace!="",container!="POD",container!="",pod!=""}) by (pod,namespace)"#;
    pub const POD_STATUS: &str = r#"kube_pod_status_phase{namespace!=""}"#;
}

/// One series from an instant query: its label set and scalar value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: HashMap<String, String>,
    pub value: f64,
}

impl Sample {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// Seam for the Prometheus upstream.
#[async_trait]
pub trait PromApi: Send + Sync {
    async fn instant_query(&self, query: &str) -> Result<Vec<Sample>, UpstreamError>;
}

// Wire shape of /api/v1/query: data.result[].{metric, value:[ts, "num"]}
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    metric: HashMap<String, String>,
    value: (f64, String),
}

fn into_samples(response: QueryResponse) -> Result<Vec<Sample>, UpstreamError> {
    let result = response.data.map(|d| d.result).unwrap_or_default();
    result
        .into_iter()
        .map(|series| {
            let value = series
                .value
                .1
                .parse::<f64>()
                .map_err(|_| UpstreamError::Parse(format!("non-numeric sample value {:?}", series.value.1)))?;
            Ok(Sample {
                labels: series.metric,
                value,
            })
        })
        .collect()
}

/// reqwest-backed Prometheus client. The metrics backend is assumed to
/// be reachable only from a trusted network, so no authentication is
/// applied here.
pub struct PromClient {
    client: Client,
    base_url: Url,
}

impl PromClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        let base_url = Url::parse(base_url).context("Invalid Prometheus URL")?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl PromApi for PromClient {
    async fn instant_query(&self, query: &str) -> Result<Vec<Sample>, UpstreamError> {
        let url = self
            .base_url
            .join("/api/v1/query")
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        let response = self.client.get(url).query(&[("query", query)]).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, query, "Prometheus query error");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: QueryResponse = response.json().await?;
        into_samples(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn parse_body(body: &str) -> Result<Vec<Sample>, UpstreamError> {
        into_samples(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn parses_instant_query_result() {
        let samples = parse_body(
            r#"{"status":"success","data":{"resultType":"vector","result":[
                {"metric":{"namespace":"argocd"},"value":[1714000000.123,"0.042"]},
                {"metric":{"namespace":"monitoring"},"value":[1714000000.123,"0.089"]}
            ]}}"#,
        )
        .unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label("namespace"), Some("argocd"));
        assert_eq!(samples[0].value, 0.042);
        assert_eq!(samples[1].value, 0.089);
    }

    #[test]
    fn missing_data_section_yields_empty_result() {
        let samples = parse_body(r#"{"status":"success"}"#).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn non_numeric_value_is_a_parse_error() {
        let err = parse_body(
            r#"{"data":{"result":[{"metric":{},"value":[1714000000,"not-a-number"]}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, UpstreamError::Parse(_)));
    }

    #[tokio::test]
    async fn query_is_sent_url_encoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/query")
            .match_query(Matcher::UrlEncoded(
                "query".into(),
                queries::TOTAL_PODS.into(),
            ))
            .with_status(200)
            .with_body(r#"{"status":"success","data":{"result":[{"metric":{},"value":[1714000000,"28"]}]}}"#)
            .create_async()
            .await;

        let client = PromClient::new(&server.url()).unwrap();
        let samples = client.instant_query(queries::TOTAL_PODS).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 28.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn backend_error_status_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = PromClient::new(&server.url()).unwrap();
        let err = client.instant_query(queries::TOTAL_CPU).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 503 }));
    }
}
