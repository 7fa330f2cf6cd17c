//! Portal library: upstream relays and metrics aggregation
//!
//! This crate provides the core functionality for:
//! - The read-only ArgoCD application relay
//! - The Prometheus instant-query battery and snapshot merge
//! - The development-mode synthetic snapshot
//! - Health checks and observability

pub mod aggregate;
pub mod argocd;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod prom;
pub mod stub;

pub use error::UpstreamError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::PortalMetrics;
