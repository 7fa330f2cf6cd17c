//! Error taxonomy for upstream API access

use thiserror::Error;

/// Failures that can occur while talking to an upstream API.
///
/// Configuration errors are detected before any socket is opened;
/// everything else maps onto a generic client-facing failure with the
/// upstream status code propagated where one exists.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Bearer token required but not configured
    #[error("ArgoCD token not configured")]
    MissingToken,

    /// Upstream answered with a non-success HTTP status
    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    /// Transport-level failure (connect, timeout, TLS, body read)
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream body did not match the expected shape
    #[error("malformed upstream response: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// HTTP status to surface to the caller. Upstream status codes are
    /// propagated as-is; everything else is a 500.
    pub fn http_status(&self) -> u16 {
        match self {
            UpstreamError::Status { status } => *status,
            _ => 500,
        }
    }
}
