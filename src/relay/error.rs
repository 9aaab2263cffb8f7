use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a single relay attempt. Display output is safe to log; the
/// API key and upstream response bodies are never captured in a variant.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to build upstream request: {0}")]
    BuildRequest(#[source] reqwest::Error),

    #[error("upstream request timed out after {0}s")]
    Timeout(u64),

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("upstream returned status {0}")]
    UpstreamStatus(StatusCode),

    #[error("unexpected upstream response: {0}")]
    MalformedResponse(String),
}
