use serde::{Deserialize, Serialize};

/// Inbound generation request.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// Successful generation response.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Error response returned by the API.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
