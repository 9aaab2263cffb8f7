use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::protocol::{ErrorResponse, GenerateRequest, GenerateResponse, HealthResponse};
use crate::relay::{RelayClient, RelayError};

/// Shared application state.
pub struct AppState {
    pub relay: RelayClient,
}

/// Health check handler. Only reachable once configuration has resolved.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Generate handler: relays one prompt to the configured provider.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(_) => {
            return write_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "body must be JSON with a string \"prompt\" field",
            );
        }
    };

    // Rejected locally; no upstream call is made for an empty prompt.
    if request.prompt.is_empty() {
        return write_error(StatusCode::UNPROCESSABLE_ENTITY, "prompt must not be empty");
    }

    match state.relay.generate(&request.prompt).await {
        Ok(text) => Json(GenerateResponse { response: text }).into_response(),
        Err(RelayError::Timeout(_)) => write_error(StatusCode::BAD_GATEWAY, "upstream timeout"),
        Err(RelayError::Transport(_)) => {
            write_error(StatusCode::BAD_GATEWAY, "upstream unavailable")
        }
        Err(RelayError::UpstreamStatus(status)) => write_error(
            StatusCode::BAD_GATEWAY,
            &format!("upstream returned status {}", status.as_u16()),
        ),
        Err(RelayError::MalformedResponse(_)) => {
            write_error(StatusCode::BAD_GATEWAY, "unexpected upstream response")
        }
        Err(RelayError::BuildRequest(_)) => {
            write_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

fn write_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
