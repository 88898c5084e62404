//! API error responses
//!
//! Every failure leaves the server as `{ "error": { "code", "message" } }`
//! with a matching status. Internal details are logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::BackendError;

/// Error body returned to dashboard clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// 401 Unauthorized
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    /// 401 with a distinct code so the dashboard can sign the user out
    pub fn token_expired() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "token_expired",
            "Your session has expired. Please sign in again.",
        )
    }

    /// 403 Forbidden
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// 502 Bad Gateway
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "bad_gateway", message)
    }

    /// 503 Service Unavailable
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.body })),
        )
            .into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized => {
                Self::unauthorized("The data service rejected your session")
            }
            BackendError::NotFound => Self::not_found("Resource not found"),
            BackendError::Status { status, body } => {
                tracing::error!(status = status, body = %body, "Backend returned an error");
                if (400..500).contains(&status) {
                    Self::bad_request("The data service rejected the request")
                } else {
                    Self::bad_gateway("The data service failed to handle the request")
                }
            }
            BackendError::Transport(e) => {
                tracing::error!(error = %e, "Backend unreachable");
                Self::service_unavailable("The data service is unavailable")
            }
            BackendError::Decode(e) => {
                tracing::error!(error = %e, "Backend returned an unreadable response");
                Self::bad_gateway("The data service returned an unexpected response")
            }
        }
    }
}
