use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for the webhook receiver
///
/// Caller faults (`Configuration`, `Authentication`, `Validation`) all map to
/// `400 Bad Request` with a short reason. Infrastructure faults map to `500`
/// and never expose their detail to the client.
#[derive(Debug, thiserror::Error)]
pub enum HookguardError {
    /// The deployment is missing required configuration (e.g. the signing secret)
    #[error("Server misconfigured: {0}")]
    Configuration(String),

    /// Missing, malformed, stale or forged signature
    #[error("{0}")]
    Authentication(String),

    /// Authentic payload that does not match the event schema
    #[error("{0}")]
    Validation(String),

    /// The event store could not complete an operation
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// JSON body returned for every rejected request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl HookguardError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration(_) | Self::Authentication(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Storage(_) | Self::Internal(_) | Self::Anyhow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns true when the error was caused by the caller rather than the deployment
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Validation(_))
    }

    /// Message that is safe to send to the client.
    ///
    /// Server errors are replaced by a generic message; the full error is
    /// only written to the server log.
    fn safe_message(&self) -> String {
        match self {
            Self::Configuration(_) | Self::Authentication(_) | Self::Validation(_) => {
                self.to_string()
            }
            Self::Storage(_) => "Storage error".to_string(),
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for HookguardError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Authentication(_) | Self::Validation(_) => {
                tracing::warn!(status = status.as_u16(), error = %self, "Webhook rejected");
            }
            _ => {
                tracing::error!(status = status.as_u16(), error = %self, "Request failed");
            }
        }

        let body = Json(ErrorResponse {
            error: self.safe_message(),
        });

        (status, body).into_response()
    }
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, HookguardError>;

impl From<sea_orm::DbErr> for HookguardError {
    fn from(err: sea_orm::DbErr) -> Self {
        HookguardError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for HookguardError {
    fn from(err: std::io::Error) -> Self {
        HookguardError::Internal(format!("I/O error: {}", err))
    }
}
