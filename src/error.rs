use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::ports::push::DeliveryError;

/// Startup configuration problems. These abort the process before it binds.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("VAPID keys are not configured; run `chat-push-relay init` to generate a pair")]
    MissingVapidKeys,
    #[error("VAPID configuration is incomplete: the {0} key is missing")]
    MissingVapidKey(&'static str),
    #[error("VAPID subject must not be empty")]
    MissingVapidSubject,
    #[error("VAPID private key is invalid: {0}")]
    InvalidVapidKey(String),
    #[error("VAPID public key does not belong to the private key")]
    VapidKeyMismatch,
    #[error("webhook signature verification requires a real chat API secret")]
    PlaceholderApiSecret,
    #[error("failed to initialize push client: {0}")]
    PushClient(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Errors surfaced by the HTTP handlers as `{success:false, error, details}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Gone { message: String, details: String },
    #[error("{message}")]
    Delivery {
        message: String,
        #[source]
        source: DeliveryError,
        status: StatusCode,
    },
    #[error("{0}")]
    Parse(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn delivery(msg: impl Into<String>, source: DeliveryError) -> Self {
        Self::Delivery {
            message: msg.into(),
            source,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn upstream(msg: impl Into<String>, source: DeliveryError) -> Self {
        Self::Delivery {
            message: msg.into(),
            source,
            status: StatusCode::BAD_GATEWAY,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gone { .. } => StatusCode::GONE,
            Self::Delivery { status, .. } => *status,
            Self::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Gone { details, .. } => Some(details.clone()),
            Self::Delivery { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, details = ?self.details(), "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
