use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

use super::models::ErrorResponse;
use crate::commands::CommandError;
use crate::generics::ResolveError;
use crate::processors::ProcessorError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("payload invalid: {0}")]
    InvalidPayload(String),
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),
    #[error("request cancelled")]
    Cancelled,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            // Client went away; nginx's 499 has no StatusCode constant
            ApiError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::MissingHeader(_) => "MISSING_HEADER",
            ApiError::Cancelled => "CANCELLED",
            ApiError::Configuration(_) => "CONFIGURATION_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(json!(body))).into_response()
    }
}

impl From<ProcessorError> for ApiError {
    fn from(value: ProcessorError) -> Self {
        match value {
            ProcessorError::Cancelled => ApiError::Cancelled,
            ProcessorError::Failed(reason) => ApiError::Internal(reason),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(value: ResolveError) -> Self {
        ApiError::Configuration(value.to_string())
    }
}

impl From<CommandError> for ApiError {
    fn from(value: CommandError) -> Self {
        match value {
            CommandError::Cancelled => ApiError::Cancelled,
            CommandError::Rejected(reason) => ApiError::InvalidPayload(reason),
            CommandError::Resolve(err) => err.into(),
            CommandError::Unregistered(_) | CommandError::DuplicateDefinition(_) => {
                ApiError::Configuration(value.to_string())
            }
            CommandError::Handler(reason) => ApiError::Internal(reason),
        }
    }
}
