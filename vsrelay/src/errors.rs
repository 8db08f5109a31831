use crate::api::models::vector_store_files::ValidationError;
use crate::openai::{AttachError, UploadError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid form data, or a request the upstream API rejected as invalid
    #[error("{message}")]
    BadRequest { message: String },

    /// Uploaded file exceeds the configured size limit
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Upstream API answered with a status that is passed through to the caller
    #[error("Upstream responded with {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// The attach call failed without an upstream status to pass through
    #[error("Error updating vector store: {0}")]
    VectorStoreUpdate(AttachError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Human-readable description of the failure
    pub detail: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Upstream { status, .. } => *status,
            Error::Internal { .. } | Error::VectorStoreUpdate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `detail` string returned to the caller.
    ///
    /// Upstream failures are surfaced with their original text so callers can act on them.
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } | Error::PayloadTooLarge { message } | Error::Upstream { message, .. } => message.clone(),
            Error::Internal { .. } | Error::VectorStoreUpdate(_) => self.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Internal { .. } | Error::VectorStoreUpdate(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Upstream { .. } => {
                tracing::warn!("Upstream error: {}", self);
            }
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = ErrorDetail {
            detail: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::BadRequest { message: err.to_string() }
    }
}

impl From<UploadError> for Error {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidRequest { message, .. } => Error::BadRequest {
                message: format!("Invalid request to OpenAI: {message}"),
            },
            other => Error::Internal {
                operation: format!("upload file to OpenAI: {other}"),
            },
        }
    }
}

impl From<AttachError> for Error {
    fn from(err: AttachError) -> Self {
        match err {
            AttachError::Status { status, body } => Error::Upstream { status, message: body },
            other => Error::VectorStoreUpdate(other),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
