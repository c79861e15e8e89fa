use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, MediaError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    Validation {
        field: Option<String>,
        message: String,
    },

    Unauthorized(String),

    Database(String),

    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Validation { message, .. } => write!(f, "Validation error: {}", message),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Database(msg) => write!(f, "Database error: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, None, msg),
            ApiError::Validation { field, message } => (StatusCode::BAD_REQUEST, field, message),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, None, msg),
            ApiError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "A storage error occurred".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut body = ApiResponse::<()>::error(message);
        body.field = field;
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::AccountNotFound => ApiError::Unauthorized("Not signed in".to_string()),
            AuthError::Validation { field, message } => ApiError::Validation {
                field: Some(field.to_string()),
                message,
            },
            AuthError::Database(msg) => ApiError::Database(msg),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedExtension | MediaError::Decode | MediaError::Encode => {
                ApiError::Validation {
                    field: Some("image".to_string()),
                    message: err.to_string(),
                }
            }
            MediaError::Io(e) => ApiError::Internal(format!("Media write failed: {e}")),
            MediaError::Task(msg) => ApiError::Internal(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation {
            field: None,
            message: msg.into(),
        }
    }

    pub fn field_validation(field: &str, msg: impl Into<String>) -> Self {
        ApiError::Validation {
            field: Some(field.to_string()),
            message: msg.into(),
        }
    }

    pub fn database(msg: impl Into<String>) -> Self {
        ApiError::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }
}
