use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notes_core::Resource;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },
    #[error("Email already exists")]
    EmailExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    TokenInvalid(String),
    #[error("Token expired")]
    TokenExpired,
    #[error("{message}")]
    NotFound {
        code: &'static str,
        message: String,
    },
    #[error("File too large")]
    FileTooLarge,
    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::TokenInvalid(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn not_found(resource: Resource) -> Self {
        let code = match resource {
            Resource::User => "USER_NOT_FOUND",
            Resource::Note => "NOTE_NOT_FOUND",
            Resource::Category => "CATEGORY_NOT_FOUND",
            Resource::Attachment => "ATTACHMENT_NOT_FOUND",
        };
        Self::NotFound {
            code,
            message: format!("{resource} not found"),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::EmailExists | Self::FileTooLarge => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials | Self::TokenInvalid(_) | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::EmailExists => "EMAIL_EXISTS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenInvalid(_) => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::NotFound { code, .. } => *code,
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<notes_core::Error> for AppError {
    fn from(error: notes_core::Error) -> Self {
        match error {
            notes_core::Error::NotFound(resource, _) => Self::not_found(resource),
            notes_core::Error::InvalidInput(message) => Self::validation(message),
            notes_core::Error::DuplicateEmail => Self::EmailExists,
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        Self::validation("Invalid request")
    }
}

impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::FileTooLarge
        } else {
            Self::validation(format!("Invalid multipart body: {}", error.body_text()))
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(format!("Storage error: {error}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let (error, details) = match self {
            Self::Internal(cause) => {
                tracing::error!(%cause, "Request failed with internal error");
                ("Internal server error".to_string(), None)
            }
            Self::Validation { message, details } => (message, details),
            other => (other.to_string(), None),
        };
        let body = ErrorBody {
            success: false,
            error,
            code,
            details,
        };
        (status, Json(body)).into_response()
    }
}
