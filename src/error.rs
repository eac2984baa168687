use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    /// Message sent to the client. Storage and crypto detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Auth(AuthError::Storage(_))
            | AppError::Auth(AuthError::Crypto(_))
            | AppError::Config(_)
            | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Auth(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.public_message()
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(e) => match e {
                AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
                AuthError::AlreadyExists => StatusCode::CONFLICT,
                AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
                AuthError::Revoked => StatusCode::UNAUTHORIZED,
                AuthError::Expired => StatusCode::UNAUTHORIZED,
                AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure kinds returned by the auth service.
///
/// `Unauthorized` deliberately covers unknown users, wrong passwords and
/// unparseable or forged tokens alike.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email format")]
    InvalidEmail,

    #[error("User already exists")]
    AlreadyExists,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token expired")]
    Expired,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Duplicate record")]
    AlreadyExists,

    #[error("Record not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => AuthError::AlreadyExists,
            StoreError::NotFound => AuthError::Unauthorized,
            StoreError::Storage(msg) => AuthError::Storage(msg),
        }
    }
}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Malformed(_) | CodecError::BadSignature => AuthError::Unauthorized,
            CodecError::Signing(msg) => AuthError::Crypto(msg),
        }
    }
}
