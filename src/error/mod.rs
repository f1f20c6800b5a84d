use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON payload of every non-2xx response: `{error, message?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// `{error}` only.
    pub fn bare(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    /// `{error, message}`.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.error, message),
            None => write!(f, "{}", self.error),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // http
    #[error("Param error: {0}")]
    ParamError(ErrorBody),
    #[error("Missing request body")]
    BodyMissing,
    #[error("Invalid request body")]
    BodyInvalid,
    #[error("Not found: {0}")]
    NotFound(ErrorBody),
    #[error("Origin not allowed")]
    Forbidden,
    #[error("JSON parse error: {0}")]
    ParseError(#[from] serde_json::error::Error),
    #[error("HTTP general error")]
    HttpError(#[from] http::Error),
    #[error("HTTP server error: {0}")]
    ServerError(#[from] hyper::Error),
    // webhook
    #[error("Signature validation error: {0}")]
    SignatureValidationError(String),
    // storage
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),
    #[error("Database pool error: {0}")]
    PoolError(#[from] diesel::r2d2::PoolError),
    #[error("Query task failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    // configuration
    #[error("Config error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[error("{0} not found")]
    ConfigMissing(String),
    #[error("Parameter store error: {0}")]
    SecretStoreError(String),
}

impl Error {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Error::ParamError(_) => StatusCode::BAD_REQUEST,
            Error::BodyMissing => StatusCode::BAD_REQUEST,
            Error::BodyInvalid => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::ParseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::HttpError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::SignatureValidationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PoolError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::JoinError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::ConfigMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::SecretStoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fatal errors escape the handler instead of becoming a response.
    /// The adapter in front of the handler decides how to surface them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigError(_) | Error::ConfigMissing(_) | Error::SecretStoreError(_)
        )
    }

    /// Raw message of the underlying failure, without our own prefix.
    pub fn upstream_message(&self) -> String {
        match self {
            Error::DatabaseError(e) => e.to_string(),
            Error::PoolError(e) => e.to_string(),
            Error::ParseError(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}
