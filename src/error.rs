//! Unified error types for the document store and its HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Top-level error type for the server binary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key does not match `YYYY-MM-DD`.
    #[error("invalid date key {key:?}: expected YYYY-MM-DD")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// No document is stored under the key.
    #[error("no document stored for {key}")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// The stored file is not valid JSON.
    #[error("stored document {key} is not valid json: {source}")]
    Corrupt {
        /// The key whose document failed to parse.
        key: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a document for storage failed.
    #[error("failed to serialize document: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Underlying file system failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed key or unparsable stored document.
    Format,
    /// No document for the key.
    NotFound,
    /// Any other file system failure.
    Io,
}

impl StoreError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidKey { .. } | StoreError::Corrupt { .. } => ErrorKind::Format,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Serialize(_) | StoreError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Client-facing error. Carries only a generic message.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 400 Bad Request.
    #[error("{0}")]
    BadRequest(&'static str),

    /// 404 Not Found.
    #[error("Not found")]
    NotFound,

    /// 500 Internal Server Error.
    #[error("{0}")]
    Internal(&'static str),

    /// Body rejected by the extractor (malformed or oversized).
    #[error("{message}")]
    Rejected {
        /// Status chosen by the extractor.
        status: StatusCode,
        /// Generic message.
        message: &'static str,
    },
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Generic description.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
