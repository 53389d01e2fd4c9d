//! Application error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// One or more upstream sources failed to fetch or decode
    #[error("External data source unavailable: {}", .0.join(", "))]
    Upstream(Vec<String>),

    #[error("{source_id} responded with status {status}")]
    UpstreamStatus { source_id: String, status: u16 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error class
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Upstream(_) | AppError::UpstreamStatus { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Serializable error envelope returned to API callers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        // Only the error class crosses the boundary, never the raw internal text.
        let (code, message, details) = match err {
            AppError::Upstream(sources) => (
                "UPSTREAM_UNAVAILABLE",
                "External data source unavailable".to_string(),
                Some(sources.clone()),
            ),
            AppError::UpstreamStatus { source_id, .. } => (
                "UPSTREAM_UNAVAILABLE",
                "External data source unavailable".to_string(),
                Some(vec![source_id.clone()]),
            ),
            AppError::NotFound(what) => ("NOT_FOUND", format!("{} not found", what), None),
            _ => ("INTERNAL_ERROR", "Internal server error".to_string(), None),
        };

        ErrorResponse {
            code: code.to_string(),
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
