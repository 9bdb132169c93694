use std::io;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures of the file-backed menu store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read menu file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write menu file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("menu file {} is malformed: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode menu: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("entry id {0} is already on the menu")]
    DuplicateId(String),
}

impl StoreError {
    /// True when the failure happened while loading the current menu.
    pub fn is_read_failure(&self) -> bool {
        matches!(self, StoreError::Read { .. } | StoreError::Decode { .. })
    }
}

/// Errors returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request body")]
    InvalidBody,

    #[error("Dish and Who are required")]
    MissingFields,

    #[error("ID is required")]
    MissingId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidBody | ApiError::MissingFields | ApiError::MissingId => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            ApiError::Store(err) => {
                tracing::error!("menu store failure: {err}");
                let message = if err.is_read_failure() {
                    "Failed to read menu"
                } else {
                    "Failed to save menu"
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

/// Errors while loading `config.json`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
