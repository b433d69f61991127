// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("vector index not found at {}; run `build-index` first", .0.display())]
    IndexMissing(PathBuf),

    #[error("vector index error: {0}")]
    Index(String),

    #[error("model service error: {0}")]
    Upstream(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn upstream<E: std::fmt::Display>(err: E) -> Self {
        AppError::Upstream(err.to_string())
    }
}
