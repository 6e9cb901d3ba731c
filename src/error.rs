// src/error.rs
//! Run-level error taxonomy.
//!
//! Per-item anomalies (bad timestamps, empty text, singleton windows) never
//! surface here; they are absorbed with defined defaults. Anything in this
//! enum aborts the whole run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HotnessError {
    /// The external encode call failed or returned a malformed matrix.
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// Rejected before any scoring work starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HotnessError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::EmbeddingProvider(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HotnessError>;
