// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for a synthesis run

use thiserror::Error;

use crate::assembler::GraphError;
use crate::config::ConfigError;

/// Errors that can stop a synthesis run
///
/// Every variant is fatal and never retried: the only recovery is to fix the
/// configuration or the build plan and run again.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Graph assembly aborted
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Descriptor could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for synthesis operations
pub type SynthResult<T> = Result<T, SynthError>;

impl From<serde_json::Error> for SynthError {
    fn from(err: serde_json::Error) -> Self {
        SynthError::Serialization(err.to_string())
    }
}
