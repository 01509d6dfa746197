// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeflowError {
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Edge '{edge}' references unknown node '{node}'")]
    UnknownNode { edge: String, node: String },

    #[error("Cycle detected in graph: {0}")]
    GraphCycle(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NodeflowError {
    /// Whether this error was caused by a malformed graph submission.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NodeflowError::InvalidGraph(_)
                | NodeflowError::UnknownNode { .. }
                | NodeflowError::GraphCycle(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, NodeflowError>;
