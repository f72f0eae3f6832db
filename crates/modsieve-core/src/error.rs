//! Error types for modsieve

use crate::gateway::GatewayError;

/// Result type alias using modsieve's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for modsieve operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (malformed descriptors, bad patterns)
    #[error("configuration error: {0}")]
    Config(String),

    /// Policy evaluation errors
    #[error("policy error: {0}")]
    Policy(String),

    /// Outbound gateway errors
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new policy error
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
