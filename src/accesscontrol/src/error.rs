//! Error types for the access control engine

use thiserror::Error;

/// Access control engine errors
#[derive(Debug, Error)]
pub enum AccessControlError {
    /// Malformed, missing or mistyped policy document fields
    #[error("Invalid policy document: {0}")]
    Format(String),

    /// Policy document nests deeper than the configured limit
    #[error("Policy document exceeds maximum nesting depth of {max_depth}")]
    DepthExceeded { max_depth: usize },

    /// Field placeholder name outside the supported set
    #[error("Unknown scope field: {0}")]
    UnknownField(String),

    /// Scope template still carries placeholders where a literal scope is required
    #[error("Unresolved scope template: {0}")]
    UnresolvedScope(String),

    /// A scope mutator refused to rewrite a scope list
    #[error("Scope mutation failed: {0}")]
    Mutation(String),

    /// Invalid loader configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AccessControlError {
    /// Whether this error came from decoding a policy document
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format(_) | Self::DepthExceeded { .. })
    }
}

/// Result type for access control operations
pub type Result<T> = std::result::Result<T, AccessControlError>;
