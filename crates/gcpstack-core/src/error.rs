//! Error types for the GcpStack core.

/// Core error type for GcpStack infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum GcpStackError {
    /// Invalid project identifier.
    #[error("invalid project ID: {0:?} (must be non-empty and contain no '/' or ':')")]
    InvalidProjectId(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for GcpStack infrastructure operations.
pub type GcpStackResult<T> = Result<T, GcpStackError>;
