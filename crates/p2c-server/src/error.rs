//! Error types for the p2c server.

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured CORS origin is not a valid header value.
    #[error("invalid allowed origin {0:?}")]
    InvalidOrigin(String),

    /// IO error while serving.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
