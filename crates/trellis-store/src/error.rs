/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No blob exists at the requested path.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The blob path escapes the store root or is otherwise unusable.
    #[error("invalid blob path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The requested range has `start > end`.
    #[error("invalid byte range {start}..{end} for {path}")]
    InvalidRange { path: String, start: u64, end: u64 },

    /// The stored bytes could not be decoded.
    #[error("decoding {path} failed: {reason}")]
    Decode { path: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
