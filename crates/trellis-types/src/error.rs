use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed location: {0}")]
    MalformedLocation(String),

    #[error("invalid byte range: {start}..{end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("bad argument {name}: {reason}")]
    BadArgument { name: String, reason: String },
}
