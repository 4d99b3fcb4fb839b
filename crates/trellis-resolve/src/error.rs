use std::sync::Arc;

use thiserror::Error;
use trellis_store::StoreError;

use crate::engine::EngineError;

/// Errors surfaced by resolution.
///
/// Cloneable so that one in-flight fetch can hand the same failure to every
/// caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// A blob, trie entry, or build root is missing.
    #[error("data not found ({0})")]
    NotFound(String),

    /// The trie engine rejected the URL as malformed.
    #[error("bad node URL: {0}")]
    BadUrl(String),

    /// The engine asked again for data it had already been fed.
    #[error("resolution of {url} stalled: engine requested {key} again after it was fed")]
    Stalled { url: String, key: String },

    /// The engine failed for a reason other than a missing key or bad URL.
    #[error("trie engine error: {0}")]
    Engine(String),

    /// The blob store failed.
    #[error("storage error: {0}")]
    Storage(#[source] Arc<StoreError>),
}

impl ResolveError {
    /// Map an engine failure for `url` into the resolution taxonomy.
    pub fn from_engine(url: &str, err: EngineError) -> Self {
        match err {
            EngineError::KeyMissing => Self::NotFound(url.to_string()),
            EngineError::Malformed => Self::BadUrl(url.to_string()),
            EngineError::Corrupt(reason) => Self::Engine(reason),
        }
    }
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => Self::NotFound(format!("blob not found: {path}")),
            other => Self::Storage(Arc::new(other)),
        }
    }
}

/// Convenience alias for resolution results.
pub type ResolveResult<T> = Result<T, ResolveError>;
