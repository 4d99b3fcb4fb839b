use std::fmt;

use crate::error::{StoreError, StoreResult};

/// A resolved reference to one blob, readable in sub-ranges.
pub trait BlobHandle: Send + Sync + fmt::Debug {
    /// The store-relative path this handle was resolved from.
    fn path(&self) -> &str;

    /// Read `[start, end)` of the blob.
    ///
    /// `start` defaults to 0 and `end` to the end of the blob. With
    /// `raw = false` the backend may decode stored bytes first and apply the
    /// range to the decoded form.
    fn read(&self, start: Option<u64>, end: Option<u64>, raw: bool) -> StoreResult<Vec<u8>>;
}

/// Byte-range addressable content storage keyed by path string.
///
/// Implementations must be safe to share across request threads.
pub trait BlobStore: Send + Sync {
    /// Resolve `path` to a handle.
    ///
    /// Returns `Ok(None)` if no blob exists at `path`.
    /// Returns `Err` on I/O failure or an unusable path.
    fn get_blob(&self, path: &str) -> StoreResult<Option<Box<dyn BlobHandle>>>;

    /// Resolve `path` and read a range from it in one call.
    ///
    /// Fails with [`StoreError::NotFound`] when the blob does not exist.
    fn fetch(
        &self,
        path: &str,
        start: Option<u64>,
        end: Option<u64>,
        raw: bool,
    ) -> StoreResult<(Box<dyn BlobHandle>, Vec<u8>)> {
        let handle = self
            .get_blob(path)?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let data = handle.read(start, end, raw)?;
        Ok((handle, data))
    }
}

impl<S: BlobStore + ?Sized> BlobStore for std::sync::Arc<S> {
    fn get_blob(&self, path: &str) -> StoreResult<Option<Box<dyn BlobHandle>>> {
        (**self).get_blob(path)
    }
}
