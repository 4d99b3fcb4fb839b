use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::encoding::Encoding;
use crate::error::StoreResult;
use crate::range::slice_range;
use crate::traits::{BlobHandle, BlobStore};

#[derive(Clone, Debug)]
struct StoredBlob {
    stored: Arc<Vec<u8>>,
    encoding: Encoding,
}

type ReadLog = Arc<Mutex<HashMap<String, usize>>>;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Every range read is counted per path so
/// callers can assert how often storage was actually hit.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
    reads: ReadLog,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            reads: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Insert or replace a blob stored as-is.
    pub fn put(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        let blob = StoredBlob {
            stored: Arc::new(data.into()),
            encoding: Encoding::Identity,
        };
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(path.into(), blob);
    }

    /// Insert or replace a blob stored with `encoding`.
    pub fn put_encoded(&self, path: &str, data: &[u8], encoding: Encoding) -> StoreResult<()> {
        let blob = StoredBlob {
            stored: Arc::new(encoding.encode(path, data)?),
            encoding,
        };
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(path.to_string(), blob);
        Ok(())
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Number of reads served for `path`.
    pub fn reads_of(&self, path: &str) -> usize {
        self.reads
            .lock()
            .expect("lock poisoned")
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Total reads served across all paths.
    pub fn total_reads(&self) -> usize {
        self.reads.lock().expect("lock poisoned").values().sum()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get_blob(&self, path: &str) -> StoreResult<Option<Box<dyn BlobHandle>>> {
        let blobs = self.blobs.read().expect("lock poisoned");
        Ok(blobs.get(path).map(|blob| {
            Box::new(MemoryBlob {
                path: path.to_string(),
                blob: blob.clone(),
                reads: Arc::clone(&self.reads),
            }) as Box<dyn BlobHandle>
        }))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .field("total_reads", &self.total_reads())
            .finish()
    }
}

#[derive(Debug)]
struct MemoryBlob {
    path: String,
    blob: StoredBlob,
    reads: ReadLog,
}

impl BlobHandle for MemoryBlob {
    fn path(&self) -> &str {
        &self.path
    }

    fn read(&self, start: Option<u64>, end: Option<u64>, raw: bool) -> StoreResult<Vec<u8>> {
        *self
            .reads
            .lock()
            .expect("lock poisoned")
            .entry(self.path.clone())
            .or_insert(0) += 1;

        if raw || self.blob.encoding == Encoding::Identity {
            return Ok(slice_range(&self.path, &self.blob.stored, start, end)?.to_vec());
        }
        let decoded = self
            .blob
            .encoding
            .decode(&self.path, (*self.blob.stored).clone())?;
        Ok(slice_range(&self.path, &decoded, start, end)?.to_vec())
    }
}
