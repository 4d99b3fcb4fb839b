use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::encoding::Encoding;
use crate::error::{StoreError, StoreResult};
use crate::range::{resolve_bounds, slice_range};
use crate::traits::{BlobHandle, BlobStore};

/// Blob store backed by a directory tree.
///
/// A blob at `a/b/c` is the file `<root>/a/b/c`, or `<root>/a/b/c.zst` when
/// stored zstd-compressed. The plain file wins if both exist.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a blob, creating parent directories as needed.
    pub fn put(&self, path: &str, data: &[u8], encoding: Encoding) -> StoreResult<()> {
        let file = self.file_path(path, encoding)?;
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, encoding.encode(path, data)?)?;
        Ok(())
    }

    fn file_path(&self, path: &str, encoding: Encoding) -> StoreResult<PathBuf> {
        check_path(path)?;
        Ok(self.root.join(format!("{path}{}", encoding.suffix())))
    }
}

impl BlobStore for FsBlobStore {
    fn get_blob(&self, path: &str) -> StoreResult<Option<Box<dyn BlobHandle>>> {
        for encoding in [Encoding::Identity, Encoding::Zstd] {
            let file = self.file_path(path, encoding)?;
            if file.is_file() {
                return Ok(Some(Box::new(FsBlob {
                    path: path.to_string(),
                    file,
                    encoding,
                })));
            }
        }
        Ok(None)
    }
}

/// Reject paths that could escape the store root.
fn check_path(path: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(invalid("must be a relative '/'-separated path"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(invalid("empty path component")),
            "." | ".." => return Err(invalid("relative path component")),
            _ => {}
        }
    }
    Ok(())
}

#[derive(Debug)]
struct FsBlob {
    path: String,
    file: PathBuf,
    encoding: Encoding,
}

impl FsBlob {
    fn read_stored_range(&self, start: Option<u64>, end: Option<u64>) -> StoreResult<Vec<u8>> {
        let mut file = File::open(&self.file)?;
        let len = file.metadata()?.len();
        let (start, end) = resolve_bounds(&self.path, len, start, end)?;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = Vec::with_capacity((end - start) as usize);
        file.take(end - start).read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl BlobHandle for FsBlob {
    fn path(&self) -> &str {
        &self.path
    }

    fn read(&self, start: Option<u64>, end: Option<u64>, raw: bool) -> StoreResult<Vec<u8>> {
        let data = if raw || self.encoding == Encoding::Identity {
            self.read_stored_range(start, end)?
        } else {
            let decoded = self
                .encoding
                .decode(&self.path, std::fs::read(&self.file)?)?;
            slice_range(&self.path, &decoded, start, end)?.to_vec()
        };
        debug!(
            path = %self.path,
            start = ?start,
            end = ?end,
            raw,
            bytes = data.len(),
            "read blob"
        );
        Ok(data)
    }
}
