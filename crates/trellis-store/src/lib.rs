//! Byte-range addressable blob storage for trellis.
//!
//! Index data lives in named blobs rather than in memory. A resolver reads
//! only the slices it needs, so every backend supports half-open range reads
//! on top of plain whole-blob reads.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`FsBlobStore`] -- blobs as files under a root directory
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once a build is published; reads never lock.
//! 2. Ranges are half-open `[start, end)`; a missing bound means the blob edge.
//! 3. `raw` reads return bytes exactly as stored; non-raw reads may decode
//!    (see [`Encoding`]) before the range is applied.
//! 4. A missing blob is `Ok(None)` from [`BlobStore::get_blob`], never an error.

pub mod encoding;
pub mod error;
pub mod fs;
pub mod memory;
pub mod range;
pub mod traits;

pub use encoding::Encoding;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use range::slice_range;
pub use traits::{BlobHandle, BlobStore};
