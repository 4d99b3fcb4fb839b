//! Foundation types for trellis.
//!
//! This crate provides the small value types shared by every other trellis
//! crate: where node data lives in blob storage, how a single byte-range
//! fetch is identified, and how a build is addressed from the outside.
//!
//! # Key Types
//!
//! - [`Location`] -- Blob path plus optional byte range, with its wire format
//! - [`ByteRange`] -- Half-open `[start, end)` byte range
//! - [`FetchKey`] -- Identity of one unique byte-range fetch
//! - [`BuildRef`] -- Repository, branch, and build triple from a request

pub mod build;
pub mod error;
pub mod fetch;
pub mod location;

pub use build::{decode_branch, encode_branch, validate_identifier, BuildRef};
pub use error::TypeError;
pub use fetch::FetchKey;
pub use location::{ByteRange, Location};
