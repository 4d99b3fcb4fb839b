use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const SLICE_PREFIX: &str = "slice:";

/// Half-open byte range `[start, end)` within a blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: u64, end: u64) -> Result<Self, TypeError> {
        if start > end {
            return Err(TypeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Where a piece of node data lives: a blob path and, optionally, the byte
/// range inside that blob.
///
/// Paths produced by the trie engine are relative to the repository's node
/// namespace; the resolver prepends the namespace before touching storage.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub range: Option<ByteRange>,
}

impl Location {
    /// A location covering a whole blob.
    pub fn whole(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            range: None,
        }
    }

    /// A location covering `[start, end)` of a blob.
    pub fn slice(path: impl Into<String>, start: u64, end: u64) -> Result<Self, TypeError> {
        Ok(Self {
            path: path.into(),
            range: Some(ByteRange::new(start, end)?),
        })
    }

    /// Render the wire form: the bare path, or `slice:<path>[<start>:<end>]`.
    pub fn to_url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(r) => write!(f, "{SLICE_PREFIX}{}[{}:{}]", self.path, r.start, r.end),
            None => write!(f, "{}", self.path),
        }
    }
}

impl FromStr for Location {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TypeError::MalformedLocation(s.to_string());

        let Some(rest) = s.strip_prefix(SLICE_PREFIX) else {
            if s.is_empty() {
                return Err(malformed());
            }
            return Ok(Self::whole(s));
        };

        let body = rest.strip_suffix(']').ok_or_else(malformed)?;
        let (path, bounds) = body.rsplit_once('[').ok_or_else(malformed)?;
        if path.is_empty() {
            return Err(malformed());
        }
        let (start, end) = bounds.split_once(':').ok_or_else(malformed)?;
        let start: u64 = start.parse().map_err(|_| malformed())?;
        let end: u64 = end.parse().map_err(|_| malformed())?;

        Self::slice(path, start, end)
    }
}
