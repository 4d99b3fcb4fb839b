use std::fmt;

use crate::location::Location;

/// Identity of one unique byte-range fetch: the fully namespaced blob path,
/// the optional bounds, and whether untransformed bytes were requested.
///
/// Two callers that compute equal keys want exactly the same bytes, which is
/// what lets concurrent fetches be collapsed into one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchKey {
    pub blob_path: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub raw: bool,
}

impl FetchKey {
    /// Build the key for `location` inside the blob namespace `prefix`.
    pub fn new(prefix: &str, location: &Location, raw: bool) -> Self {
        let blob_path = if prefix.is_empty() {
            location.path.clone()
        } else {
            format!("{}/{}", prefix.trim_end_matches('/'), location.path)
        };
        Self {
            blob_path,
            start: location.range.map(|r| r.start),
            end: location.range.map(|r| r.end),
            raw,
        }
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.blob_path)?;
        match (self.start, self.end) {
            (None, None) => {}
            (start, end) => {
                write!(f, "[{}:", start.unwrap_or(0))?;
                if let Some(end) = end {
                    write!(f, "{end}")?;
                }
                write!(f, "]")?;
            }
        }
        if self.raw {
            write!(f, " (raw)")?;
        }
        Ok(())
    }
}
