use crate::error::{StoreError, StoreResult};

/// How a blob's bytes are stored.
///
/// Non-raw reads of a [`Encoding::Zstd`] blob decode the whole blob and then
/// apply the requested range to the decoded bytes; raw reads apply the range
/// to the stored (compressed) bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    #[default]
    Identity,
    Zstd,
}

impl Encoding {
    /// File suffix used by filesystem-backed stores.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Identity => "",
            Self::Zstd => ".zst",
        }
    }

    /// Encode `data` for storage.
    pub fn encode(&self, path: &str, data: &[u8]) -> StoreResult<Vec<u8>> {
        match self {
            Self::Identity => Ok(data.to_vec()),
            Self::Zstd => zstd::encode_all(data, 0).map_err(|e| StoreError::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Decode stored bytes back into their logical form.
    pub fn decode(&self, path: &str, stored: Vec<u8>) -> StoreResult<Vec<u8>> {
        match self {
            Self::Identity => Ok(stored),
            Self::Zstd => zstd::decode_all(stored.as_slice()).map_err(|e| StoreError::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
