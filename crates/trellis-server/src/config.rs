use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_RESOLVER_CACHE_CAPACITY: usize = 1024;
pub const DEFAULT_RESOLUTION_MAX_AGE_SECS: u64 = 60 * 60 * 24;

/// Environment variable overriding the data root.
pub const DATA_ROOT_ENV: &str = "TRELLIS_DIR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_root: PathBuf,
    pub resolver_cache_capacity: usize,
    pub resolution_max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            data_root: default_data_root(),
            resolver_cache_capacity: DEFAULT_RESOLVER_CACHE_CAPACITY,
            resolution_max_age_secs: DEFAULT_RESOLUTION_MAX_AGE_SECS,
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file; absent keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Directory holding the blob namespace (`builds/`, `nodes/`, `search/`).
    pub fn graph_dir(&self) -> PathBuf {
        self.data_root.join("graph")
    }

    /// `Cache-Control` value for resolution and relay responses.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.resolution_max_age_secs)
    }
}

/// `$TRELLIS_DIR`, else `$HOME/.trellis`, else `.trellis`.
pub fn default_data_root() -> PathBuf {
    data_root_from(std::env::var_os(DATA_ROOT_ENV), std::env::var_os("HOME"))
}

fn data_root_from(explicit: Option<OsString>, home: Option<OsString>) -> PathBuf {
    match (explicit, home) {
        (Some(dir), _) if !dir.is_empty() => PathBuf::from(dir),
        (_, Some(home)) => PathBuf::from(home).join(".trellis"),
        _ => PathBuf::from(".trellis"),
    }
}
