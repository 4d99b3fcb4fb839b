//! HTTP boundary for trellis.
//!
//! Serves node resolution and relay for published builds, plus each build's
//! search trie blob. Request identifiers are validated before they reach
//! blob storage; resolution itself runs on the blocking thread pool.

pub mod args;
pub mod config;
pub mod error;
pub mod handler;
pub mod pool;
pub mod router;
pub mod server;
pub mod state;

pub use args::{Action, BuildArgs, ResolveArgs};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use pool::ResolverPool;
pub use server::TrellisServer;
pub use state::AppState;
