use std::sync::Arc;
use std::time::Duration;

use trellis_resolve::{PagedTrieFactory, ResolverCache};
use trellis_store::{BlobStore, FsBlobStore};

use crate::config::ServerConfig;
use crate::pool::ResolverPool;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pool: Arc<ResolverPool>,
    cache_control: Arc<str>,
    max_age: Duration,
}

impl AppState {
    /// State over the blob directory named by `config`.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_store(Arc::new(FsBlobStore::new(config.graph_dir())), config)
    }

    /// State over an arbitrary blob store, using the paged trie engine.
    pub fn with_store(store: Arc<dyn BlobStore>, config: &ServerConfig) -> Self {
        let cache = ResolverCache::new(config.resolver_cache_capacity, Arc::new(PagedTrieFactory));
        Self {
            pool: Arc::new(ResolverPool::new(store, cache)),
            cache_control: config.cache_control().into(),
            max_age: Duration::from_secs(config.resolution_max_age_secs),
        }
    }

    pub fn pool(&self) -> &Arc<ResolverPool> {
        &self.pool
    }

    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    /// How long clients may cache resolutions and CORS preflights.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}
