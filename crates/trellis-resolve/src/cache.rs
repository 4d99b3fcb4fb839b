use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::{debug, info};

use crate::engine::{EngineError, SharedEngine, TrieEngine};
use crate::error::{ResolveError, ResolveResult};

/// Builds a trie engine from a build's root blob.
pub trait EngineFactory: Send + Sync {
    fn build(&self, repo_id: &str, root: &[u8]) -> Result<Box<dyn TrieEngine>, EngineError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    repo_id: String,
    content: [u8; 32],
}

impl CacheKey {
    fn new(repo_id: &str, root: &[u8]) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            content: *blake3::hash(root).as_bytes(),
        }
    }

    fn short_hex(&self) -> String {
        hex::encode(&self.content[..4])
    }
}

/// Capacity-bounded cache of constructed trie engines.
///
/// Engines are keyed by repository and the BLAKE3 hash of the root blob, so
/// two builds with identical root content share one engine. Construction
/// happens under the cache lock; concurrent requests for the same build wait
/// for the first construction instead of repeating it. Least recently used
/// engines are evicted first; evicted engines stay alive for resolvers still
/// holding them.
pub struct ResolverCache {
    factory: Arc<dyn EngineFactory>,
    engines: Mutex<LruCache<CacheKey, SharedEngine>>,
}

impl ResolverCache {
    /// Create a cache holding at most `capacity` engines (minimum 1).
    pub fn new(capacity: usize, factory: Arc<dyn EngineFactory>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            factory,
            engines: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the engine for this build content, constructing it on a miss.
    pub fn get_or_build(&self, repo_id: &str, root: &[u8]) -> ResolveResult<SharedEngine> {
        let key = CacheKey::new(repo_id, root);
        let mut engines = self.engines.lock().expect("lock poisoned");
        if let Some(engine) = engines.get(&key) {
            debug!(repo_id, content = %key.short_hex(), "trie engine cache hit");
            return Ok(engine.clone());
        }

        let engine = self.factory.build(repo_id, root).map_err(|e| {
            ResolveError::Engine(format!("building trie engine for {repo_id}: {e}"))
        })?;
        let engine = SharedEngine::new(engine);
        info!(repo_id, content = %key.short_hex(), "built trie engine");
        engines.put(key, engine.clone());
        Ok(engine)
    }

    /// Number of cached engines.
    pub fn len(&self) -> usize {
        self.engines.lock().expect("lock poisoned").len()
    }

    /// Returns `true` if no engines are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached engines.
    pub fn capacity(&self) -> usize {
        self.engines.lock().expect("lock poisoned").cap().get()
    }
}

impl std::fmt::Debug for ResolverCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
