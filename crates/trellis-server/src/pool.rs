use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;
use trellis_resolve::{open_build, ResolveResult, ResolverCache, SyncedResolver};
use trellis_store::BlobStore;
use trellis_types::BuildRef;

/// One [`SyncedResolver`] per `(repo_id, build_id)`, opened on first use.
///
/// Resolvers for builds with identical root content share an engine through
/// the [`ResolverCache`]. A build that fails to open is not remembered.
pub struct ResolverPool {
    store: Arc<dyn BlobStore>,
    cache: ResolverCache,
    resolvers: Mutex<HashMap<(String, String), Arc<SyncedResolver>>>,
}

impl ResolverPool {
    pub fn new(store: Arc<dyn BlobStore>, cache: ResolverCache) -> Self {
        Self {
            store,
            cache,
            resolvers: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }

    /// Return the resolver for `build`, opening it if needed. Blocks on
    /// storage the first time a build is seen.
    pub fn get(&self, build: &BuildRef) -> ResolveResult<Arc<SyncedResolver>> {
        let key = (build.repo_id.clone(), build.build_id.clone());
        let mut resolvers = self.resolvers.lock().expect("lock poisoned");
        if let Some(resolver) = resolvers.get(&key) {
            return Ok(Arc::clone(resolver));
        }
        let resolver = Arc::new(open_build(
            &self.cache,
            Arc::clone(&self.store),
            &build.repo_id,
            &build.build_id,
        )?);
        info!(repo_id = %build.repo_id, build_id = %build.build_id, "opened build");
        resolvers.insert(key, Arc::clone(&resolver));
        Ok(resolver)
    }

    /// Number of open resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResolverPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverPool")
            .field("resolvers", &self.len())
            .field("cache", &self.cache)
            .finish()
    }
}
