use std::sync::Arc;

use tracing::debug;
use trellis_store::{BlobStore, StoreError};

use crate::cache::ResolverCache;
use crate::engine::SharedEngine;
use crate::error::{ResolveError, ResolveResult};
use crate::layout::{node_prefix, root_blob_path};
use crate::synced::SyncedResolver;

/// Load a build's root blob and obtain its shared engine from `cache`.
pub fn get_or_build_resolver(
    cache: &ResolverCache,
    store: &dyn BlobStore,
    repo_id: &str,
    build_id: &str,
) -> ResolveResult<SharedEngine> {
    let path = root_blob_path(repo_id, build_id);
    let (_, root) = store
        .fetch(&path, None, None, false)
        .map_err(|e| match e {
            StoreError::NotFound(_) => ResolveError::NotFound(format!(
                "trie blob not found for build {build_id} of repo {repo_id}"
            )),
            other => other.into(),
        })?;
    debug!(repo_id, build_id, bytes = root.len(), "loaded trie root");
    cache.get_or_build(repo_id, &root)
}

/// Build a [`SyncedResolver`] for one build of a repository.
pub fn open_build(
    cache: &ResolverCache,
    store: Arc<dyn BlobStore>,
    repo_id: &str,
    build_id: &str,
) -> ResolveResult<SyncedResolver> {
    let engine = get_or_build_resolver(cache, store.as_ref(), repo_id, build_id)?;
    Ok(SyncedResolver::new(store, engine, node_prefix(repo_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paged::{BuildRoot, Page, PagedTrieFactory};
    use trellis_store::InMemoryBlobStore;
    use trellis_types::Location;

    fn publish(store: &InMemoryBlobStore, repo: &str, build: &str) {
        let leaf = Page::Leaf(vec![(1, Location::slice("f/1", 0, 4).unwrap())])
            .encode()
            .unwrap();
        store.put(format!("nodes/{repo}/n/0"), leaf.clone());
        let root = BuildRoot {
            root_node_id: 1,
            nodemap: Location::slice("n/0", 0, leaf.len() as u64).unwrap(),
            symmap: Location::whole("s/0"),
        };
        store.put(root_blob_path(repo, build), root.encode().unwrap());
    }

    #[test]
    fn missing_root_is_not_found() {
        let cache = ResolverCache::new(8, Arc::new(PagedTrieFactory));
        let store = InMemoryBlobStore::new();
        let err = get_or_build_resolver(&cache, &store, "repo1", "nope").unwrap_err();
        assert!(
            matches!(err, ResolveError::NotFound(ref m) if m.contains("nope") && m.contains("repo1"))
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn builds_share_engine_per_content() {
        let cache = ResolverCache::new(8, Arc::new(PagedTrieFactory));
        let store = InMemoryBlobStore::new();
        publish(&store, "repo1", "b1");
        publish(&store, "repo1", "b2");

        let a = get_or_build_resolver(&cache, &store, "repo1", "b1").unwrap();
        let b = get_or_build_resolver(&cache, &store, "repo1", "b2").unwrap();
        // Identical root content maps to one engine.
        assert!(SharedEngine::ptr_eq(&a, &b));
        assert!(std::ptr::eq(a.flights(), b.flights()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn open_build_resolves_root() {
        let cache = ResolverCache::new(8, Arc::new(PagedTrieFactory));
        let store = Arc::new(InMemoryBlobStore::new());
        publish(&store, "repo1", "b1");

        let resolver = open_build(&cache, store.clone(), "repo1", "b1").unwrap();
        assert_eq!(resolver.node_prefix(), "nodes/repo1");
        assert_eq!(
            resolver.resolve("path:").unwrap(),
            Location::slice("f/1", 0, 4).unwrap()
        );
        assert_eq!(store.reads_of("nodes/repo1/n/0"), 1);
    }
}
