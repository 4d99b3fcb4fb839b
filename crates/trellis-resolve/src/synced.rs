use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};
use trellis_store::{BlobHandle, BlobStore};
use trellis_types::{FetchKey, Location};

use crate::engine::{Continuation, SharedEngine, Step};
use crate::error::{ResolveError, ResolveResult};
use crate::flight::{Flight, Role};

/// Drives a shared trie engine to completion against blob storage.
///
/// Many request threads may call [`resolve`](Self::resolve) at once. Engine
/// steps are serialized through the [`SharedEngine`]; fetches happen outside
/// it, and identical concurrent fetches are collapsed so that only one caller
/// reads the bytes and feeds them to the engine. Collapsing spans every
/// resolver holding the same engine.
pub struct SyncedResolver {
    store: Arc<dyn BlobStore>,
    engine: SharedEngine,
    node_prefix: String,
}

impl SyncedResolver {
    /// Create a resolver whose node data lives under `node_prefix` in `store`.
    pub fn new(
        store: Arc<dyn BlobStore>,
        engine: SharedEngine,
        node_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            engine,
            node_prefix: node_prefix.into(),
        }
    }

    /// The blob namespace node locations are resolved against.
    pub fn node_prefix(&self) -> &str {
        &self.node_prefix
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Resolve `url` to a concrete location, fetching index data as needed.
    ///
    /// Every round restarts from `url`; the engine derives progress from the
    /// data it has been fed.
    pub fn resolve(&self, url: &str) -> ResolveResult<Location> {
        let mut fed: HashSet<FetchKey> = HashSet::new();
        let mut round = 0usize;
        loop {
            let step = self
                .engine
                .step(url)
                .map_err(|e| ResolveError::from_engine(url, e))?;

            let need = match step {
                Step::Concrete(location) => {
                    debug!(url, rounds = round, location = %location, "resolved");
                    return Ok(location);
                }
                Step::NeedData(need) => need,
            };

            round += 1;
            let key = FetchKey::new(&self.node_prefix, need.location(), false);
            if fed.contains(&key) {
                return Err(ResolveError::Stalled {
                    url: url.to_string(),
                    key: key.to_string(),
                });
            }
            debug!(url, round, key = %key, "need data");

            if self.feed_key(key.clone(), &need, Some(url))?.is_some() {
                fed.insert(key);
            }
        }
    }

    /// Resolve `url` and read the bytes at the resulting location.
    pub fn get(&self, url: &str, raw: bool) -> ResolveResult<(Box<dyn BlobHandle>, Vec<u8>)> {
        let location = self.resolve(url)?;
        let key = FetchKey::new(&self.node_prefix, &location, raw);
        Ok(self.store.fetch(&key.blob_path, key.start, key.end, raw)?)
    }

    /// Fetch the data `need` asks for and feed it to the engine, unless an
    /// identical fetch is already in flight, in which case wait for it.
    ///
    /// Returns the role this caller played, or `None` if the leader it
    /// waited on vanished without an outcome and the caller should retry.
    pub fn fetch_and_feed(&self, need: &Continuation, raw: bool) -> ResolveResult<Option<Role>> {
        let key = FetchKey::new(&self.node_prefix, need.location(), raw);
        self.feed_key(key, need, None)
    }

    /// With `url` set, the leader first re-steps it: a caller that saw
    /// `need` before an earlier leader fed it must not fetch it again.
    fn feed_key(
        &self,
        key: FetchKey,
        need: &Continuation,
        url: Option<&str>,
    ) -> ResolveResult<Option<Role>> {
        let flight = self.engine.flights().run(key.clone(), || {
            if let Some(url) = url {
                match self.engine.step(url) {
                    Ok(Step::NeedData(current)) if current == *need => {}
                    _ => {
                        debug!(key = %key, "already fed");
                        return Ok(());
                    }
                }
            }
            let (_, data) = self
                .store
                .fetch(&key.blob_path, key.start, key.end, key.raw)?;
            debug!(key = %key, bytes = data.len(), "fetched");
            self.engine
                .feed(need, &data)
                .map_err(|e| ResolveError::Engine(format!("feeding {key}: {e}")))
        });

        match flight {
            Flight::Leader(Err(e)) => {
                warn!(key = %key, error = %e, "fetch failed");
                Err(e)
            }
            Flight::Follower(Err(e)) => Err(e),
            Flight::Leader(Ok(())) => Ok(Some(Role::Leader)),
            Flight::Follower(Ok(())) => Ok(Some(Role::Follower)),
            Flight::Abandoned => {
                warn!(key = %key, "in-flight fetch abandoned; retrying");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for SyncedResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncedResolver")
            .field("node_prefix", &self.node_prefix)
            .field("engine", &self.engine)
            .finish()
    }
}
