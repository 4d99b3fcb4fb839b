use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use trellis_resolve::{
    Continuation, EngineError, ResolveError, SharedEngine, Step, SyncedResolver, TrieEngine,
};
use trellis_store::{BlobHandle, BlobStore, InMemoryBlobStore, StoreResult};
use trellis_types::Location;

const CALLERS: usize = 8;

/// Delays every lookup so concurrent callers pile up on the same fetch.
struct SlowStore {
    inner: Arc<InMemoryBlobStore>,
    delay: Duration,
}

impl BlobStore for SlowStore {
    fn get_blob(&self, path: &str) -> StoreResult<Option<Box<dyn BlobHandle>>> {
        thread::sleep(self.delay);
        self.inner.get_blob(path)
    }
}

/// Walks a fixed chain of pages, then answers with `answer`.
struct Chain {
    pages: Vec<Location>,
    loaded: usize,
    answer: Location,
}

impl TrieEngine for Chain {
    fn step(&mut self, _url: &str) -> Result<Step, EngineError> {
        match self.pages.get(self.loaded) {
            Some(page) => Ok(Step::NeedData(Continuation::new(page.clone()))),
            None => Ok(Step::Concrete(self.answer.clone())),
        }
    }

    fn feed(&mut self, need: &Continuation, _data: &[u8]) -> Result<(), EngineError> {
        // Pages already loaded are ignored.
        if self.pages.get(self.loaded) == Some(need.location()) {
            self.loaded += 1;
        }
        Ok(())
    }
}

fn chain(depth: usize) -> Chain {
    Chain {
        pages: (0..depth)
            .map(|i| Location::slice(format!("p/{i}"), 0, 4).unwrap())
            .collect(),
        loaded: 0,
        answer: Location::slice("f/1", 10, 20).unwrap(),
    }
}

fn resolver(store: &Arc<InMemoryBlobStore>, engine: Chain) -> Arc<SyncedResolver> {
    let slow = SlowStore {
        inner: Arc::clone(store),
        delay: Duration::from_millis(100),
    };
    Arc::new(SyncedResolver::new(
        Arc::new(slow),
        SharedEngine::new(Box::new(engine)),
        "nodes/r",
    ))
}

fn resolve_concurrently(
    resolver: &Arc<SyncedResolver>,
    url: &'static str,
) -> Vec<Result<Location, ResolveError>> {
    let barrier = Arc::new(Barrier::new(CALLERS));
    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let resolver = Arc::clone(resolver);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                resolver.resolve(url)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn concurrent_resolves_share_one_fetch() {
    let store = Arc::new(InMemoryBlobStore::new());
    store.put("nodes/r/p/0", b"page".to_vec());
    let resolver = resolver(&store, chain(1));

    let results = resolve_concurrently(&resolver, "id:1");
    for result in results {
        assert_eq!(result.unwrap(), Location::slice("f/1", 10, 20).unwrap());
    }
    assert_eq!(store.reads_of("nodes/r/p/0"), 1);
}

#[test]
fn concurrent_multi_round_resolves_fetch_each_page_once() {
    let store = Arc::new(InMemoryBlobStore::new());
    for i in 0..3 {
        store.put(format!("nodes/r/p/{i}"), b"page".to_vec());
    }
    let resolver = resolver(&store, chain(3));

    let results = resolve_concurrently(&resolver, "id:1");
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(store.total_reads(), 3);
}

#[test]
fn leader_failure_reaches_every_caller() {
    let store = Arc::new(InMemoryBlobStore::new());
    let resolver = resolver(&store, chain(1));

    let results = resolve_concurrently(&resolver, "id:1");
    for result in results {
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }
    assert_eq!(store.total_reads(), 0);
}

#[test]
fn different_urls_share_a_page_fetch() {
    let store = Arc::new(InMemoryBlobStore::new());
    store.put("nodes/r/p/0", b"page".to_vec());
    let resolver = resolver(&store, chain(1));

    let a = {
        let resolver = Arc::clone(&resolver);
        thread::spawn(move || resolver.resolve("id:1"))
    };
    let b = {
        let resolver = Arc::clone(&resolver);
        thread::spawn(move || resolver.resolve("id:2"))
    };
    assert!(a.join().unwrap().is_ok());
    assert!(b.join().unwrap().is_ok());
    assert_eq!(store.reads_of("nodes/r/p/0"), 1);
}

#[test]
fn resolvers_sharing_an_engine_share_its_fetches() {
    let store = Arc::new(InMemoryBlobStore::new());
    store.put("nodes/r/p/0", b"page".to_vec());
    let first = resolver(&store, chain(1));
    let second = Arc::new(SyncedResolver::new(
        Arc::new(SlowStore {
            inner: Arc::clone(&store),
            delay: Duration::from_millis(100),
        }),
        first.engine().clone(),
        "nodes/r",
    ));

    let barrier = Arc::new(Barrier::new(CALLERS));
    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let resolver = if i % 2 == 0 {
                Arc::clone(&first)
            } else {
                Arc::clone(&second)
            };
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                resolver.resolve("id:1")
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(
            handle.join().unwrap().unwrap(),
            Location::slice("f/1", 10, 20).unwrap()
        );
    }
    assert_eq!(store.reads_of("nodes/r/p/0"), 1);
}
