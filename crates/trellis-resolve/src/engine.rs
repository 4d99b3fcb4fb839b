use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::warn;
use trellis_types::{FetchKey, Location};

use crate::error::ResolveError;
use crate::flight::SingleFlight;

/// Failures reported by a trie engine step.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The URL is well-formed but names nothing in this build.
    #[error("key missing")]
    KeyMissing,

    /// The URL could not be parsed.
    #[error("malformed url")]
    Malformed,

    /// Index data fed to the engine could not be decoded.
    #[error("corrupt index data: {0}")]
    Corrupt(String),
}

/// A request for more blob bytes, produced by a step that could not finish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Continuation {
    location: Location,
}

impl Continuation {
    pub fn new(location: Location) -> Self {
        Self { location }
    }

    /// The blob slice the engine needs, relative to the node namespace.
    pub fn location(&self) -> &Location {
        &self.location
    }
}

/// Outcome of one resolution step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Concrete(Location),
    NeedData(Continuation),
}

/// A trie engine that maps node URLs to blob locations over lazily loaded
/// index data.
///
/// Engines are not required to tolerate concurrent calls; callers go through
/// [`SharedEngine`], which serializes every `step` and `feed`.
///
/// Progress contract: after `feed` succeeds for a continuation, stepping the
/// same URL again must not produce that same continuation.
pub trait TrieEngine: Send {
    /// Attempt to resolve `url` with the data loaded so far.
    fn step(&mut self, url: &str) -> Result<Step, EngineError>;

    /// Incorporate the bytes requested by `need`.
    fn feed(&mut self, need: &Continuation, data: &[u8]) -> Result<(), EngineError>;
}

/// Fetches in flight against one engine, keyed by namespaced blob range.
pub type EngineFlights = SingleFlight<FetchKey, (), ResolveError>;

struct EngineCell {
    engine: Mutex<Box<dyn TrieEngine>>,
    flights: EngineFlights,
}

/// A trie engine shared by every resolver of one build.
///
/// The inner mutex is the engine's exclusive section: it is held for exactly
/// one `step` or `feed` and never across I/O. Fetch deduplication lives next
/// to it, so resolvers that share an engine also share its in-flight fetches.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<EngineCell>,
}

impl SharedEngine {
    pub fn new(engine: Box<dyn TrieEngine>) -> Self {
        Self {
            inner: Arc::new(EngineCell {
                engine: Mutex::new(engine),
                flights: SingleFlight::new(),
            }),
        }
    }

    pub fn step(&self, url: &str) -> Result<Step, EngineError> {
        self.lock().step(url)
    }

    pub fn feed(&self, need: &Continuation, data: &[u8]) -> Result<(), EngineError> {
        self.lock().feed(need, data)
    }

    /// The single-flight map every resolver of this engine fetches through.
    pub fn flights(&self) -> &EngineFlights {
        &self.inner.flights
    }

    /// Returns `true` if both handles refer to the same engine instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    // A panic inside the engine fails only the request that hit it; later
    // callers continue with whatever state the engine was left in.
    fn lock(&self) -> MutexGuard<'_, Box<dyn TrieEngine>> {
        self.inner.engine.lock().unwrap_or_else(|poisoned| {
            warn!("engine panicked in an earlier call; clearing poison");
            self.inner.engine.clear_poison();
            poisoned.into_inner()
        })
    }
}

impl fmt::Debug for SharedEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEngine")
            .field("refs", &Arc::strong_count(&self.inner))
            .field("flights", &self.inner.flights)
            .finish()
    }
}
