//! Demand-paged trie resolution over blob storage.
//!
//! A build's index is a trie whose pages live in blob storage, not memory.
//! Resolving one node URL may take several rounds: step the engine, fetch
//! the bytes it asks for, feed them back, and step again until it answers
//! with a concrete location.
//!
//! # Architecture
//!
//! - **[`TrieEngine`]** performs one resolution step at a time and is fed
//!   fetched bytes. [`SharedEngine`] serializes access to it.
//! - **[`SingleFlight`]** collapses identical concurrent work so one caller
//!   fetches and the rest wait for its outcome.
//! - **[`SyncedResolver`]** drives the step/fetch/feed loop for one build,
//!   never holding the engine across I/O.
//! - **[`ResolverCache`]** keeps constructed engines, keyed by repository and
//!   root blob content, under an LRU bound.
//! - **[`PagedTrie`]** is the bundled engine over bincode-encoded pages.
//!
//! # Modules
//!
//! - [`acquire`] -- Cold-start: root blob to shared engine to resolver
//! - [`cache`] -- [`ResolverCache`] and the [`EngineFactory`] seam
//! - [`engine`] -- The [`TrieEngine`] trait and step types
//! - [`error`] -- [`ResolveError`] taxonomy
//! - [`flight`] -- Generic [`SingleFlight`] coordinator
//! - [`layout`] -- Blob path layout of a published build
//! - [`paged`] -- [`PagedTrie`] engine and page format
//! - [`synced`] -- [`SyncedResolver`]

pub mod acquire;
pub mod cache;
pub mod engine;
pub mod error;
pub mod flight;
pub mod layout;
pub mod paged;
pub mod synced;

pub use acquire::{get_or_build_resolver, open_build};
pub use cache::{EngineFactory, ResolverCache};
pub use engine::{Continuation, EngineError, EngineFlights, SharedEngine, Step, TrieEngine};
pub use error::{ResolveError, ResolveResult};
pub use flight::{Flight, Role, SingleFlight};
pub use paged::{BuildRoot, Page, PagedTrie, PagedTrieFactory};
pub use synced::SyncedResolver;
