//! A demand-paged trie engine over bincode-encoded pages.
//!
//! A build's root blob is a [`BuildRoot`] naming the root page of two maps:
//! the node map (node id to node data location) and the symbol map (symbol
//! id to definition location). Each map is a tree of [`Page`]s stored as
//! slices of node blobs. Branch pages list their children by first key;
//! leaf pages list `(key, location)` pairs. Both are sorted by key.
//!
//! Pages are loaded only when a lookup reaches them: a lookup that hits an
//! unloaded page yields [`Step::NeedData`] for that page's location, and the
//! page is memoized once fed. A key at depth K therefore resolves in exactly
//! K rounds on a cold engine and in zero rounds afterwards.
//!
//! # URLs
//!
//! - `id:<n>` -- node `n` in the node map
//! - `sym:<n>` -- symbol `n` in the symbol map
//! - `path:` -- the repository root node
//! - `slice:<path>[<start>:<end>]` -- a location, returned as-is

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trellis_types::Location;

use crate::cache::EngineFactory;
use crate::engine::{Continuation, EngineError, Step, TrieEngine};

/// Deepest page tree a lookup will walk before declaring the index corrupt.
const MAX_DEPTH: usize = 64;

/// Contents of a build's root blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRoot {
    pub root_node_id: u64,
    pub nodemap: Location,
    pub symmap: Location,
}

impl BuildRoot {
    pub fn encode(&self) -> Result<Vec<u8>, EngineError> {
        bincode::serialize(self).map_err(|e| EngineError::Corrupt(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, EngineError> {
        bincode::deserialize(data).map_err(|e| EngineError::Corrupt(format!("build root: {e}")))
    }
}

/// One page of a map tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    /// `(first key, child page)` pairs.
    Branch(Vec<(u64, Location)>),
    /// `(key, data location)` pairs.
    Leaf(Vec<(u64, Location)>),
}

impl Page {
    pub fn encode(&self) -> Result<Vec<u8>, EngineError> {
        bincode::serialize(self).map_err(|e| EngineError::Corrupt(e.to_string()))
    }

    /// Decode a page, rejecting unsorted or duplicate keys.
    pub fn decode(data: &[u8]) -> Result<Self, EngineError> {
        let page: Page =
            bincode::deserialize(data).map_err(|e| EngineError::Corrupt(format!("page: {e}")))?;
        let entries = match &page {
            Page::Branch(entries) | Page::Leaf(entries) => entries,
        };
        if entries.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(EngineError::Corrupt("page keys out of order".into()));
        }
        Ok(page)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Href {
    Node(u64),
    Sym(u64),
    Root,
    Slice(Location),
}

fn parse_url(url: &str) -> Result<Href, EngineError> {
    if let Some(id) = url.strip_prefix("id:") {
        return id.parse().map(Href::Node).map_err(|_| EngineError::Malformed);
    }
    if let Some(id) = url.strip_prefix("sym:") {
        return id.parse().map(Href::Sym).map_err(|_| EngineError::Malformed);
    }
    if url == "path:" {
        return Ok(Href::Root);
    }
    if url.starts_with("slice:") {
        return url.parse().map(Href::Slice).map_err(|_| EngineError::Malformed);
    }
    Err(EngineError::Malformed)
}

/// Trie engine that walks [`Page`] trees, loading pages on demand.
#[derive(Debug)]
pub struct PagedTrie {
    root: BuildRoot,
    pages: HashMap<Location, Page>,
}

impl PagedTrie {
    pub fn new(root: BuildRoot) -> Self {
        Self {
            root,
            pages: HashMap::new(),
        }
    }

    /// Number of pages loaded so far.
    pub fn loaded_pages(&self) -> usize {
        self.pages.len()
    }

    fn lookup(&self, map_root: &Location, key: u64) -> Result<Step, EngineError> {
        let mut page_ref = map_root;
        for _ in 0..MAX_DEPTH {
            let Some(page) = self.pages.get(page_ref) else {
                return Ok(Step::NeedData(Continuation::new(page_ref.clone())));
            };
            match page {
                Page::Leaf(entries) => {
                    return entries
                        .binary_search_by_key(&key, |(k, _)| *k)
                        .map(|i| Step::Concrete(entries[i].1.clone()))
                        .map_err(|_| EngineError::KeyMissing);
                }
                Page::Branch(children) => {
                    let idx = children.partition_point(|(first, _)| *first <= key);
                    if idx == 0 {
                        return Err(EngineError::KeyMissing);
                    }
                    page_ref = &children[idx - 1].1;
                }
            }
        }
        Err(EngineError::Corrupt(format!(
            "page tree deeper than {MAX_DEPTH} levels"
        )))
    }
}

impl TrieEngine for PagedTrie {
    fn step(&mut self, url: &str) -> Result<Step, EngineError> {
        match parse_url(url)? {
            Href::Slice(location) => Ok(Step::Concrete(location)),
            Href::Node(id) => self.lookup(&self.root.nodemap, id),
            Href::Sym(id) => self.lookup(&self.root.symmap, id),
            Href::Root => self.lookup(&self.root.nodemap, self.root.root_node_id),
        }
    }

    fn feed(&mut self, need: &Continuation, data: &[u8]) -> Result<(), EngineError> {
        let page = Page::decode(data)?;
        self.pages.insert(need.location().clone(), page);
        Ok(())
    }
}

/// [`EngineFactory`] producing [`PagedTrie`] engines from [`BuildRoot`] blobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PagedTrieFactory;

impl EngineFactory for PagedTrieFactory {
    fn build(&self, _repo_id: &str, root: &[u8]) -> Result<Box<dyn TrieEngine>, EngineError> {
        Ok(Box::new(PagedTrie::new(BuildRoot::decode(root)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(path: &str, start: u64, end: u64) -> Location {
        Location::slice(path, start, end).unwrap()
    }

    fn engine() -> PagedTrie {
        PagedTrie::new(BuildRoot {
            root_node_id: 10,
            nodemap: loc("n/0", 0, 40),
            symmap: loc("s/0", 0, 20),
        })
    }

    fn expect_need(step: Step) -> Continuation {
        match step {
            Step::NeedData(need) => need,
            other => panic!("expected NeedData, got {other:?}"),
        }
    }

    #[test]
    fn url_grammar() {
        assert_eq!(parse_url("id:42"), Ok(Href::Node(42)));
        assert_eq!(parse_url("sym:7"), Ok(Href::Sym(7)));
        assert_eq!(parse_url("path:"), Ok(Href::Root));
        assert_eq!(parse_url("slice:f/1[2:3]"), Ok(Href::Slice(loc("f/1", 2, 3))));
        for bad in ["", "id:", "id:x", "sym:-1", "path:src/main.c", "slice:f/1", "node:1"] {
            assert_eq!(parse_url(bad), Err(EngineError::Malformed), "{bad:?}");
        }
    }

    #[test]
    fn slice_url_needs_no_data() {
        let mut e = engine();
        assert_eq!(
            e.step("slice:f/3[0:9]").unwrap(),
            Step::Concrete(loc("f/3", 0, 9))
        );
        assert_eq!(e.loaded_pages(), 0);
    }

    #[test]
    fn two_level_lookup_takes_two_rounds() {
        let mut e = engine();
        let leaf_a = Page::Leaf(vec![(1, loc("f/1", 0, 5)), (10, loc("f/1", 5, 9))]);
        let leaf_b = Page::Leaf(vec![(20, loc("f/2", 0, 3))]);
        let branch = Page::Branch(vec![(0, loc("n/1", 0, 30)), (20, loc("n/2", 0, 30))]);

        let need = expect_need(e.step("id:20").unwrap());
        assert_eq!(need.location(), &loc("n/0", 0, 40));
        e.feed(&need, &branch.encode().unwrap()).unwrap();

        let need = expect_need(e.step("id:20").unwrap());
        assert_eq!(need.location(), &loc("n/2", 0, 30));
        e.feed(&need, &leaf_b.encode().unwrap()).unwrap();

        assert_eq!(e.step("id:20").unwrap(), Step::Concrete(loc("f/2", 0, 3)));

        // Root node lives in the other leaf.
        let need = expect_need(e.step("path:").unwrap());
        assert_eq!(need.location(), &loc("n/1", 0, 30));
        e.feed(&need, &leaf_a.encode().unwrap()).unwrap();
        assert_eq!(e.step("path:").unwrap(), Step::Concrete(loc("f/1", 5, 9)));
        assert_eq!(e.loaded_pages(), 3);
    }

    #[test]
    fn missing_keys() {
        let mut e = engine();
        let need = expect_need(e.step("id:5").unwrap());
        e.feed(
            &need,
            &Page::Branch(vec![(3, loc("n/1", 0, 1))]).encode().unwrap(),
        )
        .unwrap();
        // Below the first child's first key.
        assert_eq!(e.step("id:1"), Err(EngineError::KeyMissing));

        let need = expect_need(e.step("id:5").unwrap());
        e.feed(&need, &Page::Leaf(vec![(3, loc("f/1", 0, 1))]).encode().unwrap())
            .unwrap();
        assert_eq!(e.step("id:5"), Err(EngineError::KeyMissing));
    }

    #[test]
    fn symbols_use_their_own_map() {
        let mut e = engine();
        let need = expect_need(e.step("sym:3").unwrap());
        assert_eq!(need.location(), &loc("s/0", 0, 20));
        e.feed(&need, &Page::Leaf(vec![(3, loc("f/7", 1, 2))]).encode().unwrap())
            .unwrap();
        assert_eq!(e.step("sym:3").unwrap(), Step::Concrete(loc("f/7", 1, 2)));
    }

    #[test]
    fn corrupt_pages_are_rejected() {
        let mut e = engine();
        let need = expect_need(e.step("id:1").unwrap());
        assert!(matches!(e.feed(&need, b"\xff\xff"), Err(EngineError::Corrupt(_))));

        let unsorted = Page::Leaf(vec![(5, loc("f/1", 0, 1)), (2, loc("f/1", 1, 2))]);
        assert!(matches!(
            e.feed(&need, &unsorted.encode().unwrap()),
            Err(EngineError::Corrupt(_))
        ));
        assert_eq!(e.loaded_pages(), 0);
    }

    #[test]
    fn self_referencing_branch_is_corrupt() {
        let mut e = engine();
        let need = expect_need(e.step("id:1").unwrap());
        let cyclic = Page::Branch(vec![(0, loc("n/0", 0, 40))]);
        e.feed(&need, &cyclic.encode().unwrap()).unwrap();
        assert!(matches!(e.step("id:1"), Err(EngineError::Corrupt(_))));
    }

    #[test]
    fn factory_decodes_root() {
        let root = BuildRoot {
            root_node_id: 1,
            nodemap: loc("n/0", 0, 1),
            symmap: loc("s/0", 0, 1),
        };
        let mut built = PagedTrieFactory.build("r", &root.encode().unwrap()).unwrap();
        let need = expect_need(built.step("path:").unwrap());
        assert_eq!(need.location(), &root.nodemap);

        assert!(PagedTrieFactory.build("r", b"").is_err());
    }
}
