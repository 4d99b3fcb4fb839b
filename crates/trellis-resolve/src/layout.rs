//! Blob path layout of a published build.
//!
//! - `builds/<repo>/<build>` -- the build's trie root blob
//! - `nodes/<repo>/...` -- node data and index pages, shared by all builds of a repo
//! - `search/<repo>/<build>/trie` -- the build's search trie

/// Path of the trie root blob for a build.
pub fn root_blob_path(repo_id: &str, build_id: &str) -> String {
    format!("builds/{repo_id}/{build_id}")
}

/// Namespace that node-data locations are resolved against.
pub fn node_prefix(repo_id: &str) -> String {
    format!("nodes/{repo_id}")
}

/// Path of the search trie blob for a build.
pub fn search_trie_path(repo_id: &str, build_id: &str) -> String {
    format!("search/{repo_id}/{build_id}/trie")
}
