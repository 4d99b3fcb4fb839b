//! Build addressing and boundary identifier validation.
//!
//! Repository and build identifiers arrive from untrusted request arguments
//! and are spliced directly into blob paths, so they must be single, plain
//! path segments:
//! - Must be non-empty
//! - Must not contain `.` (no `..` traversal, no hidden names)
//! - Must not contain `/` (no extra path components)
//!
//! Branch names legitimately contain `/`; they travel encoded with `~` in
//! its place and are decoded on arrival.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Characters that are forbidden anywhere in a boundary identifier.
const FORBIDDEN_CHARS: &[char] = &['.', '/'];

/// Validate a boundary identifier, returning it unchanged if it is safe to use
/// as a blob path segment.
///
/// # Examples
///
/// ```
/// use trellis_types::validate_identifier;
///
/// assert!(validate_identifier("repo_id", "repo1").is_ok());
/// assert!(validate_identifier("repo_id", "..").is_err());
/// assert!(validate_identifier("build_id", "a/b").is_err());
/// ```
pub fn validate_identifier<'a>(name: &str, value: &'a str) -> Result<&'a str, TypeError> {
    if value.is_empty() {
        return Err(TypeError::BadArgument {
            name: name.to_string(),
            reason: "must not be empty".into(),
        });
    }
    if let Some(ch) = value.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(TypeError::BadArgument {
            name: name.to_string(),
            reason: format!("contains forbidden character: {ch:?}"),
        });
    }
    Ok(value)
}

/// Encode a branch name into a single path segment (`/` becomes `~`).
pub fn encode_branch(branch: &str) -> String {
    branch.replace('/', "~")
}

/// Decode a branch name produced by [`encode_branch`].
pub fn decode_branch(branch: &str) -> String {
    branch.replace('~', "/")
}

/// A build addressed by repository, branch, and build identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildRef {
    pub repo_id: String,
    pub branch: String,
    pub build_id: String,
}

impl BuildRef {
    /// Validate raw request arguments and assemble a build reference.
    ///
    /// `repo_id` and `build_id` are checked with [`validate_identifier`];
    /// `branch` is decoded with [`decode_branch`].
    pub fn parse(repo_id: &str, branch: &str, build_id: &str) -> Result<Self, TypeError> {
        Ok(Self {
            repo_id: validate_identifier("repo_id", repo_id)?.to_string(),
            branch: decode_branch(branch),
            build_id: validate_identifier("build_id", build_id)?.to_string(),
        })
    }
}
