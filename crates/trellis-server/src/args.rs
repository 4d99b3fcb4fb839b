//! Query arguments of the resolution endpoints.
//!
//! Every field is optional at the extractor so that missing and malformed
//! arguments are reported the same way, as a 400 from [`ServerError`].

use serde::Deserialize;
use trellis_types::BuildRef;

use crate::error::{ServerError, ServerResult};

fn require<'a>(name: &'static str, value: &'a Option<String>) -> ServerResult<&'a str> {
    value.as_deref().ok_or(ServerError::MissingArgument(name))
}

fn build_ref(
    repo_id: &Option<String>,
    branch: &Option<String>,
    build_id: &Option<String>,
) -> ServerResult<BuildRef> {
    Ok(BuildRef::parse(
        require("repo_id", repo_id)?,
        require("branch", branch)?,
        require("build_id", build_id)?,
    )?)
}

/// `repo_id`, `branch`, `build_id`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BuildArgs {
    pub repo_id: Option<String>,
    pub branch: Option<String>,
    pub build_id: Option<String>,
}

impl BuildArgs {
    pub fn build_ref(&self) -> ServerResult<BuildRef> {
        build_ref(&self.repo_id, &self.branch, &self.build_id)
    }
}

/// Arguments of `/api/resolve`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResolveArgs {
    pub repo_id: Option<String>,
    pub branch: Option<String>,
    pub build_id: Option<String>,
    pub url: Option<String>,
    pub action: Option<String>,
}

impl ResolveArgs {
    pub fn url(&self) -> ServerResult<&str> {
        require("url", &self.url)
    }

    pub fn build_ref(&self) -> ServerResult<BuildRef> {
        build_ref(&self.repo_id, &self.branch, &self.build_id)
    }

    pub fn action(&self) -> ServerResult<Action> {
        self.action.as_deref().unwrap_or("resolve").parse()
    }
}

/// What `/api/resolve` does with the resolved location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Return the location wire string.
    Resolve,
    /// Return the bytes stored at the location.
    Relay,
}

impl std::str::FromStr for Action {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resolve" => Ok(Self::Resolve),
            "relay" => Ok(Self::Relay),
            other => Err(ServerError::BadAction(other.to_string())),
        }
    }
}
