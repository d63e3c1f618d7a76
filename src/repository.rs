//! Repository identifiers.
//!
//! A [`RepositoryReference`] is derived from whatever the caller sent: a full
//! hosting URL (`https://github.com/owner/name`), the same with a trailing slash,
//! or a bare `owner/name`. Parsing happens before any acquisition so malformed
//! input never reaches the network or the filesystem.

use crate::error::{AnalyzerError, Result};
use crate::utils::normalize_repo_input;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Normalized owner and repository name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryReference {
    owner: String,
    name: String,
    url: String,
}

impl RepositoryReference {
    /// Parses a repository URL into its owner and name.
    ///
    /// Trailing slashes are ignored and the last two path segments are taken;
    /// empty, `.` and `..` segments are rejected. For absolute URLs only the
    /// path counts, so `https://github.com/acme` is rejected rather than read
    /// as owner `github.com`.
    pub fn parse(input: &str) -> Result<Self> {
        let url = normalize_repo_input(input);
        if url.is_empty() {
            return Err(AnalyzerError::InvalidInput(
                "Repository URL must not be empty".to_string(),
            ));
        }

        let parsed = Url::parse(url).ok().filter(Url::has_host);
        let segments: Vec<&str> = match &parsed {
            Some(parsed) => parsed
                .path_segments()
                .map(|segments| segments.collect())
                .unwrap_or_default(),
            None => url.split('/').collect(),
        };

        match segments.as_slice() {
            [.., owner, name] if is_path_segment(owner) && is_path_segment(name) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
                url: url.to_string(),
            }),
            _ => Err(AnalyzerError::InvalidInput(format!(
                "Expected a repository URL of the form https://host/owner/repo, got '{}'",
                url
            ))),
        }
    }

    /// Repository owner (user or organization)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The URL as supplied, trimmed and without trailing slashes
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `owner/name`, the form hosting APIs expect
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".."
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
