use crate::config::{AcquisitionStrategy, Config};
use crate::error::Result;
use crate::repository::RepositoryReference;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Module for shallow local clones
pub mod clone;
/// Module for hosting-provider directory listings
pub mod github;

pub use clone::CloneAcquirer;
pub use github::GitHubListingAcquirer;

/// Interface for repository acquisition strategies
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceAcquirer: Send + Sync {
    /// Returns the name of the strategy
    fn name(&self) -> &'static str;
    /// Obtains a view of the repository's file tree
    async fn acquire(&self, reference: &RepositoryReference) -> Result<FileListing>;
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// File or directory name
    pub name: String,
    /// Entry type as reported by the provider (`file`, `dir`, `symlink`, `submodule`)
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ContentEntry {
    /// Creates an entry with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }
}

/// An acquired view of a repository, consumed by the statistics extractor
///
/// A `LocalTree` owns its checkout directory; dropping the listing removes it.
#[derive(Debug)]
pub enum FileListing {
    /// Full working tree of a shallow clone
    LocalTree {
        /// Scoped checkout directory
        root: TempDir,
    },
    /// Root directory entries reported by the hosting provider
    RemoteListing {
        /// Entries of the repository root
        entries: Vec<ContentEntry>,
    },
}

impl FileListing {
    /// Root of the local checkout, if this is a clone
    pub fn local_root(&self) -> Option<&Path> {
        match self {
            Self::LocalTree { root } => Some(root.path()),
            Self::RemoteListing { .. } => None,
        }
    }
}

/// Factory for creating the configured acquisition strategy
pub struct AcquirerFactory;

impl AcquirerFactory {
    /// Creates the acquirer selected by `config.strategy`
    pub fn create(config: &Config) -> Result<Arc<dyn SourceAcquirer>> {
        Self::create_for(config.strategy, config)
    }

    /// Creates the acquirer for an explicit strategy
    pub fn create_for(strategy: AcquisitionStrategy, config: &Config) -> Result<Arc<dyn SourceAcquirer>> {
        Ok(match strategy {
            AcquisitionStrategy::Remote => Arc::new(GitHubListingAcquirer::new(&config.github)?),
            AcquisitionStrategy::Clone => Arc::new(CloneAcquirer::new(&config.clone)),
        })
    }
}
