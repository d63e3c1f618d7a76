use crate::acquirers::{ContentEntry, FileListing};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Shallow repository signals forwarded to the LLM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepositoryStats {
    /// Number of entries visited
    pub files: u64,
    /// Whether a README was seen
    pub has_readme: bool,
    /// Whether anything test-related was seen
    pub has_tests: bool,
}

/// Computes statistics for an acquired listing.
///
/// The two listing kinds are matched differently. A local tree counts every file
/// below the root (outside `.git`) and recognizes a README by prefix. A remote
/// listing counts root entries only, directories included, and recognizes a
/// README anywhere in the name.
pub fn extract(listing: &FileListing) -> RepositoryStats {
    match listing {
        FileListing::LocalTree { root } => extract_local(root.path()),
        FileListing::RemoteListing { entries } => extract_remote(entries),
    }
}

/// Statistics for the root entries of a remote listing
pub fn extract_remote(entries: &[ContentEntry]) -> RepositoryStats {
    entries.iter().fold(RepositoryStats::default(), |mut stats, entry| {
        let name = entry.name.to_lowercase();
        stats.files += 1;
        stats.has_readme |= name.contains("readme");
        stats.has_tests |= name.contains("test");
        stats
    })
}

/// Statistics for every file of a local working tree
pub fn extract_local(root: &Path) -> RepositoryStats {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_git_dir(entry))
        // Unreadable entries are skipped rather than failing the request.
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .fold(RepositoryStats::default(), |mut stats, entry| {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            stats.files += 1;
            stats.has_readme |= name.starts_with("readme");
            stats.has_tests |= name.contains("test");
            stats
        })
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == ".git"
}
