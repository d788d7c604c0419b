//! Content hashing of a bundle directory

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::Result;

/// Compute a deterministic sha256 hash over a directory tree.
///
/// Files are visited in sorted relative-path order; both the relative path
/// and the file bytes feed the digest, so renames change the hash. Used as a
/// provenance layer in the rendered Dockerfile.
pub fn directory_content_hash(dir: &Path) -> Result<String> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(std::io::Error::from)?
        .into_iter()
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    let mut hasher = Sha256::new();
    for path in files {
        if let Ok(rel) = path.strip_prefix(dir) {
            hasher.update(rel.to_string_lossy().as_bytes());
        }
        hasher.update(fs::read(&path)?);
    }

    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}
