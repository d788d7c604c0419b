//! Remote model repository listing and glob filtering

use std::collections::BTreeMap;

use glob::Pattern;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Resolved file list for one repository, keyed by repo id in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoFiles {
    pub files: Vec<String>,
    pub revision: Option<String>,
}

/// Mapping from repository id to its filtered file list and revision.
/// Only populated when the config declares a model cache; consumed by the
/// Dockerfile renderer to emit cache-warming instructions.
pub type RemoteModelManifest = BTreeMap<String, RepoFiles>;

/// Seam over the remote file-listing service. One synchronous request per
/// repository entry; failures propagate, they are never swallowed.
pub trait RepoFileLister {
    fn list_files(&self, repo_id: &str, revision: Option<&str>) -> Result<Vec<String>>;
}

/// Listing client backed by the HuggingFace Hub API.
pub struct HubLister {
    api: Api,
}

impl HubLister {
    pub fn new() -> Result<Self> {
        let api = Api::new().map_err(|e| Error::Hub(e.to_string()))?;
        Ok(Self { api })
    }
}

impl RepoFileLister for HubLister {
    fn list_files(&self, repo_id: &str, revision: Option<&str>) -> Result<Vec<String>> {
        let repo = match revision {
            Some(rev) => self.api.repo(Repo::with_revision(
                repo_id.to_string(),
                RepoType::Model,
                rev.to_string(),
            )),
            None => self.api.model(repo_id.to_string()),
        };
        debug!("Listing files for {} (revision {:?})", repo_id, revision);
        let info = repo.info().map_err(|e| Error::RemoteListing {
            repo: repo_id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(info
            .siblings
            .into_iter()
            .map(|sibling| sibling.rfilename)
            .collect())
    }
}

/// Filter a raw repository listing through allow then ignore glob patterns.
///
/// Single pass over the full listing: a path is kept iff it matches at least
/// one allow pattern (or no allow patterns were given) and matches no ignore
/// pattern. `*` matches across path separators, like the hub's own filter.
pub fn filter_repo_files(
    paths: Vec<String>,
    allow_patterns: Option<&[String]>,
    ignore_patterns: Option<&[String]>,
) -> Result<Vec<String>> {
    let allow = allow_patterns.map(compile_patterns).transpose()?;
    let ignore = ignore_patterns
        .map(compile_patterns)
        .transpose()?
        .unwrap_or_default();

    Ok(paths
        .into_iter()
        .filter(|path| {
            let allowed = allow
                .as_ref()
                .map(|patterns| patterns.iter().any(|p| p.matches(path)))
                .unwrap_or(true);
            allowed && !ignore.iter().any(|p| p.matches(path))
        })
        .collect())
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|raw| {
            Pattern::new(raw)
                .map_err(|e| Error::Config(format!("invalid glob pattern '{raw}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<String> {
        vec![
            "config.json".to_string(),
            "model.safetensors".to_string(),
            "tokenizer/vocab.json".to_string(),
            "weights/pytorch_model.bin".to_string(),
        ]
    }

    #[test]
    fn no_patterns_keeps_everything() {
        let filtered = filter_repo_files(listing(), None, None).unwrap();
        assert_eq!(filtered, listing());
    }

    #[test]
    fn allow_patterns_match_across_separators() {
        let allow = vec!["*.json".to_string()];
        let filtered = filter_repo_files(listing(), Some(&allow), None).unwrap();
        assert_eq!(filtered, vec!["config.json", "tokenizer/vocab.json"]);
    }

    #[test]
    fn ignore_applies_after_allow() {
        let allow = vec!["*.json".to_string()];
        let ignore = vec!["tokenizer/*".to_string()];
        let filtered = filter_repo_files(listing(), Some(&allow), Some(&ignore)).unwrap();
        assert_eq!(filtered, vec!["config.json"]);
    }

    #[test]
    fn ignore_alone_removes_matches() {
        let ignore = vec!["*.bin".to_string()];
        let filtered = filter_repo_files(listing(), None, Some(&ignore)).unwrap();
        assert_eq!(
            filtered,
            vec!["config.json", "model.safetensors", "tokenizer/vocab.json"]
        );
    }

    #[test]
    fn result_is_a_subset_of_the_listing() {
        let allow = vec!["*.safetensors".to_string(), "*.json".to_string()];
        let raw = listing();
        let filtered = filter_repo_files(raw.clone(), Some(&allow), None).unwrap();
        assert!(filtered.iter().all(|f| raw.contains(f)));
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let allow = vec!["[".to_string()];
        assert!(filter_repo_files(listing(), Some(&allow), None).is_err());
    }
}
