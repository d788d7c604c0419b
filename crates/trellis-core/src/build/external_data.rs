//! Materialize externally hosted data files into the data directory

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::config::ExternalDataItem;
use crate::error::{Error, Result};

// Large model artifacts can take a while.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(3600);

/// Fetches one remote blob by URL. Tests stub the network here.
pub trait BlobFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher with a long per-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| Error::ExternalData(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl BlobFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::ExternalData(format!("request failed for {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::ExternalData(format!(
                "HTTP {} for {url}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .map_err(|e| Error::ExternalData(format!("failed to read {url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Download every declared external data file into `data_dir`, sequentially.
/// Failures propagate; there is no retry here.
pub fn download_external_data(items: &[ExternalDataItem], data_dir: &Path) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    fetch_external_data(&HttpFetcher::new()?, items, data_dir)
}

pub(crate) fn fetch_external_data(
    fetcher: &dyn BlobFetcher,
    items: &[ExternalDataItem],
    data_dir: &Path,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    fs::create_dir_all(data_dir)?;

    for item in items {
        let dest = data_dir.join(&item.local_data_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Downloading external data from {}", item.url);
        let bytes = fetcher.fetch(&item.url)?;
        fs::write(&dest, &bytes)?;
        info!("Fetched {} ({} bytes)", item.local_data_path, bytes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticFetcher(&'static [u8]);

    impl BlobFetcher for StaticFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.0.to_vec())
        }
    }

    struct FailingFetcher;

    impl BlobFetcher for FailingFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(Error::ExternalData(format!("HTTP 503 for {url}")))
        }
    }

    fn item(url: &str, local_data_path: &str) -> ExternalDataItem {
        ExternalDataItem {
            url: url.to_string(),
            local_data_path: local_data_path.to_string(),
        }
    }

    #[test]
    fn no_items_leaves_data_dir_untouched() {
        let scratch = tempfile::tempdir().unwrap();
        let data_dir = scratch.path().join("data");
        download_external_data(&[], &data_dir).unwrap();
        assert!(!data_dir.exists());
    }

    #[test]
    fn nested_local_paths_get_their_parents_created() {
        let scratch = tempfile::tempdir().unwrap();
        let data_dir = scratch.path().join("data");
        let items = [item("https://example.com/w.bin", "weights/shard-0/w.bin")];
        fetch_external_data(&StaticFetcher(b"abc"), &items, &data_dir).unwrap();
        assert_eq!(
            fs::read(data_dir.join("weights/shard-0/w.bin")).unwrap(),
            b"abc"
        );
    }

    #[test]
    fn fetch_failure_propagates() {
        let scratch = tempfile::tempdir().unwrap();
        let data_dir = scratch.path().join("data");
        let items = [item("https://example.com/w.bin", "w.bin")];
        let err = fetch_external_data(&FailingFetcher, &items, &data_dir).unwrap_err();
        assert!(matches!(err, Error::ExternalData(_)));
        assert!(!data_dir.join("w.bin").exists());
    }
}
