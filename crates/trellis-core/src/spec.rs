//! Bundle spec: a bundle directory plus its parsed configuration

use std::path::{Path, PathBuf};

use crate::build::BuildPaths;
use crate::config::TrellisConfig;
use crate::error::{Error, Result};

/// A model bundle on disk together with its declarative config.
///
/// Created once per build invocation and read-only afterwards; all derived
/// text (requirements, system packages) is computed from the parsed config.
#[derive(Debug, Clone)]
pub struct BundleSpec {
    bundle_dir: PathBuf,
    config: TrellisConfig,
}

impl BundleSpec {
    /// Load the spec from a bundle directory containing `config.yaml`.
    pub fn from_dir(bundle_dir: impl Into<PathBuf>) -> Result<Self> {
        let bundle_dir = bundle_dir.into();
        let config_path = bundle_dir.join(BuildPaths::CONFIG_FILE);
        if !config_path.is_file() {
            return Err(Error::Config(format!(
                "no {} found in bundle directory {}",
                BuildPaths::CONFIG_FILE,
                bundle_dir.display()
            )));
        }
        let config = TrellisConfig::from_yaml_file(&config_path)?;
        Ok(Self { bundle_dir, config })
    }

    pub fn dir(&self) -> &Path {
        &self.bundle_dir
    }

    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Python requirements text: configured requirements plus any
    /// framework-declared dependencies not already listed, one per line.
    pub fn requirements_txt(&self, framework_deps: &[&str]) -> String {
        let mut lines: Vec<String> = self.config.requirements.clone();
        for dep in framework_deps {
            if !lines.iter().any(|line| line == dep) {
                lines.push((*dep).to_string());
            }
        }
        to_lines(&lines)
    }

    /// System (apt) packages text, one per line.
    pub fn system_packages_txt(&self) -> String {
        to_lines(&self.config.system_packages)
    }
}

fn to_lines(entries: &[String]) -> String {
    if entries.is_empty() {
        String::new()
    } else {
        format!("{}\n", entries.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn bundle_with_config(raw: &str) -> (tempfile::TempDir, BundleSpec) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), raw).unwrap();
        let spec = BundleSpec::from_dir(dir.path()).unwrap();
        (dir, spec)
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BundleSpec::from_dir(dir.path()).is_err());
    }

    #[test]
    fn requirements_merge_framework_deps_without_duplicates() {
        let (_dir, spec) = bundle_with_config(
            "requirements:\n  - numpy==1.24.0\n  - safetensors\n",
        );
        let text = spec.requirements_txt(&["safetensors", "torch"]);
        assert_eq!(text, "numpy==1.24.0\nsafetensors\ntorch\n");
    }

    #[test]
    fn empty_sections_produce_empty_text() {
        let (_dir, spec) = bundle_with_config("{}\n");
        assert_eq!(spec.requirements_txt(&[]), "");
        assert_eq!(spec.system_packages_txt(), "");
    }

    #[test]
    fn system_packages_one_per_line() {
        let (_dir, spec) = bundle_with_config("system_packages:\n  - ffmpeg\n  - libsndfile1\n");
        assert_eq!(spec.system_packages_txt(), "ffmpeg\nlibsndfile1\n");
    }
}
