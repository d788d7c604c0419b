//! Declarative bundle configuration (`config.yaml`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Secret name holding the HuggingFace access token, when the user
/// configured one.
pub const HF_ACCESS_TOKEN_SECRET_NAME: &str = "hf_access_token";

/// Which serving strategy the generated image runs.
///
/// Exactly one value per config. The specialized servers (TGI, vLLM) take a
/// short template-only assembly path; `TrellisServer` is the generic
/// framework-driven server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModelServer {
    #[default]
    #[serde(rename = "TrellisServer")]
    TrellisServer,
    #[serde(rename = "TGI")]
    Tgi,
    #[serde(rename = "VLLM")]
    Vllm,
}

/// Named model serialization framework, matched against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelFrameworkKind {
    /// User ships their own serialized artifacts; nothing is auto-detected.
    #[default]
    Custom,
    Safetensors,
    Gguf,
}

impl ModelFrameworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFrameworkKind::Custom => "custom",
            ModelFrameworkKind::Safetensors => "safetensors",
            ModelFrameworkKind::Gguf => "gguf",
        }
    }
}

/// Build-backend selection and its free-form argument map.
///
/// Arguments are an ordered (key-sorted) mapping; keys pass through to the
/// serving engine as `--key=value` flags with underscores converted to
/// hyphens. The `endpoint` key is reserved and consumed separately by the
/// specialized assembly paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BuildConfig {
    #[serde(default)]
    pub model_server: ModelServer,

    #[serde(default)]
    pub arguments: BTreeMap<String, serde_json::Value>,
}

/// Resource requirements for the serving container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default = "default_cpu")]
    pub cpu: String,

    #[serde(default = "default_memory")]
    pub memory: String,

    #[serde(default)]
    pub use_gpu: bool,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            cpu: default_cpu(),
            memory: default_memory(),
            use_gpu: false,
        }
    }
}

/// Custom base image override. When set, the base server's own requirements
/// are layered additively instead of replacing the image's install step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseImage {
    pub image: String,
}

/// A single externally hosted data file, materialized into the data dir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDataItem {
    pub url: String,

    /// Destination path, relative to the configured data directory.
    pub local_data_path: String,
}

/// One remote model repository to pre-fetch into the image's HF cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCacheEntry {
    pub repo_id: String,

    #[serde(default)]
    pub revision: Option<String>,

    #[serde(default)]
    pub allow_patterns: Option<Vec<String>>,

    #[serde(default)]
    pub ignore_patterns: Option<Vec<String>>,
}

/// Main bundle configuration, read from and rewritten to `config.yaml`.
///
/// Immutable once loaded; the assembler consumes it read-only and writes a
/// fully resolved copy into the build directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrellisConfig {
    #[serde(default)]
    pub model_framework: ModelFrameworkKind,

    /// Framework-reported artifact locations, merged in at build time so the
    /// runtime server can locate serialized binaries.
    #[serde(default)]
    pub model_metadata: BTreeMap<String, String>,

    /// Compact form, e.g. "py39"; normalized to "3.9" for templates.
    #[serde(default = "default_python_version")]
    pub python_version: String,

    #[serde(default)]
    pub base_image: Option<BaseImage>,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub system_packages: Vec<String>,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_bundled_packages_dir")]
    pub bundled_packages_dir: String,

    #[serde(default)]
    pub external_data: Vec<ExternalDataItem>,

    /// HF-cache: repositories whose files are pre-fetched during image build.
    #[serde(default)]
    pub model_cache: Vec<ModelCacheEntry>,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub resources: Resources,

    /// Run a control-plane process alongside the inference server.
    #[serde(default)]
    pub live_reload: bool,

    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            model_framework: ModelFrameworkKind::default(),
            model_metadata: BTreeMap::new(),
            python_version: default_python_version(),
            base_image: None,
            requirements: Vec::new(),
            system_packages: Vec::new(),
            data_dir: default_data_dir(),
            bundled_packages_dir: default_bundled_packages_dir(),
            external_data: Vec::new(),
            model_cache: Vec::new(),
            build: BuildConfig::default(),
            resources: Resources::default(),
            live_reload: false,
            secrets: BTreeMap::new(),
        }
    }
}

impl TrellisConfig {
    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Write the fully resolved configuration back out as YAML.
    pub fn write_yaml_file(&self, path: &Path) -> Result<()> {
        let raw = serde_yaml::to_string(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// HF access token from the secrets mapping, if configured.
    pub fn hf_access_token(&self) -> Option<&str> {
        self.secrets
            .get(HF_ACCESS_TOKEN_SECRET_NAME)
            .map(String::as_str)
    }
}

fn default_python_version() -> String {
    "py39".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_bundled_packages_dir() -> String {
    "packages".to_string()
}

fn default_cpu() -> String {
    "500m".to_string()
}

fn default_memory() -> String {
    "512Mi".to_string()
}
