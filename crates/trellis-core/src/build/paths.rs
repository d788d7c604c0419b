//! Fixed build-directory names and runtime-assets layout

use std::path::PathBuf;

/// Environment variable overriding the runtime-assets root.
pub const TRELLIS_RUNTIME_DIR_ENV: &str = "TRELLIS_RUNTIME_DIR";

/// All fixed on-disk names used by the assembler, plus the runtime-assets
/// root the server/control/shared code trees are copied from.
///
/// The names are a contract with the runtime server that reads the build
/// directory; they are collected here instead of being scattered as string
/// literals through the pipeline.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    runtime_root: PathBuf,
}

impl BuildPaths {
    pub const CONFIG_FILE: &'static str = "config.yaml";
    pub const REQUIREMENTS_TXT: &'static str = "requirements.txt";
    pub const SYSTEM_PACKAGES_TXT: &'static str = "system_packages.txt";
    pub const SERVER_REQUIREMENTS_TXT: &'static str = "server_requirements.txt";
    pub const BASE_SERVER_REQUIREMENTS_TXT: &'static str = "base_server_requirements.txt";
    pub const DOCKERFILE: &'static str = "Dockerfile";
    pub const PROXY_CONF: &'static str = "proxy.conf";
    pub const SUPERVISORD_CONF: &'static str = "supervisord.conf";
    pub const CACHE_WARMER: &'static str = "cache_warmer.py";
    pub const SERVER_DIR: &'static str = "server";
    pub const CONTROL_DIR: &'static str = "control";
    pub const SHARED_DIR_NAME: &'static str = "shared";

    pub fn new(runtime_root: impl Into<PathBuf>) -> Self {
        Self {
            runtime_root: runtime_root.into(),
        }
    }

    /// Resolve the runtime-assets root: explicit path, then the
    /// `TRELLIS_RUNTIME_DIR` environment variable, then the platform data
    /// directory.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        if let Some(root) = explicit {
            return Self::new(root);
        }
        if let Ok(from_env) = std::env::var(TRELLIS_RUNTIME_DIR_ENV) {
            let trimmed = from_env.trim();
            if !trimmed.is_empty() {
                return Self::new(PathBuf::from(trimmed));
            }
        }
        let root = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trellis")
            .join("runtime");
        Self::new(root)
    }

    pub fn runtime_root(&self) -> &PathBuf {
        &self.runtime_root
    }

    /// Core inference-server code tree.
    pub fn server_code_dir(&self) -> PathBuf {
        self.runtime_root.join("server")
    }

    /// Control-plane code tree used in live-reload mode.
    pub fn control_code_dir(&self) -> PathBuf {
        self.runtime_root.join("control")
    }

    /// Code shared between serving and training, nested under both trees.
    pub fn shared_code_dir(&self) -> PathBuf {
        self.runtime_root.join("shared")
    }

    /// Per-framework python requirements template.
    pub fn framework_requirements_file(&self, framework: &str) -> PathBuf {
        self.runtime_root
            .join("templates")
            .join(framework)
            .join(Self::REQUIREMENTS_TXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let paths = BuildPaths::resolve(Some(PathBuf::from("/opt/trellis")));
        assert_eq!(paths.runtime_root(), &PathBuf::from("/opt/trellis"));
    }

    #[test]
    fn derived_paths_hang_off_the_root() {
        let paths = BuildPaths::new("/opt/trellis");
        assert_eq!(paths.server_code_dir(), PathBuf::from("/opt/trellis/server"));
        assert_eq!(
            paths.framework_requirements_file("safetensors"),
            PathBuf::from("/opt/trellis/templates/safetensors/requirements.txt")
        );
    }
}
