//! Build-directory assembly
//!
//! Turns a model bundle into a hermetic container build context. One
//! invocation owns the build directory for its whole lifetime; the pipeline
//! is synchronous and run-to-completion, with no rollback on failure.

pub mod dockerfile;
mod external_data;
pub mod paths;
mod tgi;
mod util;
mod vllm;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::config::{ModelServer, TrellisConfig};
use crate::error::Result;
use crate::framework::{FrameworkRegistry, ModelFramework};
use crate::hub::{filter_repo_files, HubLister, RemoteModelManifest, RepoFileLister, RepoFiles};
use crate::spec::BundleSpec;
use crate::template::{TemplateEngine, CACHE_WARMER_SOURCE};

pub use self::paths::BuildPaths;
pub use self::util::{
    copy_tree_or_file, copy_tree_path, file_is_not_empty, to_dotted_python_version,
};

/// Assembles the container build context for one model bundle.
pub struct ImageBuilder {
    spec: BundleSpec,
    paths: BuildPaths,
    registry: FrameworkRegistry,
    engine: TemplateEngine,
    lister: Option<Box<dyn RepoFileLister>>,
}

impl ImageBuilder {
    pub fn new(bundle_dir: impl Into<PathBuf>, paths: BuildPaths) -> Result<Self> {
        let spec = BundleSpec::from_dir(bundle_dir)?;
        Ok(Self {
            spec,
            paths,
            registry: FrameworkRegistry::with_defaults(),
            engine: TemplateEngine::new(),
            lister: None,
        })
    }

    /// Replace the remote file lister (tests stub the network here).
    pub fn with_lister(mut self, lister: Box<dyn RepoFileLister>) -> Self {
        self.lister = Some(lister);
        self
    }

    pub fn spec(&self) -> &BundleSpec {
        &self.spec
    }

    /// Suggested image tag for the assembled context.
    pub fn default_tag(&self) -> String {
        format!(
            "{}-model:latest",
            self.spec.config().model_framework.as_str()
        )
    }

    /// Prepare a directory for building the serving image from.
    ///
    /// A caller-supplied directory is created if absent but its contents are
    /// not purged; files are overwritten individually. When no directory is
    /// given, a fresh per-invocation directory is created under the system
    /// temp dir, so stale content is never silently reused.
    pub fn prepare_build_dir(
        &self,
        build_dir: Option<PathBuf>,
        use_hf_secret: bool,
    ) -> Result<PathBuf> {
        let build_dir = match build_dir {
            Some(dir) => {
                fs::create_dir_all(&dir)?;
                dir
            }
            None => self.fresh_build_dir()?,
        };

        // Exactly one serving-backend path runs per invocation. The
        // specialized engines render their three files and return; only the
        // generic server takes the full copy/resolve pipeline.
        match self.spec.config().build.model_server {
            ModelServer::Tgi => {
                tgi::create_tgi_build_dir(&self.engine, self.spec.config(), &build_dir)?;
            }
            ModelServer::Vllm => {
                vllm::create_vllm_build_dir(&self.engine, self.spec.config(), &build_dir)?;
            }
            ModelServer::TrellisServer => {
                self.prepare_generic(&build_dir, use_hf_secret)?;
            }
        }
        Ok(build_dir)
    }

    fn fresh_build_dir(&self) -> Result<PathBuf> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let dir = std::env::temp_dir().join("trellis").join(format!(
            "{}-{stamp}",
            self.spec.config().model_framework.as_str()
        ));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Config as written into the build directory: the bundle config with
    /// framework-reported metadata merged in. User-set metadata wins.
    fn resolved_config(&self, framework: Option<&dyn ModelFramework>) -> TrellisConfig {
        let mut config = self.spec.config().clone();
        if let Some(framework) = framework {
            for (key, value) in framework.metadata() {
                config.model_metadata.entry(key).or_insert(value);
            }
        }
        config
    }

    fn prepare_generic(&self, build_dir: &Path, use_hf_secret: bool) -> Result<()> {
        let framework = self
            .registry
            .by_name(self.spec.config().model_framework.as_str());
        let config = self.resolved_config(framework);
        info!(
            "Assembling build context for {} in {}",
            self.spec.dir().display(),
            build_dir.display()
        );

        // Copy the bundle itself, then overwrite its config with the fully
        // resolved one.
        util::copy_tree_path(self.spec.dir(), build_dir)?;
        config.write_yaml_file(&build_dir.join(BuildPaths::CONFIG_FILE))?;

        let data_dir = build_dir.join(&config.data_dir);
        external_data::download_external_data(&config.external_data, &data_dir)?;

        let mut models: RemoteModelManifest = BTreeMap::new();
        if !config.model_cache.is_empty() {
            fs::write(build_dir.join(BuildPaths::CACHE_WARMER), CACHE_WARMER_SOURCE)?;
            let fallback;
            let lister: &dyn RepoFileLister = match self.lister.as_deref() {
                Some(lister) => lister,
                None => {
                    fallback = HubLister::new()?;
                    &fallback
                }
            };
            for entry in &config.model_cache {
                let listed = lister.list_files(&entry.repo_id, entry.revision.as_deref())?;
                let files = filter_repo_files(
                    listed,
                    entry.allow_patterns.as_deref(),
                    entry.ignore_patterns.as_deref(),
                )?;
                debug!("Resolved {} files for {}", files.len(), entry.repo_id);
                models.insert(
                    entry.repo_id.clone(),
                    RepoFiles {
                        files,
                        revision: entry.revision.clone(),
                    },
                );
            }
        }

        // Inference server code, with the shared serving/training tree
        // nested inside it.
        let server_dir = build_dir.join(BuildPaths::SERVER_DIR);
        util::copy_tree_or_file(&self.paths.server_code_dir(), &server_dir)?;
        util::copy_tree_or_file(
            &self.paths.shared_code_dir(),
            &server_dir.join(BuildPaths::SHARED_DIR_NAME),
        )?;

        if config.live_reload {
            let control_dir = build_dir.join(BuildPaths::CONTROL_DIR);
            util::copy_tree_or_file(&self.paths.control_code_dir(), &control_dir)?;
            util::copy_tree_or_file(
                &self.paths.shared_code_dir(),
                &control_dir
                    .join(BuildPaths::CONTROL_DIR)
                    .join(BuildPaths::SHARED_DIR_NAME),
            )?;
        }

        // With a custom base image the server's own requirements are layered
        // additively under a distinct name.
        if config.base_image.is_some() {
            util::copy_tree_or_file(
                &self.paths.server_code_dir().join(BuildPaths::REQUIREMENTS_TXT),
                &build_dir.join(BuildPaths::BASE_SERVER_REQUIREMENTS_TXT),
            )?;
        }

        let framework_reqs = self
            .paths
            .framework_requirements_file(config.model_framework.as_str());
        let should_install_server_requirements = util::file_is_not_empty(&framework_reqs);
        if should_install_server_requirements {
            util::copy_tree_or_file(
                &framework_reqs,
                &build_dir.join(BuildPaths::SERVER_REQUIREMENTS_TXT),
            )?;
        }

        let framework_deps = framework.map(|f| f.required_dependencies()).unwrap_or(&[]);
        fs::write(
            build_dir.join(BuildPaths::REQUIREMENTS_TXT),
            self.spec.requirements_txt(framework_deps),
        )?;
        fs::write(
            build_dir.join(BuildPaths::SYSTEM_PACKAGES_TXT),
            self.spec.system_packages_txt(),
        )?;

        dockerfile::render_dockerfile(
            &self.engine,
            &config,
            self.spec.dir(),
            build_dir,
            should_install_server_requirements,
            &models,
            use_hf_secret,
        )
    }
}
