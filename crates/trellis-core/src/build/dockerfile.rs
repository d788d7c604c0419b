//! Final Dockerfile rendering for the generic serving path

use std::fs;
use std::path::Path;

use tracing::debug;

use super::paths::BuildPaths;
use super::util;
use crate::config::TrellisConfig;
use crate::error::Result;
use crate::hash::directory_content_hash;
use crate::hub::RemoteModelManifest;
use crate::template::TemplateEngine;

/// Pinned version tag of the trellis base images.
pub const BASE_IMAGE_VERSION_TAG: &str = "v0.7.1";

/// Derived base image name for a given job type ("server", "training").
pub fn base_image_name(job_type: &str) -> String {
    format!("trellisml/trellis-{job_type}-base")
}

/// Derived base image tag from the dotted python version and GPU flag.
pub fn base_image_tag(python_version: &str, use_gpu: bool, version_tag: &str) -> String {
    if use_gpu {
        format!("{python_version}-gpu-{version_tag}")
    } else {
        format!("{python_version}-{version_tag}")
    }
}

/// Render the single Dockerfile into `build_dir`.
///
/// All decisions are resolved here into a flat variable set; the template
/// performs no filesystem checks of its own.
pub(crate) fn render_dockerfile(
    engine: &TemplateEngine,
    config: &TrellisConfig,
    bundle_dir: &Path,
    build_dir: &Path,
    should_install_server_requirements: bool,
    models: &RemoteModelManifest,
    use_hf_secret: bool,
) -> Result<()> {
    let python_version = util::to_dotted_python_version(&config.python_version)?;
    let base_image_name_and_tag = match &config.base_image {
        Some(base) => base.image.clone(),
        None => format!(
            "{}:{}",
            base_image_name("server"),
            base_image_tag(
                &python_version,
                config.resources.use_gpu,
                BASE_IMAGE_VERSION_TAG
            )
        ),
    };

    let should_install_system_requirements =
        util::file_is_not_empty(&build_dir.join(BuildPaths::SYSTEM_PACKAGES_TXT));
    let should_install_requirements =
        util::file_is_not_empty(&build_dir.join(BuildPaths::REQUIREMENTS_TXT));
    let data_dir_exists = build_dir.join(&config.data_dir).exists();
    let bundled_packages_dir_exists = build_dir.join(&config.bundled_packages_dir).exists();
    let bundle_hash = directory_content_hash(bundle_dir)?;
    debug!("Rendering Dockerfile with base image {base_image_name_and_tag}");

    let contents = engine.render(
        "server.Dockerfile",
        minijinja::context! {
            base_image_name_and_tag,
            python_version,
            should_install_server_requirements,
            should_install_system_requirements,
            should_install_requirements,
            live_reload => config.live_reload,
            data_dir => config.data_dir,
            data_dir_exists,
            bundled_packages_dir => config.bundled_packages_dir,
            bundled_packages_dir_exists,
            bundle_hash,
            models,
            use_hf_secret,
        },
    )?;
    fs::write(build_dir.join(BuildPaths::DOCKERFILE), contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_flag_selects_gpu_tag() {
        assert_eq!(base_image_tag("3.9", true, "v1"), "3.9-gpu-v1");
        assert_eq!(base_image_tag("3.9", false, "v1"), "3.9-v1");
    }

    #[test]
    fn job_type_feeds_the_image_name() {
        assert_eq!(base_image_name("server"), "trellisml/trellis-server-base");
    }
}
