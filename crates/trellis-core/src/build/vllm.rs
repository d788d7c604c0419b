//! Specialized build path for the vLLM serving engine

use std::fs;
use std::path::Path;

use tracing::info;

use super::paths::BuildPaths;
use super::util;
use crate::config::TrellisConfig;
use crate::error::{Error, Result};
use crate::template::TemplateEngine;

/// Exposed endpoint selector -> vLLM OpenAI-compatible server path.
const SERVER_ENDPOINTS: &[(&str, &str)] = &[
    ("Completions", "/v1/completions"),
    ("ChatCompletions", "/v1/chat/completions"),
];

pub(crate) fn create_vllm_build_dir(
    engine: &TemplateEngine,
    config: &TrellisConfig,
    build_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(build_dir)?;
    info!("Assembling vLLM build context in {}", build_dir.display());

    let mut args = config.build.arguments.clone();
    // Unlike TGI there is no default: a missing endpoint fails closed.
    let endpoint = args
        .remove("endpoint")
        .ok_or(Error::MissingBuildArgument("endpoint"))?;
    let endpoint = util::scalar_to_string("endpoint", &endpoint)?;
    let server_endpoint = SERVER_ENDPOINTS
        .iter()
        .find(|(name, _)| *name == endpoint)
        .map(|(_, path)| *path)
        .ok_or_else(|| {
            Error::InvalidBuildArgument(format!("unknown vLLM endpoint '{endpoint}'"))
        })?;

    let hf_access_token = config.hf_access_token();
    let dockerfile = engine.render(
        "vllm/Dockerfile",
        minijinja::context! { hf_access_token },
    )?;
    fs::write(build_dir.join(BuildPaths::DOCKERFILE), dockerfile)?;

    let proxy = engine.render(
        "vllm/proxy.conf",
        minijinja::context! { server_endpoint },
    )?;
    fs::write(build_dir.join(BuildPaths::PROXY_CONF), proxy)?;

    let extra_args = util::flatten_build_arguments(&args)?;
    let supervisord = engine.render(
        "vllm/supervisord.conf",
        minijinja::context! { extra_args },
    )?;
    fs::write(build_dir.join(BuildPaths::SUPERVISORD_CONF), supervisord)?;

    Ok(())
}
