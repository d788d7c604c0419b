//! Specialized build path for the TGI serving engine
//!
//! Renders exactly three files into the build directory: the Dockerfile,
//! the reverse-proxy config, and the process-supervisor config. The generic
//! copy/resolve steps never run here.

use std::fs;
use std::path::Path;

use tracing::info;

use super::paths::BuildPaths;
use super::util;
use crate::config::TrellisConfig;
use crate::error::Result;
use crate::template::TemplateEngine;

/// TGI defaults a missing `endpoint` argument; vLLM requires one.
const DEFAULT_ENDPOINT: &str = "generate_stream";

pub(crate) fn create_tgi_build_dir(
    engine: &TemplateEngine,
    config: &TrellisConfig,
    build_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(build_dir)?;
    info!("Assembling TGI build context in {}", build_dir.display());

    let hf_access_token = config.hf_access_token();
    let dockerfile = engine.render(
        "tgi/Dockerfile",
        minijinja::context! { hf_access_token },
    )?;
    fs::write(build_dir.join(BuildPaths::DOCKERFILE), dockerfile)?;

    let mut args = config.build.arguments.clone();
    let endpoint = match args.remove("endpoint") {
        Some(value) => util::scalar_to_string("endpoint", &value)?,
        None => DEFAULT_ENDPOINT.to_string(),
    };
    let proxy = engine.render("tgi/proxy.conf", minijinja::context! { endpoint })?;
    fs::write(build_dir.join(BuildPaths::PROXY_CONF), proxy)?;

    let extra_args = util::flatten_build_arguments(&args)?;
    let supervisord = engine.render(
        "tgi/supervisord.conf",
        minijinja::context! { extra_args },
    )?;
    fs::write(build_dir.join(BuildPaths::SUPERVISORD_CONF), supervisord)?;

    Ok(())
}
