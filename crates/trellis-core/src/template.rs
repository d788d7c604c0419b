//! Template rendering over minijinja with compiled-in sources

use minijinja::Environment;
use serde::Serialize;

use crate::error::{Error, Result};

const SERVER_DOCKERFILE: &str = include_str!("../templates/server.Dockerfile.jinja");
const TGI_DOCKERFILE: &str = include_str!("../templates/tgi/Dockerfile.jinja");
const TGI_PROXY_CONF: &str = include_str!("../templates/tgi/proxy.conf.jinja");
const TGI_SUPERVISORD_CONF: &str = include_str!("../templates/tgi/supervisord.conf.jinja");
const VLLM_DOCKERFILE: &str = include_str!("../templates/vllm/Dockerfile.jinja");
const VLLM_PROXY_CONF: &str = include_str!("../templates/vllm/proxy.conf.jinja");
const VLLM_SUPERVISORD_CONF: &str = include_str!("../templates/vllm/supervisord.conf.jinja");

/// Fixed cache-warming helper script copied into generic build directories.
pub const CACHE_WARMER_SOURCE: &str = include_str!("../templates/cache_warmer.py");

/// A wrapper around minijinja for rendering the build-context templates.
///
/// Templates are embedded at compile time and rendered by id; a render
/// failure always names the template that failed.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    fn source(template: &str) -> Option<&'static str> {
        match template {
            "server.Dockerfile" => Some(SERVER_DOCKERFILE),
            "tgi/Dockerfile" => Some(TGI_DOCKERFILE),
            "tgi/proxy.conf" => Some(TGI_PROXY_CONF),
            "tgi/supervisord.conf" => Some(TGI_SUPERVISORD_CONF),
            "vllm/Dockerfile" => Some(VLLM_DOCKERFILE),
            "vllm/proxy.conf" => Some(VLLM_PROXY_CONF),
            "vllm/supervisord.conf" => Some(VLLM_SUPERVISORD_CONF),
            _ => None,
        }
    }

    pub fn render(&self, template: &str, ctx: impl Serialize) -> Result<String> {
        let source = Self::source(template).ok_or_else(|| Error::TemplateRender {
            template: template.to_string(),
            reason: "unknown template id".to_string(),
        })?;
        self.env
            .render_str(source, ctx)
            .map_err(|e| Error::TemplateRender {
                template: template.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn tgi_proxy_renders_endpoint() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render("tgi/proxy.conf", context! { endpoint => "generate_stream" })
            .unwrap();
        assert!(rendered.contains("proxy_pass http://127.0.0.1:3000/generate_stream;"));
    }

    #[test]
    fn supervisord_renders_extra_args() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .render(
                "tgi/supervisord.conf",
                context! { extra_args => "--max-tokens=100" },
            )
            .unwrap();
        assert!(rendered.contains("--max-tokens=100"));
    }

    #[test]
    fn unknown_template_names_the_id() {
        let engine = TemplateEngine::new();
        let err = engine.render("nope/missing", context! {}).unwrap_err();
        assert!(err.to_string().contains("nope/missing"));
    }

    #[test]
    fn tgi_dockerfile_token_is_conditional() {
        let engine = TemplateEngine::new();
        let with_token = engine
            .render("tgi/Dockerfile", context! { hf_access_token => "tok" })
            .unwrap();
        assert!(with_token.contains("ENV HUGGING_FACE_HUB_TOKEN=tok"));

        let without = engine
            .render("tgi/Dockerfile", context! { hf_access_token => None::<String> })
            .unwrap();
        assert!(!without.contains("HUGGING_FACE_HUB_TOKEN"));
    }
}
