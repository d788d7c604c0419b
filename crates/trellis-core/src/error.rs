//! Build pipeline error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while assembling a build context.
///
/// The pipeline does not retry and performs no rollback: a failed assembly
/// may leave a partially populated build directory behind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// No registered framework claimed the model object. Lists every
    /// framework that was asked, in registration order.
    #[error("Unsupported model type, tried frameworks: {tried:?}")]
    UnsupportedModelType { tried: Vec<&'static str> },

    #[error("Missing required build argument '{0}'")]
    MissingBuildArgument(&'static str),

    #[error("Invalid build argument: {0}")]
    InvalidBuildArgument(String),

    #[error("Hub client error: {0}")]
    Hub(String),

    #[error("Failed to list files for '{repo}': {reason}")]
    RemoteListing { repo: String, reason: String },

    #[error("Template '{template}' failed to render: {reason}")]
    TemplateRender { template: String, reason: String },

    #[error("External data error: {0}")]
    ExternalData(String),

    #[error("Model serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
