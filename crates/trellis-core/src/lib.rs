//! Trellis Core - Container Build-Context Assembly for Packaged ML Models
//!
//! This crate turns a declaratively configured model bundle into a hermetic
//! Docker build context: it selects a serving strategy, copies the server
//! code trees, resolves remote model artifacts, rewrites the embedded
//! config, and renders the final Dockerfile.
//!
//! # Architecture
//!
//! - A closed framework registry decides which serialization adapter handles
//!   an in-memory model object.
//! - The build-directory assembler branches on the configured serving
//!   backend: specialized engines (TGI, vLLM) get a three-file template
//!   path, the generic server gets the full copy/resolve pipeline.
//! - The Dockerfile renderer receives a fully resolved, flat variable set.
//!
//! # Example
//!
//! ```ignore
//! use trellis_core::{build::BuildPaths, ImageBuilder};
//!
//! let builder = ImageBuilder::new("./my-bundle", BuildPaths::resolve(None))?;
//! let build_dir = builder.prepare_build_dir(None, false)?;
//! ```

pub mod build;
pub mod config;
pub mod error;
pub mod framework;
pub mod hash;
pub mod hub;
pub mod spec;
pub mod template;

pub use build::{BuildPaths, ImageBuilder};
pub use config::{ModelFrameworkKind, ModelServer, TrellisConfig};
pub use error::{Error, Result};
pub use framework::{FrameworkRegistry, ModelFramework};
pub use hash::directory_content_hash;
pub use hub::{filter_repo_files, HubLister, RemoteModelManifest, RepoFileLister};
pub use spec::BundleSpec;
pub use template::TemplateEngine;
