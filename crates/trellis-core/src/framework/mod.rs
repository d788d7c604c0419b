//! Model framework registry
//!
//! A closed, ordered set of serialization adapters. Each adapter can test
//! whether it recognizes an in-memory model object, serialize it into a
//! target directory, and report the python dependencies and config metadata
//! the runtime server needs to load the artifacts back.

mod gguf;
mod safetensors;

use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

pub use self::gguf::{GgufFramework, GgufModel};
pub use self::safetensors::{SafetensorsFramework, TensorBundle};

/// A single model-serialization framework.
///
/// `supports` must never fail: a model the framework cannot handle (or a
/// format whose backing library is not compiled in) is simply "not
/// supported". `serialize` is idempotent against a clean target directory.
pub trait ModelFramework {
    /// Stable lowercase identifier, matching `ModelFrameworkKind::as_str`.
    fn name(&self) -> &'static str;

    /// Whether this framework recognizes the given model object.
    fn supports(&self, model: &dyn Any) -> bool;

    /// Write framework-specific artifacts for `model` into `target`.
    fn serialize(&self, model: &dyn Any, target: &Path) -> Result<()>;

    /// Python packages the generated image needs to deserialize the
    /// artifacts; merged into the requirements manifest at build time.
    fn required_dependencies(&self) -> &'static [&'static str];

    /// Metadata embedded into the rewritten config so the runtime server can
    /// locate the artifacts. Documented key: `model_binary_dir`, the
    /// directory (relative to the data dir) holding the serialized binary.
    fn metadata(&self) -> BTreeMap<String, String>;
}

/// Placeholder framework for bundles that ship their own artifacts.
/// Never claims a model object; the registry must not guess.
pub struct CustomFramework;

impl ModelFramework for CustomFramework {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn supports(&self, _model: &dyn Any) -> bool {
        false
    }

    fn serialize(&self, _model: &dyn Any, _target: &Path) -> Result<()> {
        Ok(())
    }

    fn required_dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Ordered framework registry. Registration order is significant: when more
/// than one framework claims a model, the first registered wins.
pub struct FrameworkRegistry {
    frameworks: Vec<Box<dyn ModelFramework>>,
}

impl FrameworkRegistry {
    pub fn new() -> Self {
        Self {
            frameworks: Vec::new(),
        }
    }

    /// Registry with the built-in frameworks in their canonical order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SafetensorsFramework));
        registry.register(Box::new(GgufFramework));
        registry.register(Box::new(CustomFramework));
        registry
    }

    pub fn register(&mut self, framework: Box<dyn ModelFramework>) {
        self.frameworks.push(framework);
    }

    /// Find the first framework claiming `model`, in registration order.
    pub fn detect(&self, model: &dyn Any) -> Result<&dyn ModelFramework> {
        for framework in &self.frameworks {
            if framework.supports(model) {
                return Ok(framework.as_ref());
            }
        }
        Err(Error::UnsupportedModelType {
            tried: self.frameworks.iter().map(|f| f.name()).collect(),
        })
    }

    /// Look a framework up by its stable name (config-driven path).
    pub fn by_name(&self, name: &str) -> Option<&dyn ModelFramework> {
        self.frameworks
            .iter()
            .find(|f| f.name() == name)
            .map(|f| f.as_ref())
    }
}

impl Default for FrameworkRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClaimsEverything(&'static str);

    impl ModelFramework for ClaimsEverything {
        fn name(&self) -> &'static str {
            self.0
        }
        fn supports(&self, _model: &dyn Any) -> bool {
            true
        }
        fn serialize(&self, _model: &dyn Any, _target: &Path) -> Result<()> {
            Ok(())
        }
        fn required_dependencies(&self) -> &'static [&'static str] {
            &[]
        }
        fn metadata(&self) -> BTreeMap<String, String> {
            BTreeMap::new()
        }
    }

    #[test]
    fn detect_picks_safetensors_for_tensor_bundle() {
        let registry = FrameworkRegistry::with_defaults();
        let model = TensorBundle::new();
        assert_eq!(registry.detect(&model).unwrap().name(), "safetensors");
    }

    #[test]
    fn first_registered_wins() {
        let mut registry = FrameworkRegistry::new();
        registry.register(Box::new(ClaimsEverything("first")));
        registry.register(Box::new(ClaimsEverything("second")));
        let model = 0u32;
        assert_eq!(registry.detect(&model).unwrap().name(), "first");
    }

    #[test]
    fn unsupported_model_names_attempted_frameworks() {
        let registry = FrameworkRegistry::with_defaults();
        let model = "not a model".to_string();
        let err = registry.detect(&model).map(|f| f.name()).unwrap_err();
        match err {
            Error::UnsupportedModelType { tried } => {
                assert_eq!(tried, vec!["safetensors", "gguf", "custom"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn by_name_resolves_builtins() {
        let registry = FrameworkRegistry::with_defaults();
        assert!(registry.by_name("safetensors").is_some());
        assert!(registry.by_name("gguf").is_some());
        assert!(registry.by_name("custom").is_some());
        assert!(registry.by_name("sklearn").is_none());
    }

    #[test]
    fn custom_framework_claims_nothing() {
        let custom = CustomFramework;
        assert!(!custom.supports(&TensorBundle::new()));
        assert!(custom.metadata().is_empty());
        assert!(custom.required_dependencies().is_empty());
    }
}
