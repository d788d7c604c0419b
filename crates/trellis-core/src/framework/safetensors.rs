//! Safetensors serialization framework

use std::any::Any;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use safetensors::tensor::{Dtype, TensorView};

use super::ModelFramework;
use crate::error::{Error, Result};

pub const MODEL_BINARY_FILE: &str = "model.safetensors";

/// In-memory model as named f32 tensors, the object safetensors claims.
#[derive(Debug, Clone, Default)]
pub struct TensorBundle {
    tensors: BTreeMap<String, Tensor>,
}

#[derive(Debug, Clone)]
struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TensorBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named tensor; the element count must match the shape.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        shape: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<()> {
        let name = name.into();
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::Serialization(format!(
                "tensor '{name}' has {} elements but shape {:?} expects {expected}",
                data.len(),
                shape
            )));
        }
        self.tensors.insert(name, Tensor { shape, data });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }
}

pub struct SafetensorsFramework;

impl ModelFramework for SafetensorsFramework {
    fn name(&self) -> &'static str {
        "safetensors"
    }

    fn supports(&self, model: &dyn Any) -> bool {
        model.downcast_ref::<TensorBundle>().is_some()
    }

    fn serialize(&self, model: &dyn Any, target: &Path) -> Result<()> {
        let bundle = model.downcast_ref::<TensorBundle>().ok_or_else(|| {
            Error::Serialization("safetensors framework was handed a non-tensor model".into())
        })?;
        fs::create_dir_all(target)?;

        // Byte buffers must outlive the views handed to the serializer.
        let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = bundle
            .tensors
            .iter()
            .map(|(name, tensor)| {
                let bytes: Vec<u8> = tensor
                    .data
                    .iter()
                    .flat_map(|value| value.to_le_bytes())
                    .collect();
                (name.clone(), tensor.shape.clone(), bytes)
            })
            .collect();

        let mut views: Vec<(&str, TensorView<'_>)> = Vec::with_capacity(buffers.len());
        for (name, shape, bytes) in &buffers {
            let view = TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map_err(|e| Error::Serialization(format!("tensor '{name}': {e:?}")))?;
            views.push((name.as_str(), view));
        }

        safetensors::serialize_to_file(views, &None, &target.join(MODEL_BINARY_FILE))
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    fn required_dependencies(&self) -> &'static [&'static str] {
        &["safetensors", "numpy"]
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("model_binary_dir".to_string(), "model".to_string())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bundle() -> TensorBundle {
        let mut bundle = TensorBundle::new();
        bundle
            .insert("weight", vec![2, 2], vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        bundle.insert("bias", vec![2], vec![0.5, -0.5]).unwrap();
        bundle
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut bundle = TensorBundle::new();
        assert!(bundle.insert("bad", vec![3], vec![1.0]).is_err());
    }

    #[test]
    fn serialize_writes_the_model_binary() {
        let target = tempfile::tempdir().unwrap();
        let framework = SafetensorsFramework;
        framework
            .serialize(&sample_bundle(), target.path())
            .unwrap();
        assert!(target.path().join(MODEL_BINARY_FILE).is_file());
    }

    #[test]
    fn serialize_is_deterministic_across_clean_directories() {
        let framework = SafetensorsFramework;
        let bundle = sample_bundle();

        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        framework.serialize(&bundle, a.path()).unwrap();
        framework.serialize(&bundle, b.path()).unwrap();

        let bytes_a = fs::read(a.path().join(MODEL_BINARY_FILE)).unwrap();
        let bytes_b = fs::read(b.path().join(MODEL_BINARY_FILE)).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn metadata_reports_model_binary_dir() {
        let framework = SafetensorsFramework;
        assert_eq!(
            framework.metadata().get("model_binary_dir"),
            Some(&"model".to_string())
        );
    }
}
