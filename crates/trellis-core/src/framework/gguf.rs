//! GGUF serialization framework
//!
//! GGUF models arrive pre-serialized as a single blob; "serialization" here
//! is copying the blob into the target directory under a fixed name.

use std::any::Any;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::ModelFramework;
use crate::error::{Error, Result};

pub const MODEL_BINARY_FILE: &str = "model.gguf";

const GGUF_MAGIC: &[u8; 4] = b"GGUF";

/// A GGUF model blob on disk, validated by magic bytes at construction.
#[derive(Debug, Clone)]
pub struct GgufModel {
    source: PathBuf,
}

impl GgufModel {
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let source = path.into();
        let mut magic = [0u8; 4];
        let mut file = fs::File::open(&source)?;
        file.read_exact(&mut magic)?;
        if &magic != GGUF_MAGIC {
            return Err(Error::Serialization(format!(
                "{} is not a GGUF file",
                source.display()
            )));
        }
        Ok(Self { source })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

pub struct GgufFramework;

impl ModelFramework for GgufFramework {
    fn name(&self) -> &'static str {
        "gguf"
    }

    fn supports(&self, model: &dyn Any) -> bool {
        model.downcast_ref::<GgufModel>().is_some()
    }

    fn serialize(&self, model: &dyn Any, target: &Path) -> Result<()> {
        let gguf = model.downcast_ref::<GgufModel>().ok_or_else(|| {
            Error::Serialization("gguf framework was handed a non-gguf model".into())
        })?;
        fs::create_dir_all(target)?;
        fs::copy(&gguf.source, target.join(MODEL_BINARY_FILE))?;
        Ok(())
    }

    fn required_dependencies(&self) -> &'static [&'static str] {
        &["gguf", "llama-cpp-python"]
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("model_binary_dir".to_string(), "model".to_string())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_gguf(dir: &Path) -> PathBuf {
        let path = dir.join("weights.gguf");
        fs::write(&path, b"GGUFrest-of-the-blob").unwrap();
        path
    }

    #[test]
    fn rejects_non_gguf_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.bin");
        fs::write(&path, b"nope").unwrap();
        assert!(GgufModel::from_file(&path).is_err());
    }

    #[test]
    fn serialize_copies_blob_under_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_gguf(dir.path());
        let model = GgufModel::from_file(&source).unwrap();

        let target = tempfile::tempdir().unwrap();
        GgufFramework.serialize(&model, target.path()).unwrap();

        let copied = fs::read(target.path().join(MODEL_BINARY_FILE)).unwrap();
        assert_eq!(copied, fs::read(&source).unwrap());
    }

    #[test]
    fn supports_only_gguf_models() {
        let dir = tempfile::tempdir().unwrap();
        let model = GgufModel::from_file(write_gguf(dir.path())).unwrap();
        assert!(GgufFramework.supports(&model));
        assert!(!GgufFramework.supports(&"something else".to_string()));
    }
}
