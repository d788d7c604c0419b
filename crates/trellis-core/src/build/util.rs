//! Small filesystem and argument helpers shared by the assembly paths

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Recursively copy a directory tree, creating the destination as needed.
pub fn copy_tree_path(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy either a tree or a single file, creating parent directories.
pub fn copy_tree_or_file(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_tree_path(src, dst)
    } else {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        Ok(())
    }
}

/// Whether a file exists and contains at least one non-whitespace byte.
/// A missing file and a whitespace-only file are treated identically.
pub fn file_is_not_empty(path: &Path) -> bool {
    match fs::read_to_string(path) {
        Ok(contents) => !contents.trim().is_empty(),
        Err(_) => false,
    }
}

/// Normalize a compact python version ("py39") to dotted form ("3.9").
pub fn to_dotted_python_version(version: &str) -> Result<String> {
    let digits = version.strip_prefix("py").unwrap_or(version);
    if digits.len() < 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Config(format!(
            "invalid python version '{version}'"
        )));
    }
    Ok(format!("{}.{}", &digits[..1], &digits[1..]))
}

/// Render a scalar build-argument value as flag text.
pub fn scalar_to_string(key: &str, value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::InvalidBuildArgument(format!(
            "argument '{key}' must be a scalar"
        ))),
    }
}

/// Flatten a build-argument map into a `--key=value` flag string.
///
/// Keys have underscores converted to hyphens; unknown keys pass through
/// untouched. The map is key-ordered, so the output is deterministic.
pub fn flatten_build_arguments(args: &BTreeMap<String, serde_json::Value>) -> Result<String> {
    let mut flags = Vec::with_capacity(args.len());
    for (key, value) in args {
        flags.push(format!(
            "--{}={}",
            key.replace('_', "-"),
            scalar_to_string(key, value)?
        ));
    }
    Ok(flags.join(" "))
}
