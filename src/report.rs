//! Missing translation report
//!
//! Compares every catalog in a source language directory with its
//! counterpart in a target directory and lists the key paths the target
//! lacks. Nested objects are flattened to dotted paths (`nav.home`); arrays
//! count as leaves.

use crate::mt::error::{MtError, MtResult};
use crate::orchestrator::list_catalog_files;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Dotted paths of every leaf in `value`
pub fn key_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(value, "", &mut paths);
    paths
}

fn collect_paths(value: &Value, prefix: &str, paths: &mut Vec<String>) {
    let Value::Object(map) = value else {
        return;
    };

    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        if child.is_object() {
            collect_paths(child, &path, paths);
        } else {
            paths.push(path);
        }
    }
}

/// Key paths of `base` that `target` does not have, in `base` order
pub fn missing_keys(base: &Value, target: &Value) -> Vec<String> {
    let present: HashSet<String> = key_paths(target).into_iter().collect();
    key_paths(base)
        .into_iter()
        .filter(|path| !present.contains(path))
        .collect()
}

/// Missing keys per catalog file (by file stem)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MissingReport {
    pub files: BTreeMap<String, Vec<String>>,
}

impl MissingReport {
    pub fn total(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn read_catalog(path: &Path) -> MtResult<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        MtError::IoError(format!("Failed to read file '{}': {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        MtError::ParseError(format!(
            "Failed to parse JSON from '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Compare every catalog of `source_dir` with the same file in `target_dir`
///
/// Targets that are missing or unparsable are skipped rather than reported
/// key by key. An unreadable or invalid source catalog is an error.
pub fn check_missing_translations(source_dir: &Path, target_dir: &Path) -> MtResult<MissingReport> {
    let mut report = MissingReport::default();

    for source_file in list_catalog_files(source_dir)? {
        let base = read_catalog(&source_file)?;
        let Some(file_name) = source_file.file_name() else {
            continue;
        };

        let target = match read_catalog(&target_dir.join(file_name)) {
            Ok(target) => target,
            Err(e) => {
                debug!("Skipping {}: {}", source_file.display(), e);
                continue;
            }
        };

        let missing = missing_keys(&base, &target);
        if !missing.is_empty() {
            let stem = source_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            report.files.insert(stem, missing);
        }
    }

    Ok(report)
}
