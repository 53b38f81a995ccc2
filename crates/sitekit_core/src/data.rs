//! Global site data from `_data/`
//!
//! Every YAML file becomes a value keyed by its stem; subdirectories nest.
//! Like records, nothing here fails the build: bad files are skipped with a
//! warning.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::model::Diagnostic;

/// Directory under the content dir holding global data files.
pub const DATA_DIR: &str = "_data";

const DATA_EXTENSIONS: &[&str] = &["yaml", "yml"];

#[derive(Debug, Clone, Default)]
pub struct GlobalData {
    pub values: Mapping,
    pub diagnostics: Vec<Diagnostic>,
}

/// Load `dir` recursively. A missing directory is an empty data set.
pub fn load_global_data(dir: &Path) -> GlobalData {
    let mut data = GlobalData::default();
    if !dir.is_dir() {
        return data;
    }
    let mut values = Mapping::new();
    load_dir(dir, &mut values, &mut data.diagnostics);
    data.values = values;
    log::debug!("global data: {} keys from {}", data.values.len(), dir.display());
    data
}

fn load_dir(dir: &Path, target: &mut Mapping, diagnostics: &mut Vec<Diagnostic>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn(diagnostics, dir, format!("cannot read data directory: {err}"));
            return;
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    paths.sort();

    for path in paths {
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if hidden {
            continue;
        }
        let is_dir = path.is_dir();
        let key = if is_dir {
            path.file_name().and_then(|name| name.to_str())
        } else if is_data_file(&path) {
            path.file_stem().and_then(|stem| stem.to_str())
        } else {
            continue;
        };
        let Some(key) = key.filter(|key| !key.is_empty()) else {
            warn(diagnostics, &path, "data file name is not valid UTF-8".to_string());
            continue;
        };
        let key = Value::String(key.to_string());

        if is_dir {
            let mut nested = Mapping::new();
            load_dir(&path, &mut nested, diagnostics);
            merge_into(target, key, Value::Mapping(nested));
            continue;
        }
        match read_data_file(&path) {
            Ok(value) => merge_into(target, key, value),
            Err(message) => warn(diagnostics, &path, message),
        }
    }
}

fn read_data_file(path: &Path) -> Result<Value, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("failed to read data file: {err}"))?;
    serde_yaml::from_str(&raw).map_err(|err| format!("skipped: invalid YAML: {err}"))
}

/// Insert `value` at `key`, merging into an existing mapping. Scalars and
/// sequences replace what was there.
fn merge_into(target: &mut Mapping, key: Value, value: Value) {
    let Value::Mapping(incoming) = value else {
        target.insert(key, value);
        return;
    };
    if let Some(Value::Mapping(existing)) = target.get_mut(&key) {
        for (nested_key, nested_value) in incoming {
            merge_into(existing, nested_key, nested_value);
        }
        return;
    }
    target.insert(key, Value::Mapping(incoming));
}

fn is_data_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DATA_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

fn warn(diagnostics: &mut Vec<Diagnostic>, path: &Path, message: String) {
    log::warn!("{}: {message}", path.display());
    diagnostics.push(Diagnostic::warning(Some(path.display().to_string()), message));
}
