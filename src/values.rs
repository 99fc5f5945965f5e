//! # Values Documents
//!
//! Values are arbitrary-depth YAML documents. They are kept as
//! [`serde_yaml::Value`], a tagged variant over null, bool, number, string,
//! sequence and mapping, so templates can look up any shape while the
//! boundary stays typed.
//!
//! A parcel bundles default values in `values.yaml`; callers may supply an
//! override document. Merging is shallow: each top-level key of the override
//! replaces the same key of the defaults wholesale. Nested mappings are not
//! merged recursively.

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// Top-level values mapping.
pub type Values = Mapping;

/// Load a values document that must be a mapping.
///
/// An empty document (or one that is just `null`) yields an empty mapping.
pub fn load_values<P: AsRef<Path>>(path: P) -> Result<Values> {
    let path = path.as_ref();
    let invalid = |message: String| Error::ValuesInvalid {
        path: path.display().to_string(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    parse_values(&content).map_err(invalid)
}

fn parse_values(content: &str) -> std::result::Result<Values, String> {
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(format!(
            "expected a mapping at the top level, found {}",
            kind(&other)
        )),
    }
}

/// Overlay `overrides` onto `defaults`, top-level keys only.
pub fn merge_values(defaults: &Values, overrides: Option<&Values>) -> Values {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn values(yaml: &str) -> Values {
        parse_values(yaml).unwrap()
    }

    #[test]
    fn test_merge_precedence() {
        let defaults = values("a: 1\nb: 2\n");
        let overrides = values("b: 3\nc: 4\n");

        let merged = merge_values(&defaults, Some(&overrides));

        assert_eq!(merged, values("a: 1\nb: 3\nc: 4\n"));
    }

    #[test]
    fn test_merge_without_overrides_equals_defaults() {
        let defaults = values("image: nginx\nreplicas: 2\n");
        assert_eq!(merge_values(&defaults, None), defaults);
    }

    #[test]
    fn test_merge_replaces_nested_mappings_wholesale() {
        let defaults = values("image:\n  name: nginx\n  tag: '1.25'\n");
        let overrides = values("image:\n  tag: '1.27'\n");

        let merged = merge_values(&defaults, Some(&overrides));

        assert_eq!(merged, values("image:\n  tag: '1.27'\n"));
    }

    #[test]
    fn test_merge_keeps_non_string_keys() {
        let defaults = values("1: one\ntrue: yes\n");
        let overrides = values("1: uno\n");

        let merged = merge_values(&defaults, Some(&overrides));

        assert_eq!(merged.get(Value::from(1)), Some(&Value::from("uno")));
        assert_eq!(merged.get(Value::Bool(true)), Some(&Value::from("yes")));
    }

    #[test]
    fn test_load_values_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("values.yaml");
        fs::write(&path, "# nothing here\n").unwrap();

        assert!(load_values(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_values_rejects_sequences() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("values.yaml");
        fs::write(&path, "- a\n- b\n").unwrap();

        let err = load_values(&path).unwrap_err();
        assert!(err.to_string().contains("found a sequence"));
    }

    #[test]
    fn test_load_values_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_values(temp_dir.path().join("values.yaml")).unwrap_err();
        assert!(matches!(err, Error::ValuesInvalid { .. }));
    }
}
