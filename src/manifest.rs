//! Parcel manifest (`manifest.yaml`).
//!
//! Every parcel ships a manifest naming its owner, name and version. The pull
//! pipeline reads it right after fetching and uses it to register the parcel
//! in the index.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::index::{Entry, ParcelIdentity};

/// Identity fields declared by a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub owner: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
}

impl Manifest {
    /// Read and check the manifest at `path`.
    ///
    /// A missing file, unparsable YAML, or an empty `name`, `owner` or
    /// `version` all fail with [`Error::ManifestInvalid`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |message: String| Error::ManifestInvalid {
            path: path.display().to_string(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let manifest: Manifest =
            serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        let missing: Vec<&str> = [
            ("name", &manifest.name),
            ("owner", &manifest.owner),
            ("version", &manifest.version),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(invalid(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(manifest)
    }

    pub fn identity(&self) -> ParcelIdentity {
        ParcelIdentity::new(&self.owner, &self.name, &self.version)
    }

    /// Index entry for a parcel installed at `path` from `source`.
    pub fn to_entry(&self, path: &Path, source: &str) -> Entry {
        Entry {
            name: self.name.clone(),
            owner: self.owner.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            path: path.display().to_string(),
            source: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.yaml");
        fs::write(
            &path,
            "name: widgets\nowner: acme\nversion: v1\ndescription: Widget manifests\n",
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.identity(), ParcelIdentity::new("acme", "widgets", "v1"));
        assert_eq!(manifest.description, "Widget manifests");

        let entry = manifest.to_entry(Path::new("/opt/parcels/x"), "git::file:///a/b/c");
        assert_eq!(entry.path, "/opt/parcels/x");
        assert_eq!(entry.source, "git::file:///a/b/c");
        assert_eq!(entry.identity(), manifest.identity());
    }

    #[test]
    fn test_load_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let err = Manifest::load(temp_dir.path().join("manifest.yaml")).unwrap_err();
        assert!(matches!(err, Error::ManifestInvalid { .. }));
    }

    #[test]
    fn test_load_manifest_with_empty_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.yaml");
        fs::write(&path, "name: widgets\nowner: ''\nversion: ''\n").unwrap();

        let err = Manifest::load(&path).unwrap_err();
        let display = err.to_string();
        assert!(display.contains("owner, version"), "got: {}", display);
    }

    #[test]
    fn test_load_malformed_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.yaml");
        fs::write(&path, "- just\n- a list\n").unwrap();

        assert!(matches!(
            Manifest::load(&path).unwrap_err(),
            Error::ManifestInvalid { .. }
        ));
    }
}
