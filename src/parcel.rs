//! # Parcels
//!
//! A [`Parcel`] is one resolved parcel: its identity, where it is installed,
//! the locator it came from, and once loaded, its default values and compiled
//! templates. Parcels are built fresh for every command and never cached.
//!
//! ## Resolution
//!
//! - [`Parcel::from_locator`] is used when pulling. The install path is derived
//!   from the locator alone because the index only learns about a parcel after
//!   it has been fetched.
//! - [`Parcel::resolve`] is used when rendering. The identity is looked up in
//!   the index to find the install path, and the locator is recovered from the
//!   directory name (encoded scheme) or from the entry (structured scheme).
//!
//! ## Layout
//!
//! ```text
//! <install root>/<directory name>/
//!     manifest.yaml
//!     values.yaml
//!     templates/
//!     assets/
//! ```

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::defaults::{ASSETS_DIRECTORY, MANIFEST_FILE, TEMPLATE_DIRECTORY, VALUES_FILE};
use crate::error::{Error, Result};
use crate::index::{Index, ParcelIdentity};
use crate::source::{decode_directory_name, AddressingScheme, ProtocolTable};
use crate::template::{FunctionLibrary, ParcelTemplate};
use crate::values::{load_values, Values};

#[derive(Debug)]
pub struct Parcel {
    pub identity: ParcelIdentity,
    install_root: PathBuf,
    directory_name: String,
    source: String,
    /// Bundled default values, filled by [`Parcel::load_contents`].
    pub values: Values,
    /// Compiled templates in file-name order, filled by [`Parcel::load_contents`].
    pub templates: Vec<ParcelTemplate>,
}

impl Parcel {
    /// Build a parcel for `locator` without consulting the index.
    ///
    /// Under the structured scheme the identity comes from the locator's
    /// grammar. Under the encoded scheme the identity is whatever the grammar
    /// can tell; the manifest is authoritative once the parcel is fetched.
    pub fn from_locator(
        locator: &str,
        install_root: &Path,
        scheme: AddressingScheme,
        protocols: &ProtocolTable,
    ) -> Result<Self> {
        let directory_name = scheme.directory_name(protocols, locator)?;
        let identity = protocols
            .parse(locator)
            .map(|fields| ParcelIdentity::new(&fields.owner, fields.name(), &fields.version()))
            .unwrap_or_default();

        Ok(Self {
            identity,
            install_root: install_root.to_path_buf(),
            directory_name,
            source: locator.to_string(),
            values: Values::new(),
            templates: Vec::new(),
        })
    }

    /// Resolve an installed parcel through the index.
    pub fn resolve(
        index: &Index,
        identity: &ParcelIdentity,
        scheme: AddressingScheme,
    ) -> Result<Self> {
        let install_path = PathBuf::from(index.lookup(identity)?);
        let recorded_source = index
            .get(identity)
            .map(|entry| entry.source.clone())
            .unwrap_or_default();

        let directory_name = install_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let install_root = install_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let source = match scheme {
            AddressingScheme::Encoded => {
                decode_directory_name(&directory_name).unwrap_or_else(|| {
                    debug!(
                        "Directory {} is not an encoded locator, using recorded source",
                        directory_name
                    );
                    recorded_source
                })
            }
            AddressingScheme::Structured => recorded_source,
        };

        Ok(Self {
            identity: identity.clone(),
            install_root,
            directory_name,
            source,
            values: Values::new(),
            templates: Vec::new(),
        })
    }

    /// `owner/name/version`, used in messages.
    pub fn id(&self) -> String {
        self.identity.to_string()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn install_path(&self) -> PathBuf {
        self.install_root.join(&self.directory_name)
    }

    pub fn template_directory(&self) -> PathBuf {
        self.install_path().join(TEMPLATE_DIRECTORY)
    }

    pub fn values_path(&self) -> PathBuf {
        self.install_path().join(VALUES_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.install_path().join(MANIFEST_FILE)
    }

    /// Absolute path of the assets directory, as exposed to templates.
    pub fn assets_directory(&self) -> PathBuf {
        let path = self.install_path().join(ASSETS_DIRECTORY);
        std::path::absolute(&path).unwrap_or(path)
    }

    /// Check every precondition for loading this parcel.
    ///
    /// All problems are collected and reported together in one
    /// [`Error::ValidationFailed`].
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        for (field, value) in [
            ("owner", &self.identity.owner),
            ("name", &self.identity.name),
            ("version", &self.identity.version),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("{} must not be empty", field));
            }
        }

        if self.install_root.as_os_str().is_empty() {
            problems.push("install directory must not be empty".to_string());
        }

        let install_path = self.install_path();
        if !install_path.is_dir() {
            problems.push(format!(
                "install path {} must exist and be a directory",
                install_path.display()
            ));
        }

        if !self.values_path().is_file() {
            problems.push(format!("{} must exist as a regular file", VALUES_FILE));
        }

        if !self.template_directory().is_dir() {
            problems.push(format!("{} directory must exist", TEMPLATE_DIRECTORY));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed {
                parcel: self.id(),
                problems,
            })
        }
    }

    /// Load the bundled values and compile every template.
    pub fn load_contents(&mut self, library: &FunctionLibrary) -> Result<()> {
        self.values = load_values(self.values_path())?;
        self.templates = scan_templates(&self.template_directory(), library)?;
        debug!(
            "Loaded {} templates and {} top-level values for {}",
            self.templates.len(),
            self.values.len(),
            self.id()
        );
        Ok(())
    }
}

/// Compile every file under `directory`, recursively, in file-name order.
fn scan_templates(directory: &Path, library: &FunctionLibrary) -> Result<Vec<ParcelTemplate>> {
    let mut templates = Vec::new();

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(directory)
            .unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        templates.push(ParcelTemplate::compile(entry.path(), &name, library)?);
    }

    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Entry;
    use crate::source::derive_directory_name;
    use std::fs;
    use tempfile::TempDir;

    const LOCATOR: &str = "git::ssh://github.com/acme/widgets.git?ref=v1";

    fn protocols() -> ProtocolTable {
        ProtocolTable::standard().unwrap()
    }

    fn install(root: &Path, directory_name: &str) -> PathBuf {
        let path = root.join(directory_name);
        fs::create_dir_all(path.join("templates/nested")).unwrap();
        fs::write(path.join("values.yaml"), "replicas: 2\n").unwrap();
        fs::write(path.join("templates/a.yaml"), "a: {{ values.replicas }}\n").unwrap();
        fs::write(path.join("templates/nested/b.yaml"), "b: {{ meta.name }}\n").unwrap();
        path
    }

    fn indexed(root: &Path, path: &Path) -> (Index, ParcelIdentity) {
        let identity = ParcelIdentity::new("acme", "widgets", "v1");
        let mut index = Index::new(root.join("index.yaml"));
        index.upsert(
            &identity,
            Entry {
                name: "widgets".to_string(),
                owner: "acme".to_string(),
                version: "v1".to_string(),
                description: String::new(),
                path: path.display().to_string(),
                source: LOCATOR.to_string(),
            },
        );
        (index, identity)
    }

    #[test]
    fn test_from_locator_encoded() {
        let parcel = Parcel::from_locator(
            LOCATOR,
            Path::new("/opt/parcels"),
            AddressingScheme::Encoded,
            &protocols(),
        )
        .unwrap();

        assert_eq!(parcel.directory_name(), derive_directory_name(LOCATOR));
        assert_eq!(
            parcel.install_path(),
            Path::new("/opt/parcels").join(derive_directory_name(LOCATOR))
        );
        assert_eq!(parcel.id(), "acme/widgets/v1");
    }

    #[test]
    fn test_from_locator_structured_paths() {
        let parcel = Parcel::from_locator(
            LOCATOR,
            Path::new("/opt/parcels"),
            AddressingScheme::Structured,
            &protocols(),
        )
        .unwrap();

        let root = Path::new("/opt/parcels/acme-widgets-v1");
        assert_eq!(parcel.install_path(), root);
        assert_eq!(parcel.template_directory(), root.join("templates"));
        assert_eq!(parcel.values_path(), root.join("values.yaml"));
        assert_eq!(parcel.manifest_path(), root.join("manifest.yaml"));
        assert_eq!(parcel.assets_directory(), root.join("assets"));
    }

    #[test]
    fn test_from_locator_structured_rejects_malformed() {
        let err = Parcel::from_locator(
            "git::ssh://github.com",
            Path::new("/opt/parcels"),
            AddressingScheme::Structured,
            &protocols(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedSource { .. }));
    }

    #[test]
    fn test_resolve_decodes_encoded_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = install(temp_dir.path(), &derive_directory_name(LOCATOR));
        let (index, identity) = indexed(temp_dir.path(), &path);

        let parcel = Parcel::resolve(&index, &identity, AddressingScheme::Encoded).unwrap();

        assert_eq!(parcel.source(), LOCATOR);
        assert_eq!(parcel.install_path(), path);
        parcel.validate().unwrap();
    }

    #[test]
    fn test_resolve_structured_uses_recorded_source() {
        let temp_dir = TempDir::new().unwrap();
        let path = install(temp_dir.path(), "acme-widgets-v1");
        let (index, identity) = indexed(temp_dir.path(), &path);

        let parcel = Parcel::resolve(&index, &identity, AddressingScheme::Structured).unwrap();

        assert_eq!(parcel.source(), LOCATOR);
        assert_eq!(parcel.directory_name(), "acme-widgets-v1");
    }

    #[test]
    fn test_resolve_unknown_identity() {
        let index = Index::new("index.yaml");
        let err = Parcel::resolve(
            &index,
            &ParcelIdentity::new("acme", "gadgets", "v9"),
            AddressingScheme::Encoded,
        )
        .unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("acme-widgets-v1");
        fs::create_dir_all(&path).unwrap();
        let (index, identity) = indexed(temp_dir.path(), &path);
        let parcel = Parcel::resolve(&index, &identity, AddressingScheme::Structured).unwrap();

        match parcel.validate().unwrap_err() {
            Error::ValidationFailed { parcel, problems } => {
                assert_eq!(parcel, "acme/widgets/v1");
                assert_eq!(problems.len(), 2, "got: {:?}", problems);
                assert!(problems[0].contains("values.yaml"));
                assert!(problems[1].contains("templates"));
            }
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_values_directory_and_empty_identity() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("p");
        fs::create_dir_all(path.join("values.yaml")).unwrap();
        fs::create_dir_all(path.join("templates")).unwrap();

        let mut parcel = Parcel::from_locator(
            "git::file:///srv/acme/widgets",
            temp_dir.path(),
            AddressingScheme::Structured,
            &protocols(),
        )
        .unwrap();
        parcel.directory_name = "p".to_string();
        parcel.identity = ParcelIdentity::default();

        match parcel.validate().unwrap_err() {
            Error::ValidationFailed { problems, .. } => {
                assert_eq!(
                    problems,
                    vec![
                        "owner must not be empty".to_string(),
                        "name must not be empty".to_string(),
                        "version must not be empty".to_string(),
                        "values.yaml must exist as a regular file".to_string(),
                    ]
                );
            }
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_load_contents_scans_templates_recursively() {
        let temp_dir = TempDir::new().unwrap();
        let path = install(temp_dir.path(), "acme-widgets-v1");
        let (index, identity) = indexed(temp_dir.path(), &path);
        let mut parcel = Parcel::resolve(&index, &identity, AddressingScheme::Structured).unwrap();

        parcel.load_contents(&FunctionLibrary::standard()).unwrap();

        let names: Vec<_> = parcel.templates.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["a.yaml", "nested/b.yaml"]);
        assert_eq!(
            parcel.values.get("replicas"),
            Some(&serde_yaml::Value::from(2))
        );
    }
}
