//! # Installed Parcel Index
//!
//! The index is the durable record of what is installed. It is a single
//! YAML document under the install root:
//!
//! ```yaml
//! entries:
//!   acme/widgets/v1:
//!     name: widgets
//!     owner: acme
//!     version: v1
//!     description: Widget service manifests
//!     path: .parcel/Z2l0Ojpzc2g6Ly9...
//!     source: git::ssh://github.com/acme/widgets.git?ref=v1
//! ```
//!
//! A missing index file is an empty index, never an error. A file that
//! exists but cannot be parsed is reported as corrupt rather than being
//! silently reset. Writes go through a temporary file in the same directory
//! and are renamed into place, so a failed write leaves the previous index
//! intact.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// The logical identity of a parcel: `(owner, name, version)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParcelIdentity {
    pub owner: String,
    pub name: String,
    pub version: String,
}

impl ParcelIdentity {
    pub fn new(owner: &str, name: &str, version: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// The string used as the key of this identity in the index file.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParcelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.name, self.version)
    }
}

/// An installed parcel as recorded in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub owner: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Install path of the parcel.
    pub path: String,
    /// Locator the parcel was pulled from.
    pub source: String,
}

impl Entry {
    pub fn identity(&self) -> ParcelIdentity {
        ParcelIdentity::new(&self.owner, &self.name, &self.version)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexDocument {
    #[serde(default)]
    entries: Option<BTreeMap<String, Entry>>,
}

/// Registry of installed parcels, backed by a YAML file.
#[derive(Debug, Clone)]
pub struct Index {
    path: PathBuf,
    entries: BTreeMap<String, Entry>,
}

impl Index {
    /// An empty index that will persist to `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: BTreeMap::new(),
        }
    }

    /// Open the index at `path`, creating an empty file if none exists.
    ///
    /// Existing content is never truncated. Content that does not parse as
    /// an index document fails with [`Error::IndexCorrupt`]. Failing to
    /// create, open or read the file is an [`Error::Filesystem`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let unreadable = |e: std::io::Error| Error::Filesystem {
            message: format!("Failed to read index '{}': {}", path.display(), e),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(unreadable)?;
        }

        let mut content = String::new();
        OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .and_then(|mut file| file.read_to_string(&mut content))
            .map_err(unreadable)?;

        let entries = if content.trim().is_empty() {
            BTreeMap::new()
        } else {
            let document: IndexDocument =
                serde_yaml::from_str(&content).map_err(|e| Error::IndexCorrupt {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            document.entries.unwrap_or_default()
        };

        debug!("Loaded {} index entries from {}", entries.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Install path recorded for `identity`.
    pub fn lookup(&self, identity: &ParcelIdentity) -> Result<&str> {
        self.get(identity)
            .map(|entry| entry.path.as_str())
            .ok_or_else(|| Error::EntryNotFound {
                identity: identity.key(),
            })
    }

    /// Entry recorded for `identity`, if any.
    pub fn get(&self, identity: &ParcelIdentity) -> Option<&Entry> {
        self.entries.get(&identity.key())
    }

    /// Find the entry that was pulled from `locator`.
    pub fn find_by_source(&self, locator: &str) -> Option<&Entry> {
        self.entries.values().find(|entry| entry.source == locator)
    }

    /// Insert or replace the entry for `identity`. Last write wins.
    pub fn upsert(&mut self, identity: &ParcelIdentity, entry: Entry) {
        self.entries.insert(identity.key(), entry);
    }

    /// All entries, ordered by identity key.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the full entry map to the index file.
    ///
    /// The document is written to a temporary file next to the index and
    /// renamed over it, so readers see either the old or the new index.
    pub fn persist(&self) -> Result<()> {
        let failed = |message: String| Error::IndexPersistFailed {
            path: self.path.display().to_string(),
            message,
        };

        let document = IndexDocument {
            entries: Some(self.entries.clone()),
        };
        let data = serde_yaml::to_string(&document).map_err(|e| failed(e.to_string()))?;

        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory).map_err(|e| failed(e.to_string()))?;

        let mut staged = NamedTempFile::new_in(&directory).map_err(|e| failed(e.to_string()))?;
        staged
            .write_all(data.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| failed(e.to_string()))?;
        staged
            .persist(&self.path)
            .map_err(|e| failed(e.error.to_string()))?;

        debug!("Persisted {} index entries to {}", self.len(), self.path.display());
        Ok(())
    }
}
