//! Fetching parcel content from a source locator.
//!
//! The engine only depends on [`SourceFetcher`]. [`GitFetcher`] is the default
//! implementation and shells out to the system `git`, so it picks up whatever
//! authentication is configured there:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens

use std::fs;
use std::path::Path;
use std::process::Command;

use log::debug;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::source::ProtocolTable;

/// Materialises the content a locator points at into a local directory.
pub trait SourceFetcher: Send + Sync {
    /// Place the parcel tree for `locator` at `destination`.
    ///
    /// Any previous content of `destination` is replaced.
    fn fetch(&self, locator: &str, destination: &Path) -> Result<()>;
}

/// Fetches parcels with a shallow `git clone`.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    protocols: ProtocolTable,
}

impl GitFetcher {
    pub fn new(protocols: ProtocolTable) -> Self {
        Self { protocols }
    }
}

impl SourceFetcher for GitFetcher {
    fn fetch(&self, locator: &str, destination: &Path) -> Result<()> {
        let fields = self.protocols.parse(locator)?;
        let checkout = TempDir::new()?;
        let clone_dir = checkout.path().join("checkout");

        clone_shallow(&fields.url, fields.reference.as_deref(), &clone_dir)?;

        let root = match &fields.subdirectory {
            Some(subdir) => clone_dir.join(subdir.trim_matches('/')),
            None => clone_dir.clone(),
        };
        if !root.is_dir() {
            return Err(Error::FetchFailed {
                locator: locator.to_string(),
                message: format!(
                    "subdirectory '{}' not found in {}",
                    fields.subdirectory.unwrap_or_default(),
                    fields.url
                ),
            });
        }

        replace_tree(&root, destination)
    }
}

/// Clone `url` at `reference` (or the default branch) with depth 1.
pub fn clone_shallow(url: &str, reference: Option<&str>, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut command = Command::new("git");
    command.args(["clone", "--quiet", "--depth=1"]);
    if let Some(reference) = reference {
        command.args(["--branch", reference]);
    }
    command.arg(url).arg(target_dir);

    debug!("Running git clone of {} at {:?}", url, reference);
    let output = command.output().map_err(|e| Error::FetchFailed {
        locator: url.to_string(),
        message: format!("could not run git: {}", e),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                For private repos, ensure you have:\n\
                - SSH key added to ssh-agent\n\
                - Git credentials configured\n\
                Error: {}",
                stderr.trim()
            )
        } else {
            stderr.trim().to_string()
        };

        return Err(Error::FetchFailed {
            locator: url.to_string(),
            message,
        });
    }

    Ok(())
}

/// Copy everything under `source` except `.git` into a fresh `destination`.
fn replace_tree(source: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        fs::remove_dir_all(destination)?;
    }
    fs::create_dir_all(destination)?;

    let walker = WalkDir::new(source)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = match entry.path().strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_tree_skips_git_and_clears_destination() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join(".git/objects")).unwrap();
        fs::write(source.path().join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(source.path().join("templates/nested")).unwrap();
        fs::write(source.path().join("values.yaml"), "a: 1\n").unwrap();
        fs::write(source.path().join("templates/nested/x.yaml"), "x").unwrap();

        let target = TempDir::new().unwrap();
        let destination = target.path().join("parcel");
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join("stale.txt"), "old").unwrap();

        replace_tree(source.path(), &destination).unwrap();

        assert!(destination.join("values.yaml").is_file());
        assert!(destination.join("templates/nested/x.yaml").is_file());
        assert!(!destination.join(".git").exists());
        assert!(!destination.join("stale.txt").exists());
    }

    #[test]
    fn test_fetch_rejects_malformed_locator() {
        let fetcher = GitFetcher::new(ProtocolTable::standard().unwrap());
        let target = TempDir::new().unwrap();

        let err = fetcher
            .fetch("git::https://example.com", &target.path().join("p"))
            .unwrap_err();

        assert!(matches!(err, Error::MalformedSource { .. }));
    }

    #[test]
    #[cfg_attr(not(feature = "integration-tests"), ignore)]
    fn test_clone_missing_repository_fails() {
        let target = TempDir::new().unwrap();
        let err = clone_shallow(
            "file:///nonexistent/acme/widgets.git",
            None,
            &target.path().join("checkout"),
        )
        .unwrap_err();

        assert!(matches!(err, Error::FetchFailed { .. }));
    }
}
