//! Shared test utilities for E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_installed_widgets();
//!     fixture.command().arg("list").assert().success();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;

use parcel::index::{Entry, Index, ParcelIdentity};
use parcel::source::derive_directory_name;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::parcels;
    pub use super::TestFixture;
}

/// Parcel file sets used across tests.
#[allow(dead_code)]
pub mod parcels {
    /// Locator the pre-installed widgets parcel claims to come from.
    pub const WIDGETS_LOCATOR: &str = "git::ssh://github.com/acme/widgets.git?ref=v1";

    pub const WIDGETS_MANIFEST: &str =
        "name: widgets\nowner: acme\nversion: v1\ndescription: Widget service manifests\n";

    pub const WIDGETS_VALUES: &str = "replicas: 2\nimage: nginx\n";

    pub const WIDGETS_DEPLOYMENT: &str = "name: {{ meta.name }}\nimage: {{ values.image }}\nreplicas: {{ values.replicas }}\n";

    pub const WIDGETS_FILES: &[(&str, &str)] = &[
        ("manifest.yaml", WIDGETS_MANIFEST),
        ("values.yaml", WIDGETS_VALUES),
        ("templates/deployment.yaml", WIDGETS_DEPLOYMENT),
    ];
}

/// A temporary working directory with its own install directory.
pub struct TestFixture {
    pub temp: TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn install_dir(&self) -> PathBuf {
        self.temp.path().join(".parcel")
    }

    /// The `parcel` binary running in the fixture with a clean environment.
    pub fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("parcel");
        cmd.current_dir(self.temp.path())
            .env_remove("PARCEL_INSTALL_DIR")
            .env_remove("PARCEL_ADDRESSING")
            .env_remove("LOG_LEVEL")
            .env_remove("LOG_FORMAT")
            .env_remove("DEBUG")
            .env("NO_COLOR", "1")
            .arg("--install-dir")
            .arg(self.install_dir());
        cmd
    }

    /// Install the widgets parcel directly, as if it had been pulled.
    pub fn with_installed_widgets(self) -> Self {
        self.install(parcels::WIDGETS_LOCATOR, parcels::WIDGETS_FILES)
    }

    /// Write `files` into the encoded install directory for `locator` and
    /// register it in the index. The identity is acme/widgets/v1.
    pub fn install(self, locator: &str, files: &[(&str, &str)]) -> Self {
        let path = self.install_dir().join(derive_directory_name(locator));
        for (relative, content) in files {
            let file = path.join(relative);
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(file, content).unwrap();
        }
        std::fs::create_dir_all(&path).unwrap();

        let mut index = Index::load(self.install_dir().join("index.yaml")).unwrap();
        index.upsert(
            &ParcelIdentity::new("acme", "widgets", "v1"),
            Entry {
                name: "widgets".to_string(),
                owner: "acme".to_string(),
                version: "v1".to_string(),
                description: "Widget service manifests".to_string(),
                path: path.display().to_string(),
                source: locator.to_string(),
            },
        );
        index.persist().unwrap();
        self
    }

    /// Create a local git repository holding `files`, tagged `v1`.
    ///
    /// Returns a `git::file` locator for it.
    pub fn git_source(&self, owner: &str, repository: &str, files: &[(&str, &str)]) -> String {
        let repo = self.temp.child("remotes").child(owner).child(repository);
        repo.create_dir_all().unwrap();
        for (relative, content) in files {
            repo.child(relative).write_str(content).unwrap();
        }

        let git = |args: &[&str]| {
            let status = ProcessCommand::new("git")
                .args([
                    "-c",
                    "user.name=Parcel Tests",
                    "-c",
                    "user.email=tests@example.com",
                    "-c",
                    "commit.gpgsign=false",
                ])
                .args(args)
                .current_dir(repo.path())
                .output()
                .unwrap();
            assert!(
                status.status.success(),
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&status.stderr)
            );
        };
        git(&["init", "--quiet"]);
        git(&["add", "."]);
        git(&["commit", "--quiet", "-m", "Add parcel"]);
        git(&["tag", "v1"]);

        format!("git::file://{}?ref=v1", repo.path().display())
    }
}
