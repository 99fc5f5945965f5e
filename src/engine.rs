//! # Pull and Render Pipelines
//!
//! [`Engine`] owns everything a run needs: the [`Config`] (settings and the
//! loaded index), the source fetcher, and the immutable protocol and
//! function tables. Commands build one engine and call into it.
//!
//! ## Pull
//!
//! 1.  **Validate**: the locator must use an allowed protocol.
//! 2.  **Compute path**: the install path is derived from the locator.
//! 3.  **Skip existing**: an existing, indexed install path is left alone
//!     unless a forced re-fetch was requested. An existing path the index does
//!     not know about is registered from its manifest without fetching.
//! 4.  **Fetch**: the fetcher fills the install path. Failures surface as
//!     [`Error::FetchFailed`] and the index is not touched.
//! 5.  **Manifest**: the fetched manifest names the parcel.
//! 6.  **Index**: the entry is upserted and the index persisted. If the
//!     write fails the fetched content stays on disk for a later retry.
//!
//! ## Render
//!
//! 1.  **Load**: resolve the parcel through the index, validate it, load its
//!     values and compile its templates.
//! 2.  **Merge**: overlay the optional override values onto the defaults.
//! 3.  **Render**: render each template in order; the first failure aborts.
//! 4.  **Write**: each output goes to `<output dir>/<template base name>`.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{GitFetcher, SourceFetcher};
use crate::index::{Index, ParcelIdentity};
use crate::manifest::Manifest;
use crate::parcel::Parcel;
use crate::source::ProtocolTable;
use crate::template::{build_context, FunctionLibrary};
use crate::values::{load_values, merge_values};

/// Options for [`Engine::pull`].
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Fetch again even when the install path already exists.
    pub force: bool,
}

/// What [`Engine::pull`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The install path existed, was indexed, and no re-fetch was requested.
    Skipped { path: PathBuf },
    /// The parcel was registered, fetching it first unless it was on disk.
    Installed {
        identity: ParcelIdentity,
        path: PathBuf,
    },
}

/// Options for [`Engine::render`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Override values document; a path that does not exist is ignored.
    pub values_path: Option<PathBuf>,
    /// Directory receiving rendered files, created when missing.
    pub output_dir: PathBuf,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            values_path: None,
            output_dir: PathBuf::from("."),
        }
    }
}

pub struct Engine {
    config: Config,
    fetcher: Box<dyn SourceFetcher>,
    protocols: ProtocolTable,
    library: FunctionLibrary,
}

impl Engine {
    /// Engine fetching with the system `git`.
    pub fn new(config: Config) -> Result<Self> {
        let protocols = ProtocolTable::standard()?;
        let fetcher = Box::new(GitFetcher::new(protocols.clone()));
        Ok(Self {
            config,
            fetcher,
            protocols,
            library: FunctionLibrary::standard(),
        })
    }

    /// Engine using a custom fetcher.
    pub fn with_fetcher(config: Config, fetcher: Box<dyn SourceFetcher>) -> Result<Self> {
        Ok(Self {
            config,
            fetcher,
            protocols: ProtocolTable::standard()?,
            library: FunctionLibrary::standard(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &Index {
        &self.config.index
    }

    /// Install the parcel at `locator` and register it in the index.
    pub fn pull(&mut self, locator: &str, options: &PullOptions) -> Result<PullOutcome> {
        info!("Preparing to pull {}", locator);
        let protocol = self.protocols.ensure_supported(locator)?;
        debug!("Source {} uses protocol {}", locator, protocol);

        let settings = &self.config.settings;
        let parcel = Parcel::from_locator(
            locator,
            &settings.install_dir,
            settings.addressing,
            &self.protocols,
        )?;
        let install_path = parcel.install_path();

        let registered = self.config.index.find_by_source(locator).is_some();
        if install_path.exists() && !options.force {
            if registered {
                info!(
                    "Parcel already present at {}, skipping pull",
                    install_path.display()
                );
                return Ok(PullOutcome::Skipped { path: install_path });
            }
            // Content from an earlier pull that never reached the index
            info!(
                "Parcel present at {} but not indexed, registering without fetching",
                install_path.display()
            );
        } else {
            info!("Installing {} to {}", locator, install_path.display());
            self.fetcher
                .fetch(locator, &install_path)
                .map_err(|e| match e {
                    Error::FetchFailed { message, .. } => Error::FetchFailed {
                        locator: locator.to_string(),
                        message,
                    },
                    other => Error::FetchFailed {
                        locator: locator.to_string(),
                        message: other.to_string(),
                    },
                })?;
        }

        let manifest = Manifest::load(parcel.manifest_path())?;
        let identity = manifest.identity();
        debug!("Fetched manifest for {}", identity);

        // The in-memory index only changes once the new entry is on disk
        let mut index = self.config.index.clone();
        index.upsert(&identity, manifest.to_entry(&install_path, locator));
        index.persist()?;
        self.config.index = index;

        info!("Registered {} from {}", identity, locator);
        Ok(PullOutcome::Installed {
            identity,
            path: install_path,
        })
    }

    /// Resolve, validate and load an installed parcel.
    pub fn load(&self, identity: &ParcelIdentity) -> Result<Parcel> {
        let mut parcel = Parcel::resolve(
            &self.config.index,
            identity,
            self.config.settings.addressing,
        )?;
        parcel.validate()?;
        parcel.load_contents(&self.library)?;
        Ok(parcel)
    }

    /// Load the installed parcel that was pulled from `locator`.
    pub fn load_by_source(&self, locator: &str) -> Result<Parcel> {
        let identity = self.resolve_source(locator)?;
        self.load(&identity)
    }

    /// Identity of the installed parcel pulled from `locator`.
    pub fn resolve_source(&self, locator: &str) -> Result<ParcelIdentity> {
        self.config
            .index
            .find_by_source(locator)
            .map(|entry| entry.identity())
            .ok_or_else(|| Error::EntryNotFound {
                identity: locator.to_string(),
            })
    }

    /// Render every template of a loaded parcel into `options.output_dir`.
    ///
    /// Returns the written files in render order, each listed once.
    pub fn render(&self, parcel: &Parcel, options: &RenderOptions) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&options.output_dir).map_err(|e| Error::Filesystem {
            message: format!(
                "Failed to create output directory '{}': {}",
                options.output_dir.display(),
                e
            ),
        })?;

        let overrides = match &options.values_path {
            Some(path) if path.exists() => Some(load_values(path)?),
            Some(path) => {
                warn!(
                    "Values file {} does not exist, rendering with bundled values",
                    path.display()
                );
                None
            }
            None => None,
        };
        let values = merge_values(&parcel.values, overrides.as_ref());

        let context = build_context(
            &values,
            &parcel.identity,
            parcel.source(),
            &parcel.assets_directory(),
        )?;

        let mut written: Vec<PathBuf> = Vec::new();
        for template in &parcel.templates {
            info!("Rendering template {}", template.name());
            let rendered = template.render(&context)?;
            let target = options.output_dir.join(template.output_name());
            write_output(&target, &rendered)?;

            if !written.contains(&target) {
                written.push(target);
            } else {
                warn!(
                    "Template {} overwrote {}",
                    template.name(),
                    target.display()
                );
            }
        }

        Ok(written)
    }
}

fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).map_err(|e| Error::Filesystem {
        message: format!("Failed to write file '{}': {}", path.display(), e),
    })
}
