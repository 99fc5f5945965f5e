//! # Parcel Library
//!
//! This library pulls versioned template bundles ("parcels") from git sources
//! into a local install directory, keeps an index of what is installed, and
//! renders a parcel's templates against its bundled values merged with caller
//! overrides. It backs the `parcel` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use parcel::source::{decode_directory_name, derive_directory_name, ProtocolTable};
//!
//! let protocols = ProtocolTable::standard().unwrap();
//! let locator = "git::ssh://github.com/acme/widgets.git//parcels/api?ref=api-v1.2.0";
//!
//! let fields = protocols.parse(locator).unwrap();
//! assert_eq!(fields.owner, "acme");
//! assert_eq!(fields.name(), "api");
//! assert_eq!(fields.version(), "v1.2.0");
//!
//! let directory = derive_directory_name(locator);
//! assert!(!directory.contains('/'));
//! assert_eq!(decode_directory_name(&directory).as_deref(), Some(locator));
//! ```
//!
//! ## Core Concepts
//!
//! - **Sources (`source`)**: Locators such as `git::ssh://host/owner/repo.git?ref=v1`,
//!   the protocol allow-list, and how install directory names are derived.
//! - **Index (`index`)**: The YAML registry of installed parcels, keyed by
//!   `owner/name/version`.
//! - **Parcels (`parcel`, `manifest`, `values`, `template`)**: An installed
//!   parcel's manifest, default values and compiled templates.
//! - **Engine (`engine`, `fetcher`)**: The pull pipeline (validate, fetch,
//!   register) and the render pipeline (load, merge, render, write).
//! - **Ambient (`config`, `logging`, `output`, `error`)**: Environment
//!   settings, log setup, terminal styling and the error type.
//!
//! ## Execution Flow
//!
//! 1.  **Configure**: `config::Settings::from_env` and `config::Config::load`.
//! 2.  **Pull**: `engine::Engine::pull` installs a parcel and records it.
//! 3.  **Load**: `engine::Engine::load` resolves and validates it.
//! 4.  **Render**: `engine::Engine::render` writes one file per template.

pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod index;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod parcel;
pub mod source;
pub mod template;
pub mod values;

#[cfg(test)]
mod source_proptest;
