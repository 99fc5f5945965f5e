//! # Error Handling
//!
//! This module defines the centralized error type for `parcel`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! the resolution, fetch and render pipelines can report.
//!
//! ## Layers
//!
//! - **Source rejection**: `UnsupportedSource`, `MalformedSource` and
//!   `SourceTooLong` are raised before any I/O happens.
//! - **Registry**: `EntryNotFound`, `IndexCorrupt` and `IndexPersistFailed`
//!   come from the on-disk index. An index that cannot be opened or read at
//!   all is a `Filesystem` error.
//! - **Parcel**: `ValidationFailed` aggregates every violated precondition of a
//!   parcel instead of stopping at the first one.
//! - **Pull**: `FetchFailed` and `ManifestInvalid`.
//! - **Render**: `ValuesInvalid`, `RenderFailed` (naming the template) and
//!   `Filesystem` for output writes.
//!
//! Lower layers return these typed failures and pipelines attach the path,
//! locator or template that makes them actionable. Nothing is retried
//! automatically.

use thiserror::Error;

/// Main error type for parcel operations
#[derive(Error, Debug)]
pub enum Error {
    /// The locator does not start with any allowed protocol prefix.
    #[error("Unsupported source '{locator}': must start with one of {}", allowed.join(", "))]
    UnsupportedSource {
        locator: String,
        allowed: Vec<String>,
    },

    /// The locator matched a protocol prefix but not its grammar.
    #[error("Could not parse source '{locator}' with the {protocol} grammar")]
    MalformedSource { locator: String, protocol: String },

    /// The install directory name derived from the locator is too long.
    #[error("Source '{locator}' needs a {length}-byte directory name, over the {max}-byte limit")]
    SourceTooLong {
        locator: String,
        length: usize,
        max: usize,
    },

    /// No index entry exists for the requested parcel identity.
    #[error("No installed parcel found for {identity}")]
    EntryNotFound { identity: String },

    /// The index file exists but could not be parsed.
    #[error("Index at {path} is corrupt: {message}")]
    IndexCorrupt { path: String, message: String },

    /// Writing the index back to disk failed.
    #[error("Could not persist index to {path}: {message}")]
    IndexPersistFailed { path: String, message: String },

    /// One or more parcel preconditions are not met.
    ///
    /// Every problem found is listed, not just the first.
    #[error("Invalid parcel {parcel}:\n  - {}", problems.join("\n  - "))]
    ValidationFailed {
        parcel: String,
        problems: Vec<String>,
    },

    /// The source fetcher reported an error.
    #[error("Unable to pull parcel from {locator}: {message}")]
    FetchFailed { locator: String, message: String },

    /// The manifest of a freshly fetched parcel is missing or malformed.
    #[error("Unable to load parcel manifest {path}: {message}")]
    ManifestInvalid { path: String, message: String },

    /// A values document could not be read or is not a mapping.
    #[error("Unable to load values from {path}: {message}")]
    ValuesInvalid { path: String, message: String },

    /// A template failed to parse or execute.
    #[error("Error rendering template {template}: {message}")]
    RenderFailed { template: String, message: String },

    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {variable}: {message}")]
    ConfigInvalid { variable: String, message: String },

    /// An error occurred while reading the index or writing rendered output.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// The render context could not be built from the loaded values.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
