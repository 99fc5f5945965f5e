//! Default values and fixed layout names for parcel.
//!
//! These are constants of the parcel layout: every installed parcel carries
//! the same subpaths, and the index always lives at the same place under the
//! install root.

use std::path::PathBuf;

/// Directory inside a parcel that holds the templates to render.
pub const TEMPLATE_DIRECTORY: &str = "templates";

/// Bundled default values document inside a parcel.
pub const VALUES_FILE: &str = "values.yaml";

/// Static assets directory inside a parcel.
pub const ASSETS_DIRECTORY: &str = "assets";

/// Manifest describing a parcel's identity.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Index file name, relative to the install root.
pub const INDEX_FILE: &str = "index.yaml";

/// Version reported for a source that carries no ref.
pub const LATEST_VERSION: &str = "latest";

/// Longest install directory name, in bytes, most filesystems accept.
///
/// Encoded names grow by a third over the locator, so locators longer than
/// 189 bytes cannot be installed under the encoded scheme.
pub const MAX_DIRECTORY_NAME: usize = 255;

/// Name attached to every log record.
pub const SERVICE_NAME: &str = "parcel";

/// Returns the default install root.
///
/// Parcels are installed next to the project that uses them, so the default
/// is the relative `.parcel` directory. Override it with the
/// `PARCEL_INSTALL_DIR` environment variable or the `--install-dir` flag.
pub fn default_install_dir() -> PathBuf {
    PathBuf::from(".parcel")
}
