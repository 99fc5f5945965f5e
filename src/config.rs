//! # Runtime Configuration
//!
//! Settings come from a fixed table of environment variables. Each row names
//! the variable, its default, and the setter that parses the raw string into
//! [`Settings`]. Rows are evaluated in order and the first bad value aborts
//! with [`Error::ConfigInvalid`].
//!
//! | Variable             | Default   | Meaning                                 |
//! |----------------------|-----------|-----------------------------------------|
//! | `PARCEL_INSTALL_DIR` | `.parcel` | Root directory for installed parcels    |
//! | `PARCEL_ADDRESSING`  | `encoded` | `encoded` or `structured` directory names |
//! | `LOG_LEVEL`          |           | `error`, `warn`, `info`, `debug`, `trace` |
//! | `LOG_FORMAT`         | `text`    | `text` or `json`                        |
//! | `DEBUG`              | `false`   | Debug logging when no level is given    |
//!
//! [`Config`] pairs the settings with the index loaded for this run. It is
//! built once by the binary and passed to the engine; nothing in the library
//! reads the environment on its own.

use std::path::PathBuf;

use crate::defaults::INDEX_FILE;
use crate::error::{Error, Result};
use crate::index::Index;
use crate::source::AddressingScheme;

pub const INSTALL_DIR_VAR: &str = "PARCEL_INSTALL_DIR";
pub const ADDRESSING_VAR: &str = "PARCEL_ADDRESSING";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";
pub const DEBUG_VAR: &str = "DEBUG";

/// Process-wide settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub install_dir: PathBuf,
    pub addressing: AddressingScheme,
    /// Requested log level; empty means "not set".
    pub log_level: String,
    pub log_format: LogFormat,
    pub debug: bool,
}

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

type Setter = fn(&mut Settings, &str) -> std::result::Result<(), String>;

const SETTINGS_TABLE: &[(Setter, &str, &str)] = &[
    (set_install_dir, INSTALL_DIR_VAR, ".parcel"),
    (set_addressing, ADDRESSING_VAR, "encoded"),
    (set_log_level, LOG_LEVEL_VAR, ""),
    (set_log_format, LOG_FORMAT_VAR, "text"),
    (set_debug, DEBUG_VAR, "false"),
];

fn set_install_dir(settings: &mut Settings, value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        return Err("install directory must not be empty".to_string());
    }
    settings.install_dir = PathBuf::from(value);
    Ok(())
}

fn set_addressing(settings: &mut Settings, value: &str) -> std::result::Result<(), String> {
    settings.addressing = value.parse()?;
    Ok(())
}

fn set_log_level(settings: &mut Settings, value: &str) -> std::result::Result<(), String> {
    settings.log_level = value.trim().to_string();
    Ok(())
}

fn set_log_format(settings: &mut Settings, value: &str) -> std::result::Result<(), String> {
    settings.log_format = LogFormat::parse(value);
    Ok(())
}

fn set_debug(settings: &mut Settings, value: &str) -> std::result::Result<(), String> {
    settings.debug = parse_bool(value)?;
    Ok(())
}

/// Boolean parsing that accepts the usual spellings of true and false.
pub fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            install_dir: crate::defaults::default_install_dir(),
            addressing: AddressingScheme::default(),
            log_level: String::new(),
            log_format: LogFormat::default(),
            debug: false,
        }
    }
}

impl Settings {
    /// Resolve settings using `lookup` to read each variable.
    ///
    /// A variable that is unset or set to the empty string uses its default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        for (setter, variable, default) in SETTINGS_TABLE {
            let raw = lookup(variable)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string());
            setter(&mut settings, &raw).map_err(|message| Error::ConfigInvalid {
                variable: variable.to_string(),
                message,
            })?;
        }
        Ok(settings)
    }

    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn index_path(&self) -> PathBuf {
        self.install_dir.join(INDEX_FILE)
    }
}

/// Settings plus the index for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub index: Index,
}

impl Config {
    /// Load the index under the configured install directory.
    ///
    /// The directory and an empty index file are created when missing.
    pub fn load(settings: Settings) -> Result<Self> {
        let index = Index::load(settings.index_path())?;
        Ok(Self { settings, index })
    }
}
