//! # Source Locators
//!
//! A source locator names where a parcel's content comes from, for example
//! `git::ssh://github.com/acme/widgets.git//charts/api?ref=api-v1.2.0`.
//! This module turns locators into install directory names and back. It is
//! pure: nothing here touches the filesystem or the network.
//!
//! ## Addressing schemes
//!
//! - **Encoded** (default): the directory name is the URL-safe base64
//!   encoding of the whole locator. It is reversible, so the original
//!   locator can always be recovered from an install directory.
//! - **Structured**: the locator is decomposed with the grammar of its
//!   protocol and the directory name is built from `owner`, `repository`,
//!   subdirectory name and version.
//!
//! A deployment picks one scheme through configuration; mixing both inside
//! one index would make install directories ambiguous.
//!
//! ## Protocol grammars
//!
//! The supported protocols live in a [`ProtocolTable`] that is compiled once
//! and passed to whoever needs to parse locators.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use regex::Regex;

use crate::defaults::{LATEST_VERSION, MAX_DIRECTORY_NAME};
use crate::error::{Error, Result};

/// Git over SSH.
pub const GIT_SSH: &str = "git::ssh";
/// Git over HTTPS.
pub const GIT_HTTPS: &str = "git::https";
/// Git repository on the local filesystem.
pub const GIT_FILE: &str = "git::file";

const GIT_SSH_PATTERN: &str = r"^git::(?P<url>ssh://(?P<host>[^/]+)/(?P<owner>[^/]+)/(?P<repository>[^/?.][^/?]*?)(?:\.git)?)(?://(?P<subdir>[-\w/]+))?(?:\?ref=(?P<ref>.+))?$";
const GIT_HTTPS_PATTERN: &str = r"^git::(?P<url>https://(?P<host>[^/]+)/(?P<owner>[^/]+)/(?P<repository>[^/?.][^/?]*?)(?:\.git)?)(?://(?P<subdir>[-\w/]+))?(?:\?ref=(?P<ref>.+))?$";
const GIT_FILE_PATTERN: &str = r"^git::(?P<url>file://(?P<base>(?:/[^/]+)*?)/(?P<owner>[^/]+)/(?P<repository>[^/?.][^/?]*?)(?:/\.git|\.git)?)(?://(?P<subdir>[-\w/]+))?(?:\?ref=(?P<ref>.+))?$";

/// How install directory names are derived from locators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressingScheme {
    /// Reversible base64 encoding of the full locator.
    #[default]
    Encoded,
    /// `owner-repository[-subdir]-version` built from the parsed locator.
    Structured,
}

impl AddressingScheme {
    /// Derive the install directory name for `locator` under this scheme.
    ///
    /// Fails with [`Error::SourceTooLong`] when the name would not fit in a
    /// single path component.
    pub fn directory_name(&self, protocols: &ProtocolTable, locator: &str) -> Result<String> {
        let name = match self {
            AddressingScheme::Encoded => derive_directory_name(locator),
            AddressingScheme::Structured => protocols.parse(locator)?.directory_name(),
        };
        if name.len() > MAX_DIRECTORY_NAME {
            return Err(Error::SourceTooLong {
                locator: locator.to_string(),
                length: name.len(),
                max: MAX_DIRECTORY_NAME,
            });
        }
        Ok(name)
    }
}

impl FromStr for AddressingScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "encoded" => Ok(AddressingScheme::Encoded),
            "structured" => Ok(AddressingScheme::Structured),
            other => Err(format!(
                "unknown addressing scheme '{}', expected 'encoded' or 'structured'",
                other
            )),
        }
    }
}

impl fmt::Display for AddressingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingScheme::Encoded => write!(f, "encoded"),
            AddressingScheme::Structured => write!(f, "structured"),
        }
    }
}

/// The named parts of a structured locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFields {
    /// Protocol prefix the locator matched, e.g. `git::ssh`.
    pub protocol: String,
    /// URL handed to git: the locator without `git::`, subdirectory or ref.
    pub url: String,
    /// Remote host; empty for `git::file`.
    pub host: String,
    pub owner: String,
    pub repository: String,
    /// Path inside the repository that holds the parcel.
    pub subdirectory: Option<String>,
    /// Raw `?ref=` value as written in the locator.
    pub reference: Option<String>,
}

impl SourceFields {
    /// Parcel name: the last subdirectory component, or the repository.
    pub fn name(&self) -> &str {
        self.subdirectory_name().unwrap_or(&self.repository)
    }

    /// The effective version tag.
    ///
    /// Monorepo tags often repeat the parcel name (`api-v1.2.0` for the `api`
    /// parcel); that redundant component is stripped. A locator without a
    /// ref resolves to `latest`.
    pub fn version(&self) -> String {
        effective_version(self.reference.as_deref(), self.name())
    }

    /// Directory name under the structured scheme.
    pub fn directory_name(&self) -> String {
        let version = self.version().replace('/', "-");
        let parts = [
            self.owner.as_str(),
            self.repository.as_str(),
            self.subdirectory_name().unwrap_or(""),
            version.as_str(),
        ];
        join_non_empty(&parts, "-")
    }

    fn subdirectory_name(&self) -> Option<&str> {
        self.subdirectory
            .as_deref()
            .and_then(|subdir| subdir.trim_matches('/').rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone)]
struct Grammar {
    prefix: &'static str,
    pattern: Regex,
}

/// Compiled grammars for every supported protocol.
///
/// Build it once with [`ProtocolTable::standard`] and pass it around; the
/// order of grammars is the order prefixes are tried.
#[derive(Debug, Clone)]
pub struct ProtocolTable {
    grammars: Vec<Grammar>,
}

impl ProtocolTable {
    /// The allow-list of protocols parcel knows how to fetch.
    pub fn standard() -> Result<Self> {
        let grammars = [
            (GIT_SSH, GIT_SSH_PATTERN),
            (GIT_HTTPS, GIT_HTTPS_PATTERN),
            (GIT_FILE, GIT_FILE_PATTERN),
        ]
        .into_iter()
        .map(|(prefix, pattern)| {
            Ok(Grammar {
                prefix,
                pattern: Regex::new(pattern)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self { grammars })
    }

    /// Protocol prefixes in the allow-list.
    pub fn prefixes(&self) -> Vec<String> {
        self.grammars.iter().map(|g| g.prefix.to_string()).collect()
    }

    /// Check that `locator` uses an allowed protocol, returning its prefix.
    pub fn ensure_supported(&self, locator: &str) -> Result<&'static str> {
        self.grammar_for(locator)
            .map(|grammar| grammar.prefix)
            .ok_or_else(|| Error::UnsupportedSource {
                locator: locator.to_string(),
                allowed: self.prefixes(),
            })
    }

    /// Decompose `locator` with the grammar of its protocol.
    pub fn parse(&self, locator: &str) -> Result<SourceFields> {
        let grammar = self
            .grammar_for(locator)
            .ok_or_else(|| Error::UnsupportedSource {
                locator: locator.to_string(),
                allowed: self.prefixes(),
            })?;

        let captures = grammar
            .pattern
            .captures(locator)
            .ok_or_else(|| Error::MalformedSource {
                locator: locator.to_string(),
                protocol: grammar.prefix.to_string(),
            })?;

        let group = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty())
        };

        Ok(SourceFields {
            protocol: grammar.prefix.to_string(),
            url: group("url").unwrap_or_default(),
            host: group("host").unwrap_or_default(),
            owner: group("owner").unwrap_or_default(),
            repository: group("repository").unwrap_or_default(),
            subdirectory: group("subdir"),
            reference: group("ref"),
        })
    }

    fn grammar_for(&self, locator: &str) -> Option<&Grammar> {
        self.grammars.iter().find(|grammar| {
            locator
                .strip_prefix(grammar.prefix)
                .is_some_and(|rest| rest.starts_with("://"))
        })
    }
}

/// Encode a locator into a filesystem-safe directory name.
///
/// Uses the URL-safe base64 alphabet, so the result never contains `/`.
pub fn derive_directory_name(locator: &str) -> String {
    URL_SAFE.encode(locator.as_bytes())
}

/// Recover the locator from a directory name made by [`derive_directory_name`].
///
/// Returns `None` when the name is not a valid encoding.
pub fn decode_directory_name(directory_name: &str) -> Option<String> {
    let bytes = URL_SAFE.decode(directory_name.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

fn effective_version(reference: Option<&str>, name: &str) -> String {
    let raw = match reference {
        Some(r) if !r.is_empty() => r,
        _ => return LATEST_VERSION.to_string(),
    };

    if !name.is_empty() {
        let prefixed = format!("{}-", name);
        if let Some(stripped) = raw.strip_prefix(&prefixed).filter(|s| !s.is_empty()) {
            return stripped.to_string();
        }
        let suffixed = format!("-{}", name);
        if let Some(stripped) = raw.strip_suffix(&suffixed).filter(|s| !s.is_empty()) {
            return stripped.to_string();
        }
    }

    raw.to_string()
}

fn join_non_empty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}
