//! # Terminal Output
//!
//! Commands decorate their progress lines with emoji and colour. Whether that
//! happens is decided once per run from the `--color` flag and the usual
//! environment conventions:
//! - `--color=always|never|auto`
//! - `NO_COLOR` set to anything disables colour (https://no-color.org/)
//! - `CLICOLOR=0` disables colour, `CLICOLOR_FORCE=1` forces it
//! - `TERM=dumb` disables colour
//!
//! ```rust,ignore
//! use parcel::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Pulling...", emoji(&out, "📦", "[PULL]"));
//! ```

use std::env;

use console::style;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether colour and emoji should be used.
    pub use_color: bool,
}

impl OutputConfig {
    /// Decide colour support from the `--color` flag value and environment.
    ///
    /// `always` wins over `NO_COLOR`; anything other than `always` or `never`
    /// is treated as `auto`.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(&|name| env::var(name).ok()),
        };

        Self { use_color }
    }

    fn detect_color_support(lookup: &dyn Fn(&str) -> Option<String>) -> bool {
        if lookup("NO_COLOR").is_some() {
            return false;
        }

        if lookup("CLICOLOR").is_some_and(|v| v == "0") {
            return false;
        }

        if lookup("CLICOLOR_FORCE").is_some_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if lookup("TERM").is_some_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colour is on, otherwise the plain marker.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Bold text when colour is on.
pub fn bold(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).bold().to_string()
    } else {
        text.to_string()
    }
}

/// Dimmed text when colour is on.
pub fn dim(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).dim().to_string()
    } else {
        text.to_string()
    }
}
