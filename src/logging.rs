//! Log output setup for the `parcel` binary.
//!
//! The library only uses the `log` macros. The binary calls [`init`] once,
//! which installs an `env_logger` writing to stderr in either a human text
//! format or one JSON object per line. Both carry `service=parcel`.

use std::io::Write;
use std::str::FromStr;

use log::LevelFilter;

use crate::config::{LogFormat, Settings, LOG_LEVEL_VAR};
use crate::defaults::SERVICE_NAME;
use crate::error::{Error, Result};

/// Pick the effective level.
///
/// The CLI flag wins, then `LOG_LEVEL`, then `DEBUG`, else `info`.
pub fn resolve_level(flag: Option<&str>, settings: &Settings) -> Result<LevelFilter> {
    let (variable, requested) = match flag.map(str::trim).filter(|l| !l.is_empty()) {
        Some(level) => ("--log-level", level),
        None if !settings.log_level.is_empty() => (LOG_LEVEL_VAR, settings.log_level.as_str()),
        None if settings.debug => return Ok(LevelFilter::Debug),
        None => return Ok(LevelFilter::Info),
    };

    LevelFilter::from_str(requested).map_err(|_| Error::ConfigInvalid {
        variable: variable.to_string(),
        message: format!(
            "unknown log level '{}', expected one of off, error, warn, info, debug, trace",
            requested
        ),
    })
}

/// Install the global logger.
///
/// Calling this more than once keeps the first logger.
pub fn init(flag: Option<&str>, settings: &Settings) -> Result<()> {
    let level = resolve_level(flag, settings)?;
    let format = settings.log_format;

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format(move |buf, record| {
            let time = buf.timestamp().to_string();
            let message = record.args().to_string();
            match format {
                LogFormat::Json => writeln!(
                    buf,
                    "{}",
                    json_line(&time, record.level(), record.target(), &message)
                ),
                LogFormat::Text => writeln!(
                    buf,
                    "{} {:<5} service={} {}",
                    time,
                    record.level(),
                    SERVICE_NAME,
                    message
                ),
            }
        })
        .try_init();

    Ok(())
}

fn json_line(time: &str, level: log::Level, target: &str, message: &str) -> String {
    serde_json::json!({
        "time": time,
        "level": level.as_str().to_lowercase(),
        "service": SERVICE_NAME,
        "target": target,
        "message": message,
    })
    .to_string()
}
