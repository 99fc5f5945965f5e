//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use parcel::config::Settings;
use parcel::logging;
use parcel::output::OutputConfig;

use crate::commands;

/// Parcel - Pull versioned template parcels and render them with your values
#[derive(Parser, Debug)]
#[command(name = "parcel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    ///
    /// Overrides the LOG_LEVEL and DEBUG environment variables.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Root directory for installed parcels.
    ///
    /// Overrides the PARCEL_INSTALL_DIR environment variable (default `.parcel`).
    #[arg(long, global = true, value_name = "DIR")]
    install_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a parcel from a source and register it in the index
    Pull(commands::pull::PullArgs),

    /// Render an installed parcel's templates into a directory
    Render(commands::render::RenderArgs),

    /// List installed parcels
    List(commands::list::ListArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let Cli {
            command,
            color,
            log_level,
            install_dir,
        } = self;
        let session = || Session::start(install_dir, log_level.as_deref(), &color);

        match command {
            // Completions never read the environment or the install directory
            Commands::Completions(args) => commands::completions::execute(args),
            Commands::Pull(args) => {
                let Session { settings, out } = session()?;
                commands::pull::execute(args, settings, &out)
            }
            Commands::Render(args) => {
                let Session { settings, out } = session()?;
                commands::render::execute(args, settings, &out)
            }
            Commands::List(args) => {
                let Session { settings, out } = session()?;
                commands::list::execute(args, settings, &out)
            }
        }
    }
}

/// Settings, logging and output style for commands that touch parcels.
struct Session {
    settings: Settings,
    out: OutputConfig,
}

impl Session {
    fn start(install_dir: Option<PathBuf>, log_level: Option<&str>, color: &str) -> Result<Self> {
        let mut settings = Settings::from_env()?;
        if let Some(install_dir) = install_dir {
            settings.install_dir = install_dir;
        }
        logging::init(log_level, &settings)?;
        let out = OutputConfig::from_env_and_flag(color);
        Ok(Self { settings, out })
    }
}
