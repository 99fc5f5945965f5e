//! # Pull Command
//!
//! Fetches a parcel from a source locator into the install directory and
//! records it in the index. Pulling something that is already installed is a
//! no-op unless `--force` is given.

use anyhow::Result;
use clap::Args;

use parcel::config::{Config, Settings};
use parcel::engine::{Engine, PullOptions, PullOutcome};
use parcel::output::{bold, emoji, OutputConfig};

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Source locator, e.g. `git::ssh://github.com/acme/widgets.git?ref=v1`.
    ///
    /// Supported protocols are git::ssh, git::https and git::file. A
    /// subdirectory may follow the repository after `//`.
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Fetch again even if the parcel is already installed.
    #[arg(short, long)]
    pub force: bool,
}

pub fn execute(args: PullArgs, settings: Settings, out: &OutputConfig) -> Result<()> {
    let config = Config::load(settings)?;
    let mut engine = Engine::new(config)?;

    println!("{} Pulling {}", emoji(out, "📦", "[PULL]"), args.source);

    let outcome = engine.pull(&args.source, &PullOptions { force: args.force });
    match outcome {
        Ok(PullOutcome::Installed { identity, path }) => {
            println!(
                "{} Installed {} to {}",
                emoji(out, "✅", "[OK]"),
                bold(out, &identity.to_string()),
                path.display()
            );
            Ok(())
        }
        Ok(PullOutcome::Skipped { path }) => {
            println!(
                "{} Already installed at {} (use --force to fetch again)",
                emoji(out, "⏭️", "[SKIP]"),
                path.display()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} Pull failed", emoji(out, "❌", "[ERR]"));
            Err(e.into())
        }
    }
}
