//! # Render Command
//!
//! Renders every template of an installed parcel into an output directory.
//! The parcel is named either by `OWNER NAME VERSION` or by the locator it
//! was pulled from (`--source`). Values from `--values` override the
//! parcel's bundled defaults key by key.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use parcel::config::{Config, Settings};
use parcel::engine::{Engine, RenderOptions};
use parcel::index::ParcelIdentity;
use parcel::output::{bold, dim, emoji, OutputConfig};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Parcel owner.
    #[arg(value_name = "OWNER", required_unless_present = "source", requires = "name")]
    pub owner: Option<String>,

    /// Parcel name.
    #[arg(value_name = "NAME", requires = "version")]
    pub name: Option<String>,

    /// Parcel version.
    #[arg(value_name = "VERSION")]
    pub version: Option<String>,

    /// Select the installed parcel by the locator it was pulled from.
    #[arg(short, long, value_name = "LOCATOR", conflicts_with_all = ["owner", "name", "version"])]
    pub source: Option<String>,

    /// Values file overriding the parcel's bundled values.
    ///
    /// A path that does not exist is ignored with a warning.
    #[arg(short = 'v', long, value_name = "FILE")]
    pub values: Option<PathBuf>,

    /// Directory receiving the rendered files. Created when missing.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,
}

pub fn execute(args: RenderArgs, settings: Settings, out: &OutputConfig) -> Result<()> {
    let config = Config::load(settings)?;
    let engine = Engine::new(config)?;

    let parcel = match (&args.source, args.owner, args.name, args.version) {
        (Some(locator), ..) => engine.load_by_source(locator)?,
        (None, Some(owner), Some(name), Some(version)) => engine.load(&ParcelIdentity {
            owner,
            name,
            version,
        })?,
        _ => bail!("Specify the parcel as OWNER NAME VERSION or with --source LOCATOR"),
    };

    println!(
        "{} Rendering {} into {}",
        emoji(out, "🧩", "[RENDER]"),
        bold(out, &parcel.id()),
        args.output.display()
    );

    let written = engine.render(
        &parcel,
        &RenderOptions {
            values_path: args.values,
            output_dir: args.output,
        },
    )?;

    for path in &written {
        println!("   {}", dim(out, &path.display().to_string()));
    }
    println!(
        "{} Rendered {} file(s)",
        emoji(out, "✅", "[OK]"),
        written.len()
    );
    Ok(())
}
