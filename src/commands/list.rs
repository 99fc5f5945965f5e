//! # List Command
//!
//! Shows the parcels recorded in the index, either as a human-readable list
//! or as JSON for scripts.

use anyhow::Result;
use clap::Args;

use parcel::config::{Config, Settings};
use parcel::index::Entry;
use parcel::output::{bold, dim, emoji, OutputConfig};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print the index entries as a JSON array.
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: ListArgs, settings: Settings, out: &OutputConfig) -> Result<()> {
    let config = Config::load(settings)?;
    let entries: Vec<&Entry> = config.index.entries().map(|(_, entry)| entry).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!(
            "{} No parcels installed in {}",
            emoji(out, "📭", "[EMPTY]"),
            config.settings.install_dir.display()
        );
        return Ok(());
    }

    for entry in &entries {
        let identity = entry.identity().to_string();
        if entry.description.is_empty() {
            println!("{}", bold(out, &identity));
        } else {
            println!("{}  {}", bold(out, &identity), entry.description);
        }
        println!("   {}", dim(out, &format!("source: {}", entry.source)));
        println!("   {}", dim(out, &format!("path:   {}", entry.path)));
    }
    println!(
        "{} {} parcel(s) installed",
        emoji(out, "📦", "[INFO]"),
        entries.len()
    );
    Ok(())
}
