//! # Parcel CLI
//!
//! This is the binary entry point for the `parcel` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Resolving settings from the environment and setting up logging.
//! - Executing the selected command and reporting failures.
//!
//! The pull and render pipelines live in the `parcel` library crate; the
//! binary is a thin wrapper around them.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
