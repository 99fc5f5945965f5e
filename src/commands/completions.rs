//! # Completions Command
//!
//! Prints a shell completion script for `parcel` to stdout.
//!
//! ```bash
//! parcel completions bash > ~/.local/share/bash-completion/completions/parcel
//! parcel completions zsh > ~/.zfunc/_parcel
//! parcel completions fish > ~/.config/fish/completions/parcel.fish
//! ```

use std::io;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(args.shell, &mut command, name, &mut io::stdout());
    Ok(())
}
