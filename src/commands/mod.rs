//! # CLI Command Implementations
//!
//! Each subcommand of the `parcel` tool lives in its own file with:
//! - An `Args` struct derived with `clap`.
//! - An `execute` function that loads the configuration, builds an
//!   `Engine` and reports the outcome.

pub mod completions;
pub mod list;
pub mod pull;
pub mod render;
