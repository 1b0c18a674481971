//! Command-line interface definitions.
//!
//! This module defines the CLI structure using clap. Every option of `plan`
//! is optional so that unset flags fall back to the configuration file.

use crate::tui::BANNER;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "discpack")]
#[command(about = "Plan how to split a directory tree across optical discs")]
#[command(before_help = BANNER)]
#[command(version)]
pub struct Args {
    /// Read configuration from this file instead of ~/.config/discpack/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a folder and pack its files onto discs
    Plan(PlanArgs),
    /// List the built-in media profiles and capacity units
    Profiles,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlanArgs {
    /// Root folder to scan recursively
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Media profile to use (see `discpack profiles`)
    #[arg(long, conflicts_with = "capacity")]
    pub profile: Option<String>,

    /// Custom capacity value, interpreted in --unit
    #[arg(long)]
    pub capacity: Option<f64>,

    /// Unit for --capacity (B, KB, KiB, MB, MiB, GB, GiB, TB, TiB)
    #[arg(long)]
    pub unit: Option<String>,

    /// Safety reserve as percent of capacity
    #[arg(long, value_name = "PERCENT")]
    pub reserve: Option<f64>,

    /// Bytes added to every file when packing
    #[arg(long, value_name = "BYTES")]
    pub per_file_overhead: Option<u64>,

    /// Only include files with these extensions (e.g. mkv,flac)
    #[arg(long = "include-ext", value_name = "EXT", value_delimiter = ',')]
    pub include_ext: Vec<String>,

    /// Glob patterns to exclude, matched against file names
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Follow symlinks when scanning
    #[arg(long, conflicts_with = "no_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Do not follow symlinks, even if the config file enables it
    #[arg(long)]
    pub no_follow_symlinks: bool,

    /// Include hidden files and folders
    #[arg(long, conflicts_with = "no_hidden")]
    pub include_hidden: bool,

    /// Ignore hidden files and folders
    #[arg(long)]
    pub no_hidden: bool,

    /// Write the plan as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Write the plan as CSV (disc_index, file_path, size_bytes)
    #[arg(long, value_name = "PATH")]
    pub export_csv: Option<PathBuf>,

    /// Also write the text report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Create a staging directory with one disc_NNN folder per disc
    #[arg(long, alias = "materialize", value_name = "DIR")]
    pub materialise: Option<PathBuf>,

    /// How to place files in staging: symlink, hardlink or copy
    #[arg(long, value_name = "TYPE")]
    pub link_type: Option<String>,

    /// Number of staging entries to create concurrently
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Write a text log of the run to the current directory
    #[arg(long)]
    pub log: bool,
}

impl PlanArgs {
    /// Hidden-file setting requested on the command line, if any.
    pub fn hidden_override(&self) -> Option<bool> {
        if self.include_hidden {
            Some(false)
        } else if self.no_hidden {
            Some(true)
        } else {
            None
        }
    }

    /// Symlink-following setting requested on the command line, if any.
    pub fn follow_symlinks_override(&self) -> Option<bool> {
        if self.follow_symlinks {
            Some(true)
        } else if self.no_follow_symlinks {
            Some(false)
        } else {
            None
        }
    }
}
