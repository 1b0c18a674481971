//! # discpack - Disc Packing Planner
//!
//! discpack splits a directory tree across fixed-capacity media such as CDs,
//! DVDs and Blu-ray discs. It scans a folder, packs the files onto as few
//! discs as First-Fit-Decreasing manages, and reports the plan. The plan can
//! be exported as JSON or CSV and staged on disk as one folder per disc,
//! ready for burning.
//!
//! ## Features
//!
//! - **Media Profiles**: Built-in capacities for CD, DVD and BD-R media, or any
//!   explicit capacity in decimal or binary units
//! - **Safety Reserve**: A percentage of every disc held back, plus an optional
//!   per-file overhead for filesystem bookkeeping
//! - **Filtered Scanning**: Extension allow-lists, exclude globs and hidden-file
//!   handling
//! - **Manifests**: JSON and CSV exports of the plan
//! - **Staging**: `disc_NNN` folders of symlinks, hard links or copies, with
//!   per-file failures collected instead of aborting the run
//!
//! ## Command Line Usage
//!
//! ```bash
//! # Plan the current directory onto single-layer DVDs
//! discpack plan
//!
//! # Plan onto 25 GB Blu-ray, video only, and export the manifest
//! discpack plan /srv/video --profile bdr25 --include-ext mkv,mp4 --export-json plan.json
//!
//! # Custom capacity, staged as hard links
//! discpack plan ./photos --capacity 700 --unit MiB --materialise ./stage --link-type hardlink
//!
//! # List media profiles and units
//! discpack profiles
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use discpack::capacity::{CapacityConfig, CapacitySource};
//! use discpack::packer::first_fit_decreasing;
//! use discpack::report::render_report;
//! use discpack::scanner::{scan_files, ScanOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let capacity = CapacityConfig::resolve(&CapacitySource::Profile("dvd5".into()), 2.0, 0)?;
//! let stats = scan_files(Path::new("/srv/video"), &ScanOptions::default(), |_| {});
//!
//! let result = first_fit_decreasing(stats.files, &capacity);
//! print!("{}", render_report(&result, &capacity));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! discpack reads `~/.config/discpack/config.toml`, created with defaults on
//! first run. Command-line flags override its values.
//!
//! - **media**: Profile or capacity, unit, reserve percentage, per-file overhead
//! - **scan**: Extension allow-list, exclude globs, symlink and hidden handling
//! - **stage**: Link type and staging concurrency
//! - **ui**: Progress display and color theme
//!
//! ## Module Organization
//!
//! - [`capacity`]: Media profiles, units and reserve arithmetic
//! - [`cli`]: Command-line argument parsing
//! - [`config`]: Configuration management
//! - [`error`]: Error types
//! - [`export`]: JSON and CSV manifests
//! - [`log`]: Log file generation
//! - [`materialise`]: Staging tree creation
//! - [`packer`]: First-Fit-Decreasing packing
//! - [`plan`]: The plan command
//! - [`report`]: Text report rendering
//! - [`scanner`]: File system scanning
//! - [`tui`]: Terminal status output

pub mod capacity;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod log;
pub mod materialise;
pub mod packer;
pub mod plan;
pub mod report;
pub mod scanner;
pub mod tui;

// Re-export commonly used types
pub use capacity::{CapacityConfig, CapacitySource};
pub use config::Config;
pub use error::{ConfigError, ExportError, MaterialiseError};
pub use materialise::{LinkStrategy, MaterialiseReport};
pub use packer::{Bin, FileRecord, PackingResult, first_fit_decreasing};
pub use scanner::{ScanOptions, ScanStats};
