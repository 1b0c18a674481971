//! Error types.
//!
//! Configuration problems are detected before any scanning or filesystem
//! mutation starts. Export and materialisation errors carry the I/O cause.
//! A broken placement invariant is not represented here: the packer panics.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid run configuration, reported before any side effect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The media profile name is not in the profile table
    #[error("unknown media profile '{name}' (known: {known})")]
    UnknownProfile { name: String, known: String },

    /// The capacity unit is not in the unit table
    #[error("unknown capacity unit '{unit}' (known: {known})")]
    UnknownUnit { unit: String, known: String },

    /// The link strategy is not one of symlink, hardlink, copy
    #[error("unknown link type '{0}' (expected symlink, hardlink or copy)")]
    UnknownLinkStrategy(String),

    #[error("invalid capacity value {0}: must be a finite, non-negative number")]
    InvalidCapacity(f64),

    #[error("invalid reserve {0}%: must be a finite, non-negative percentage")]
    InvalidReserve(f64),

    /// An exclude glob failed to compile
    #[error("invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Failure while writing a manifest.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialisation failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialisation failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Fatal materialisation failure. Per-file failures are collected in a
/// [`MaterialiseReport`](crate::materialise::MaterialiseReport) instead.
#[derive(Error, Debug)]
pub enum MaterialiseError {
    #[error("cannot create staging directory {path}: {source}")]
    CreateTarget {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("materialise worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
