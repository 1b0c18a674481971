//! Staging tree creation.
//!
//! This module realises a packing plan on disk: one `disc_NNN` directory per
//! disc under the staging root, holding a symlink, hard link or copy of every
//! file packed onto that disc. Existing entries are replaced, so running it
//! twice with the same plan leaves the same tree.
//!
//! Failures for individual files do not stop the run. They are collected in
//! the returned [`MaterialiseReport`].

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::task;
use tracing::{debug, warn};

use crate::error::{ConfigError, MaterialiseError};
use crate::packer::PackingResult;

/// How a staged entry refers to the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStrategy {
    Symlink,
    Hardlink,
    Copy,
}

impl LinkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStrategy::Symlink => "symlink",
            LinkStrategy::Hardlink => "hardlink",
            LinkStrategy::Copy => "copy",
        }
    }
}

impl fmt::Display for LinkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "symlink" => Ok(LinkStrategy::Symlink),
            "hardlink" => Ok(LinkStrategy::Hardlink),
            "copy" => Ok(LinkStrategy::Copy),
            other => Err(ConfigError::UnknownLinkStrategy(other.to_string())),
        }
    }
}

/// Name of the staging directory for a 1-based disc index.
///
/// ```
/// assert_eq!(discpack::materialise::disc_dir_name(7), "disc_007");
/// ```
pub fn disc_dir_name(index: usize) -> String {
    format!("disc_{:03}", index)
}

/// A staged entry that could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialiseFailure {
    pub disc: usize,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub reason: String,
}

impl fmt::Display for MaterialiseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to stage {} -> {}: {}",
            self.source.display(),
            self.destination.display(),
            self.reason
        )
    }
}

/// Outcome of a materialisation run.
#[derive(Debug, Clone)]
pub struct MaterialiseReport {
    pub target: PathBuf,
    pub strategy: LinkStrategy,
    /// Entries created successfully
    pub placed: usize,
    /// Entries that failed, ordered by disc then packing order
    pub failures: Vec<MaterialiseFailure>,
}

impl MaterialiseReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One entry to create, in plan order.
#[derive(Debug, Clone)]
struct StagedEntry {
    disc: usize,
    order: usize,
    source: PathBuf,
    destination: PathBuf,
}

impl StagedEntry {
    fn fail(&self, reason: impl Into<String>) -> MaterialiseFailure {
        MaterialiseFailure {
            disc: self.disc,
            source: self.source.clone(),
            destination: self.destination.clone(),
            reason: reason.into(),
        }
    }
}

/// Creates the staging root and disc directories and works out every
/// destination. Entries that already fail here (no base name, duplicate base
/// name on the same disc, disc directory not creatable) go straight to the
/// failure list.
fn prepare_layout(
    result: &PackingResult,
    target: &Path,
) -> Result<(Vec<StagedEntry>, Vec<(usize, MaterialiseFailure)>), MaterialiseError> {
    fs::create_dir_all(target).map_err(|source| MaterialiseError::CreateTarget {
        path: target.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    let mut failures = Vec::new();
    let mut order = 0;

    for bin in &result.bins {
        let disc_dir = target.join(disc_dir_name(bin.index()));
        let dir_error = fs::create_dir_all(&disc_dir).err();
        let mut claimed = HashSet::new();

        for file in bin.files() {
            order += 1;
            let Some(name) = file.path.file_name() else {
                failures.push((
                    order,
                    MaterialiseFailure {
                        disc: bin.index(),
                        source: file.path.clone(),
                        destination: disc_dir.clone(),
                        reason: "path has no file name".to_string(),
                    },
                ));
                continue;
            };

            let entry = StagedEntry {
                disc: bin.index(),
                order,
                source: file.path.clone(),
                destination: disc_dir.join(name),
            };

            if let Some(e) = &dir_error {
                failures.push((order, entry.fail(format!("cannot create disc directory: {}", e))));
            } else if !claimed.insert(name.to_os_string()) {
                failures.push((
                    order,
                    entry.fail("another file on this disc has the same name"),
                ));
            } else {
                entries.push(entry);
            }
        }
    }

    Ok((entries, failures))
}

/// Removes a previous entry at `dest`. Directories are never removed.
fn clear_destination(dest: &Path) -> io::Result<()> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination exists and is a directory",
        )),
        Ok(_) => fs::remove_file(dest),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn make_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dest)
}

#[cfg(windows)]
fn make_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dest)
}

/// Copies contents and permissions, then carries over access and
/// modification times where the platform reports them.
fn copy_with_metadata(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest)?;

    let meta = fs::metadata(src)?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Err(e) = File::options()
        .write(true)
        .open(dest)
        .and_then(|f| f.set_times(times))
    {
        debug!(path = %dest.display(), error = %e, "could not preserve timestamps");
    }
    Ok(())
}

/// Creates one staged entry, replacing whatever was at the destination.
pub fn place_entry(strategy: LinkStrategy, src: &Path, dest: &Path) -> io::Result<()> {
    clear_destination(dest)?;
    match strategy {
        LinkStrategy::Symlink => {
            // relative sources would dangle from inside disc_NNN
            let target = std::path::absolute(src).unwrap_or_else(|_| src.to_path_buf());
            make_symlink(&target, dest)
        }
        LinkStrategy::Hardlink => fs::hard_link(src, dest),
        LinkStrategy::Copy => copy_with_metadata(src, dest),
    }
}

fn finish(
    target: &Path,
    strategy: LinkStrategy,
    placed: usize,
    mut failures: Vec<(usize, MaterialiseFailure)>,
) -> MaterialiseReport {
    failures.sort_by_key(|(order, _)| *order);
    let failures: Vec<_> = failures.into_iter().map(|(_, f)| f).collect();
    for failure in &failures {
        debug!(disc = failure.disc, "{}", failure);
    }
    if !failures.is_empty() {
        warn!(failed = failures.len(), placed, "staging finished with failures");
    }

    MaterialiseReport {
        target: target.to_path_buf(),
        strategy,
        placed,
        failures,
    }
}

/// Materialises the plan under `target`, one file at a time.
///
/// # Errors
///
/// Fails only when the staging root itself cannot be created. Every other
/// problem is recorded in [`MaterialiseReport::failures`].
pub fn materialise<F>(
    result: &PackingResult,
    target: &Path,
    strategy: LinkStrategy,
    progress_callback: F,
) -> Result<MaterialiseReport, MaterialiseError>
where
    F: Fn(&Path),
{
    let (entries, mut failures) = prepare_layout(result, target)?;
    let mut placed = 0;

    for entry in entries {
        progress_callback(&entry.source);
        match place_entry(strategy, &entry.source, &entry.destination) {
            Ok(()) => placed += 1,
            Err(e) => failures.push((entry.order, entry.fail(e.to_string()))),
        }
    }

    Ok(finish(target, strategy, placed, failures))
}

/// Materialises the plan with up to `max_concurrent` entries in flight.
///
/// Every destination is unique (disc directory plus base name), so entries
/// can be created in any order. The resulting tree and failure list are the
/// same as with [`materialise`].
pub async fn materialise_concurrent<F, Fut>(
    result: &PackingResult,
    target: &Path,
    strategy: LinkStrategy,
    max_concurrent: usize,
    progress_callback: F,
) -> Result<MaterialiseReport, MaterialiseError>
where
    F: Fn(String) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let (entries, mut failures) = prepare_layout(result, target)?;

    let outcomes = stream::iter(entries)
        .map(|entry| {
            let progress = progress_callback(entry.source.display().to_string());
            async move {
                progress.await;
                let outcome = task::spawn_blocking({
                    let entry = entry.clone();
                    move || place_entry(strategy, &entry.source, &entry.destination)
                })
                .await;
                (entry, outcome)
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut placed = 0;
    for (entry, outcome) in outcomes {
        match outcome? {
            Ok(()) => placed += 1,
            Err(e) => failures.push((entry.order, entry.fail(e.to_string()))),
        }
    }

    Ok(finish(target, strategy, placed, failures))
}
