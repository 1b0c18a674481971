//! File system scanning.
//!
//! This module walks a directory tree and collects a [`FileRecord`] for every
//! file that passes the configured filters. Entries whose metadata cannot be
//! read are dropped and noted in [`ScanStats::errors`]; they never fail the scan.

use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::ConfigError;
use crate::packer::FileRecord;

/// Filters applied while scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercased extensions without a leading dot; `None` accepts everything
    include_ext: Option<HashSet<String>>,
    exclude: Vec<Pattern>,
    pub follow_symlinks: bool,
    /// Prune dot-directories and skip dot-files
    pub ignore_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_ext: None,
            exclude: Vec::new(),
            follow_symlinks: false,
            ignore_hidden: true,
        }
    }
}

impl ScanOptions {
    /// Builds scan options, compiling the exclude globs.
    ///
    /// An empty `include_ext` accepts every extension. Extensions are compared
    /// case-insensitively with leading dots removed, so `.MKV` and `mkv` match
    /// the same files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if an exclude glob is malformed.
    pub fn new<S: AsRef<str>>(
        include_ext: &[S],
        exclude: &[S],
        follow_symlinks: bool,
        ignore_hidden: bool,
    ) -> Result<Self, ConfigError> {
        let include_ext = if include_ext.is_empty() {
            None
        } else {
            Some(
                include_ext
                    .iter()
                    .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                    .collect(),
            )
        };

        let exclude = exclude
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_ext,
            exclude,
            follow_symlinks,
            ignore_hidden,
        })
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(name))
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        match &self.include_ext {
            Some(allowed) => allowed.contains(&get_extension(path)),
            None => true,
        }
    }

    /// Whether a file with base name `name` at `path` passes every filter.
    pub fn accepts(&self, name: &str, path: &Path) -> bool {
        if self.ignore_hidden && is_hidden_name(name) {
            return false;
        }
        !self.is_excluded(name) && self.extension_allowed(path)
    }
}

/// Files found during a scan plus the entries that had to be dropped.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Accepted files in traversal order
    pub files: Vec<FileRecord>,
    pub total_size: u64,
    pub errors: Vec<String>,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, record: FileRecord) {
        self.total_size += record.size;
        self.files.push(record);
    }

    /// Records an entry that was dropped from the scan.
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Returns the lowercased extension without its dot, or an empty string.
///
/// ```
/// use std::path::Path;
/// use discpack::scanner::get_extension;
///
/// assert_eq!(get_extension(Path::new("/media/Film.MKV")), "mkv");
/// assert_eq!(get_extension(Path::new("archive.tar.gz")), "gz");
/// assert_eq!(get_extension(Path::new("README")), "");
/// ```
pub fn get_extension(path: &Path) -> String {
    path.extension()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

fn is_hidden_entry(entry: &DirEntry) -> bool {
    // never prune the root itself, even if it is a dot-directory
    entry.depth() > 0 && is_hidden_name(&entry.file_name().to_string_lossy())
}

/// Scans `root` synchronously.
///
/// Symlinks to files are recorded with the size of their target. Symlinks to
/// directories are descended only when `follow_symlinks` is set. Dangling
/// links and unreadable entries are dropped and noted in the returned errors.
/// The order of the returned files follows the filesystem and must not be
/// relied on.
pub fn scan_files<F>(root: &Path, options: &ScanOptions, progress_callback: F) -> ScanStats
where
    F: Fn(&Path),
{
    let mut stats = ScanStats::new();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .into_iter()
        .filter_entry(|e| !(options.ignore_hidden && is_hidden_entry(e)));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "dropping unreadable entry");
                stats.add_error(format!("Error walking directory: {}", e));
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if !options.accepts(&name, path) {
            continue;
        }

        // follows symlinks, so a link reports its target's size
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => {
                progress_callback(path);
                stats.add_file(FileRecord::new(path, metadata.len()));
            }
            Ok(_) => {
                // an unfollowed link to a directory or a special file
                debug!(path = %path.display(), "not a regular file, skipping");
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "dropping file with unreadable metadata");
                stats.add_error(format!("Error reading {}: {}", path.display(), e));
            }
        }
    }

    stats
}

/// Scans `root` on the blocking thread pool.
///
/// # Errors
///
/// Returns an error only if the blocking task panics or is cancelled.
/// Per-entry problems end up in [`ScanStats::errors`].
pub async fn scan_directory<F>(
    root: &Path,
    options: &ScanOptions,
    progress_callback: F,
) -> color_eyre::Result<ScanStats>
where
    F: Fn(String) + Send + Sync + 'static,
{
    let root: PathBuf = root.to_path_buf();
    let options = options.clone();

    let stats = task::spawn_blocking(move || {
        scan_files(&root, &options, |path| {
            progress_callback(path.display().to_string())
        })
    })
    .await?;

    Ok(stats)
}
