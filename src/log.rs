//! Log file generation.
//!
//! This module creates plain-text logs documenting a planning run: the media
//! in use, scan and packing counts, per-disc usage, skipped files and any
//! scan or staging failures.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::capacity::CapacityConfig;
use crate::materialise::{MaterialiseReport, disc_dir_name};
use crate::packer::PackingResult;
use crate::report::human_bytes;
use crate::scanner::ScanStats;

/// File name of the log written into the staging directory.
pub const STAGE_LOG_NAME: &str = "discpack.log";

/// Everything a run log reports on.
pub struct RunSummary<'a> {
    pub root: &'a Path,
    pub capacity: &'a CapacityConfig,
    pub scan: &'a ScanStats,
    pub result: &'a PackingResult,
    pub staging: Option<&'a MaterialiseReport>,
}

fn section(content: &mut String, title: &str) {
    content.push('\n');
    content.push_str(title);
    content.push('\n');
    content.push_str(&"─".repeat(70));
    content.push('\n');
}

/// Renders the log text for a run.
pub fn render_run_log(summary: &RunSummary<'_>) -> String {
    let mut content = String::new();
    content.push_str("DISCPACK PLAN LOG\n");
    content.push_str(&"═".repeat(70));
    content.push_str("\n\n");

    content.push_str(&format!("Source: {}\n", summary.root.display()));
    content.push_str(&format!(
        "Timestamp: {}\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    let capacity = summary.capacity;
    content.push_str(&format!(
        "Media capacity: {} bytes ({})\n",
        capacity.capacity,
        human_bytes(capacity.capacity)
    ));
    content.push_str(&format!("Reserve: {} bytes\n", capacity.reserve_bytes));
    content.push_str(&format!(
        "Effective capacity: {} bytes\n",
        capacity.effective_capacity()
    ));
    content.push_str(&format!(
        "Per-file overhead: {} bytes\n\n",
        capacity.per_file_overhead
    ));

    let result = summary.result;
    content.push_str(&format!(
        "Total files scanned: {}\n",
        summary.scan.total_files()
    ));
    content.push_str(&format!(
        "Total size: {}\n",
        human_bytes(summary.scan.total_size)
    ));
    content.push_str(&format!("Files packed: {}\n", result.packed_count()));
    content.push_str(&format!("Files skipped: {}\n", result.skipped.len()));
    content.push_str(&format!("Discs required: {}\n", result.bins.len()));

    if !result.bins.is_empty() {
        section(&mut content, "DISCS");
        for bin in &result.bins {
            content.push_str(&format!(
                "{}: {} files, {} / {} ({:.1}%)\n",
                disc_dir_name(bin.index()),
                bin.files().len(),
                human_bytes(bin.used()),
                human_bytes(bin.effective_capacity()),
                bin.utilisation() * 100.0
            ));
        }
    }

    if !result.skipped.is_empty() {
        section(&mut content, "SKIPPED FILES");
        for file in &result.skipped {
            content.push_str(&format!("{} ({} bytes)\n", file.path.display(), file.size));
        }
    }

    if !summary.scan.errors.is_empty() {
        section(&mut content, "SCAN ERRORS");
        for error in &summary.scan.errors {
            content.push_str(&format!("{}\n", error));
        }
    }

    if let Some(staging) = summary.staging {
        section(&mut content, "STAGING");
        content.push_str(&format!("Target: {}\n", staging.target.display()));
        content.push_str(&format!("Link type: {}\n", staging.strategy));
        content.push_str(&format!("Entries placed: {}\n", staging.placed));
        content.push_str(&format!("Entries failed: {}\n", staging.failures.len()));

        if !staging.failures.is_empty() {
            section(&mut content, "STAGING ERRORS");
            for failure in &staging.failures {
                content.push_str(&format!("{}\n", failure));
            }
        }
    }

    content.push('\n');
    content.push_str(&"═".repeat(70));
    content.push_str("\nEnd of log\n");
    content
}

async fn write_log(path: &Path, summary: &RunSummary<'_>) -> color_eyre::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(render_run_log(summary).as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Writes `discpack.log` into the staging directory.
pub async fn write_stage_log(
    target: &Path,
    summary: &RunSummary<'_>,
) -> color_eyre::Result<PathBuf> {
    let log_path = target.join(STAGE_LOG_NAME);
    write_log(&log_path, summary).await?;
    Ok(log_path)
}

/// Writes a timestamped plan log into `dir`.
///
/// # Returns
///
/// The path where the log file was written, named
/// `discpack_plan_<root name>_<timestamp>.txt`.
pub async fn write_plan_log(
    dir: &Path,
    summary: &RunSummary<'_>,
) -> color_eyre::Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let source_name = summary
        .root
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("root");
    let log_path = dir.join(format!("discpack_plan_{}_{}.txt", source_name, timestamp));

    write_log(&log_path, summary).await?;
    Ok(log_path)
}
