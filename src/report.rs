//! Plain-text rendering of a packing plan.
//!
//! Everything here returns a `String`; the caller decides where it goes.

use std::fmt::Write;

use crate::capacity::{CapacityConfig, MEDIA_PROFILES, UNIT_FACTORS};
use crate::packer::{FileRecord, PackingResult};

/// Formats a byte count with binary units and two decimals.
///
/// Values below 1024 are shown as whole bytes.
///
/// # Examples
///
/// ```
/// use discpack::report::human_bytes;
///
/// assert_eq!(human_bytes(512), "512 B");
/// assert_eq!(human_bytes(1024), "1.00 KiB");
/// assert_eq!(human_bytes(4_700_372_992), "4.38 GiB");
/// ```
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    for unit in UNITS {
        size /= 1024.0;
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
    }
    format!("{:.2} PiB", size / 1024.0)
}

fn file_line(out: &mut String, file: &FileRecord) {
    let _ = writeln!(
        out,
        "  - {} ({})",
        file.path.display(),
        human_bytes(file.size)
    );
}

/// Renders the full plan: capacity, counts, one block per disc, then skipped files.
pub fn render_report(result: &PackingResult, config: &CapacityConfig) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Media capacity: {} (reserve {})",
        human_bytes(config.capacity),
        human_bytes(config.reserve_bytes)
    );
    if config.per_file_overhead > 0 {
        let _ = writeln!(
            out,
            "Per-file overhead: {} bytes",
            config.per_file_overhead
        );
    }
    let _ = writeln!(
        out,
        "Files considered: {} | Packed: {} | Skipped: {}",
        result.considered_count(),
        result.packed_count(),
        result.skipped.len()
    );
    let _ = writeln!(out, "Discs required: {}", result.bins.len());
    out.push('\n');

    for bin in &result.bins {
        let _ = writeln!(
            out,
            "Disc {:03}: used {} / {} ({:.1}% utilised)",
            bin.index(),
            human_bytes(bin.used()),
            human_bytes(bin.effective_capacity()),
            bin.utilisation() * 100.0
        );
        for file in bin.files() {
            file_line(&mut out, file);
        }
        out.push('\n');
    }

    if !result.skipped.is_empty() {
        out.push_str("Skipped files (too large for one disc):\n");
        for file in &result.skipped {
            file_line(&mut out, file);
        }
        out.push('\n');
    }

    out
}

/// Lists the media profiles and capacity units.
pub fn render_profiles() -> String {
    let mut out = String::from("MEDIA PROFILES\n");
    for (name, bytes) in MEDIA_PROFILES {
        let _ = writeln!(out, "  {:<8} {:>16} bytes  ({})", name, bytes, human_bytes(*bytes));
    }
    out.push_str("\nUNITS\n");
    for (unit, factor) in UNIT_FACTORS {
        let _ = writeln!(out, "  {:<8} {:>16} bytes", unit, factor);
    }
    out
}
