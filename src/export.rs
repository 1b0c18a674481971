//! Manifest export.
//!
//! A packing plan can be written as a JSON manifest (every disc with its files,
//! plus the skipped files) or as a CSV table with one row per packed file.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ExportError;
use crate::packer::{Bin, FileRecord, PackingResult};

/// Column names of the tabular export.
pub const CSV_HEADER: [&str; 3] = ["disc_index", "file_path", "size_bytes"];

/// A file as it appears in the JSON manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: String,
    pub size: u64,
}

impl From<&FileRecord> for ManifestFile {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.to_string_lossy().into_owned(),
            size: record.size,
        }
    }
}

/// One disc in the JSON manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestBin {
    pub index: usize,
    pub capacity_bytes: u64,
    pub reserve_bytes: u64,
    pub effective_capacity_bytes: u64,
    pub used_bytes: u64,
    /// Fraction of the effective capacity in use, 0.0 to 1.0
    pub utilisation: f64,
    pub files: Vec<ManifestFile>,
}

impl From<&Bin> for ManifestBin {
    fn from(bin: &Bin) -> Self {
        Self {
            index: bin.index(),
            capacity_bytes: bin.capacity(),
            reserve_bytes: bin.reserve_bytes(),
            effective_capacity_bytes: bin.effective_capacity(),
            used_bytes: bin.used(),
            utilisation: bin.utilisation(),
            files: bin.files().iter().map(ManifestFile::from).collect(),
        }
    }
}

/// The JSON manifest: `{ "bins": [...], "skipped": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub bins: Vec<ManifestBin>,
    pub skipped: Vec<ManifestFile>,
}

impl From<&PackingResult> for Manifest {
    fn from(result: &PackingResult) -> Self {
        Self {
            bins: result.bins.iter().map(ManifestBin::from).collect(),
            skipped: result.skipped.iter().map(ManifestFile::from).collect(),
        }
    }
}

/// Serialises the plan as pretty-printed JSON.
pub fn to_json_string(result: &PackingResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&Manifest::from(result))?)
}

/// Writes the JSON manifest to `path`, replacing any existing file.
pub fn write_json(result: &PackingResult, path: &Path) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &Manifest::from(result))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes one CSV row per packed file, disc by disc in packing order.
///
/// The header is always written, even for an empty plan. Skipped files are
/// not part of this form.
pub fn write_csv_to<W: Write>(result: &PackingResult, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for bin in &result.bins {
        for file in bin.files() {
            csv.write_record([
                bin.index().to_string(),
                file.path.to_string_lossy().into_owned(),
                file.size.to_string(),
            ])?;
        }
    }

    csv.flush()?;
    Ok(())
}

/// Writes the CSV table to `path`, replacing any existing file.
pub fn write_csv(result: &PackingResult, path: &Path) -> Result<(), ExportError> {
    write_csv_to(result, BufWriter::new(File::create(path)?))
}
