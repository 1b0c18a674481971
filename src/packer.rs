//! First-Fit-Decreasing disc packing.
//!
//! Files are sorted largest first (stable, so equal sizes keep scan order) and
//! each one goes into the first disc with enough room. A new disc is opened
//! only when no existing disc accepts the file. Files that cannot fit even an
//! empty disc are skipped.

use std::path::PathBuf;
use tracing::debug;

use crate::capacity::CapacityConfig;

/// A file discovered by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Size of the file in bytes
    pub size: u64,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// One disc of the plan.
///
/// Files are append-only and kept in packing order. `used` always equals the
/// sum of `size + per_file_overhead` over the files and never exceeds
/// [`Bin::effective_capacity`].
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    index: usize,
    capacity: u64,
    reserve_bytes: u64,
    used: u64,
    files: Vec<FileRecord>,
}

impl Bin {
    /// Creates an empty disc. `index` is 1-based.
    pub fn new(index: usize, capacity: u64, reserve_bytes: u64) -> Self {
        Self {
            index,
            capacity,
            reserve_bytes,
            used: 0,
            files: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn reserve_bytes(&self) -> u64 {
        self.reserve_bytes
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn effective_capacity(&self) -> u64 {
        self.capacity.saturating_sub(self.reserve_bytes)
    }

    pub fn remaining(&self) -> u64 {
        self.effective_capacity() - self.used
    }

    /// `used / effective_capacity`, or `0.0` for a zero-capacity disc.
    pub fn utilisation(&self) -> f64 {
        let effective = self.effective_capacity();
        if effective == 0 {
            return 0.0;
        }
        self.used as f64 / effective as f64
    }

    /// Places `record` if `size + per_file_overhead` fits the remaining space.
    /// On rejection the record is handed back unchanged.
    pub fn try_add(&mut self, record: FileRecord, per_file_overhead: u64) -> Result<(), FileRecord> {
        let needed = record.size.saturating_add(per_file_overhead);
        if needed > self.remaining() {
            return Err(record);
        }
        self.used += needed;
        self.files.push(record);
        Ok(())
    }
}

/// The outcome of a packing run.
///
/// Every input record ends up in exactly one disc or in `skipped`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackingResult {
    pub bins: Vec<Bin>,
    /// Files larger than a single empty disc, in sorted order
    pub skipped: Vec<FileRecord>,
}

impl PackingResult {
    pub fn packed_count(&self) -> usize {
        self.bins.iter().map(|b| b.files.len()).sum()
    }

    /// Number of records the packer was given.
    pub fn considered_count(&self) -> usize {
        self.packed_count() + self.skipped.len()
    }

    pub fn packed_bytes(&self) -> u64 {
        self.bins
            .iter()
            .flat_map(|b| b.files.iter())
            .map(|f| f.size)
            .sum()
    }

    pub fn skipped_bytes(&self) -> u64 {
        self.skipped.iter().map(|f| f.size).sum()
    }
}

/// Packs `files` into as few discs as First-Fit-Decreasing manages.
///
/// # Panics
///
/// Panics if a freshly opened disc rejects the file that caused it to be
/// opened. The threshold check makes that unreachable unless the capacity
/// arithmetic itself is broken.
///
/// # Examples
///
/// ```
/// use discpack::capacity::CapacityConfig;
/// use discpack::packer::{first_fit_decreasing, FileRecord};
///
/// let files = vec![
///     FileRecord::new("a", 3000),
///     FileRecord::new("b", 1000),
///     FileRecord::new("c", 1000),
///     FileRecord::new("d", 1000),
/// ];
/// let result = first_fit_decreasing(files, &CapacityConfig::new(4000, 0, 0));
///
/// assert_eq!(result.bins.len(), 2);
/// assert_eq!(result.bins[0].used(), 4000);
/// assert_eq!(result.bins[1].used(), 2000);
/// ```
pub fn first_fit_decreasing(mut files: Vec<FileRecord>, config: &CapacityConfig) -> PackingResult {
    // sort_by is stable: ties keep scan order
    files.sort_by(|a, b| b.size.cmp(&a.size));

    let threshold = config.single_bin_threshold();
    let overhead = config.per_file_overhead;
    let mut result = PackingResult::default();

    'records: for record in files {
        if record.size > threshold {
            debug!(
                path = %record.path.display(),
                size = record.size,
                threshold,
                "file larger than an empty disc, skipping"
            );
            result.skipped.push(record);
            continue;
        }

        let mut record = record;
        for bin in result.bins.iter_mut() {
            match bin.try_add(record, overhead) {
                Ok(()) => continue 'records,
                Err(rejected) => record = rejected,
            }
        }

        let mut bin = Bin::new(result.bins.len() + 1, config.capacity, config.reserve_bytes);
        if let Err(record) = bin.try_add(record, overhead) {
            panic!(
                "placement invariant violated: empty disc {} ({} bytes effective) rejected {} ({} bytes + {} overhead) below threshold {}",
                bin.index,
                bin.effective_capacity(),
                record.path.display(),
                record.size,
                overhead,
                threshold
            );
        }
        debug!(disc = bin.index, "opened disc");
        result.bins.push(bin);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn records(sizes: &[u64]) -> Vec<FileRecord> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, size)| FileRecord::new(format!("/data/file{i}"), *size))
            .collect()
    }

    fn sizes(bin: &Bin) -> Vec<u64> {
        bin.files().iter().map(|f| f.size).collect()
    }

    #[test]
    fn test_bin_try_add() {
        let mut bin = Bin::new(1, 100, 10);

        assert_eq!(bin.effective_capacity(), 90);
        assert!(bin.try_add(FileRecord::new("a", 50), 5).is_ok());
        assert_eq!(bin.used(), 55);
        assert_eq!(bin.remaining(), 35);

        let rejected = bin.try_add(FileRecord::new("b", 31), 5).unwrap_err();
        assert_eq!(rejected, FileRecord::new("b", 31));
        assert_eq!(bin.files().len(), 1);

        assert!(bin.try_add(FileRecord::new("c", 30), 5).is_ok());
        assert_eq!(bin.remaining(), 0);
    }

    #[test]
    fn test_bin_utilisation() {
        let mut bin = Bin::new(1, 200, 0);
        bin.try_add(FileRecord::new("a", 50), 0).unwrap();
        assert!((bin.utilisation() - 0.25).abs() < f64::EPSILON);

        let empty = Bin::new(1, 100, 100);
        assert_eq!(empty.utilisation(), 0.0);
    }

    #[test]
    fn test_classic_ffd_example() {
        let result = first_fit_decreasing(
            records(&[3000, 1000, 1000, 1000]),
            &CapacityConfig::new(4000, 0, 0),
        );

        assert_eq!(result.bins.len(), 2);
        assert_eq!(sizes(&result.bins[0]), vec![3000, 1000]);
        assert_eq!(result.bins[0].used(), 4000);
        assert_eq!(sizes(&result.bins[1]), vec![1000, 1000]);
        assert_eq!(result.bins[1].used(), 2000);
        assert!(result.skipped.is_empty());

        // ties keep input order
        assert_eq!(result.bins[0].files()[1].path, PathBuf::from("/data/file1"));
        assert_eq!(result.bins[1].files()[0].path, PathBuf::from("/data/file2"));
        assert_eq!(result.bins[1].files()[1].path, PathBuf::from("/data/file3"));
    }

    #[test]
    fn test_oversized_file_is_skipped() {
        let result = first_fit_decreasing(records(&[5000]), &CapacityConfig::new(4000, 0, 0));

        assert!(result.bins.is_empty());
        assert_eq!(result.skipped, records(&[5000]));
    }

    #[test]
    fn test_per_file_overhead() {
        let result = first_fit_decreasing(records(&[100; 10]), &CapacityConfig::new(250, 0, 10));

        assert_eq!(result.bins.len(), 5);
        for bin in &result.bins {
            assert_eq!(bin.files().len(), 2);
            assert_eq!(bin.used(), 220);
        }
    }

    #[test]
    fn test_indices_are_sequential() {
        let result = first_fit_decreasing(records(&[60, 60, 60]), &CapacityConfig::new(100, 0, 0));

        let indices: Vec<_> = result.bins.iter().map(|b| b.index()).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_first_fit_not_best_fit() {
        // 50 goes into disc 1 (room 60) even though disc 2 (room 50) is a tighter fit
        let result =
            first_fit_decreasing(records(&[70, 60, 50, 40]), &CapacityConfig::new(110, 0, 0));

        assert_eq!(sizes(&result.bins[0]), vec![70, 40]);
        assert_eq!(sizes(&result.bins[1]), vec![60, 50]);
    }

    #[test]
    fn test_threshold_boundary() {
        let config = CapacityConfig::new(1000, 100, 50);
        let threshold = config.single_bin_threshold();
        assert_eq!(threshold, 850);

        let fits = first_fit_decreasing(records(&[threshold]), &config);
        assert_eq!(fits.bins.len(), 1);
        assert_eq!(fits.bins[0].used(), 900);

        let too_big = first_fit_decreasing(records(&[threshold + 1]), &config);
        assert!(too_big.bins.is_empty());
        assert_eq!(too_big.skipped.len(), 1);
    }

    #[test]
    fn test_zero_effective_capacity() {
        let result = first_fit_decreasing(records(&[0, 1, 2]), &CapacityConfig::new(100, 100, 0));

        // a zero-byte file still fits a zero-capacity disc
        assert_eq!(result.bins.len(), 1);
        assert_eq!(sizes(&result.bins[0]), vec![0]);
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.bins[0].utilisation(), 0.0);
    }

    #[test]
    fn test_empty_input() {
        let result = first_fit_decreasing(Vec::new(), &CapacityConfig::new(100, 0, 0));

        assert!(result.bins.is_empty());
        assert!(result.skipped.is_empty());
        assert_eq!(result.considered_count(), 0);
    }

    #[test]
    fn test_counts_and_bytes() {
        let result =
            first_fit_decreasing(records(&[500, 300, 200, 50]), &CapacityConfig::new(400, 0, 0));

        assert_eq!(result.considered_count(), 4);
        assert_eq!(result.packed_count(), 3);
        assert_eq!(result.packed_bytes(), 550);
        assert_eq!(result.skipped_bytes(), 500);
    }

    fn bin_count(sizes: &[u64], capacity: u64) -> usize {
        first_fit_decreasing(records(sizes), &CapacityConfig::new(capacity, 0, 0))
            .bins
            .len()
    }

    /// FFD is not monotone in capacity: a slightly larger disc lets the 283
    /// join the 733, which strands the small files and opens a fourth disc.
    #[test]
    fn test_more_capacity_can_need_more_discs() {
        let files: [u64; 10] = [733, 400, 400, 366, 350, 283, 133, 133, 100, 100];

        let small = first_fit_decreasing(records(&files), &CapacityConfig::new(1_000, 0, 0));
        let large = first_fit_decreasing(records(&files), &CapacityConfig::new(1_016, 0, 0));

        assert_eq!(small.bins.len(), 3);
        assert_eq!(sizes(&small.bins[0]), vec![733, 133, 133]);
        assert_eq!(large.bins.len(), 4);
        assert_eq!(sizes(&large.bins[0]), vec![733, 283]);
        assert_eq!(sizes(&large.bins[3]), vec![100]);
    }

    proptest! {
        #[test]
        fn prop_partition(
            sizes in prop::collection::vec(0u64..5_000, 0..60),
            capacity in 0u64..6_000,
            reserve in 0u64..500,
            overhead in 0u64..200,
        ) {
            let input = records(&sizes);
            let result = first_fit_decreasing(input.clone(), &CapacityConfig::new(capacity, reserve, overhead));

            let mut seen: Vec<PathBuf> = result
                .bins
                .iter()
                .flat_map(|b| b.files().iter())
                .chain(result.skipped.iter())
                .map(|f| f.path.clone())
                .collect();
            seen.sort();
            let mut expected: Vec<PathBuf> = input.iter().map(|f| f.path.clone()).collect();
            expected.sort();

            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn prop_capacity_invariant(
            sizes in prop::collection::vec(0u64..5_000, 0..60),
            capacity in 0u64..6_000,
            reserve in 0u64..500,
            overhead in 0u64..200,
        ) {
            let result = first_fit_decreasing(records(&sizes), &CapacityConfig::new(capacity, reserve, overhead));

            for bin in &result.bins {
                prop_assert!(bin.used() <= bin.effective_capacity());
                let expected: u64 = bin.files().iter().map(|f| f.size + overhead).sum();
                prop_assert_eq!(bin.used(), expected);
                prop_assert!(!bin.files().is_empty());
            }
        }

        #[test]
        fn prop_deterministic(
            sizes in prop::collection::vec(0u64..2_000, 0..60),
            capacity in 1u64..4_000,
        ) {
            let config = CapacityConfig::new(capacity, 0, 0);
            let first = first_fit_decreasing(records(&sizes), &config);
            let second = first_fit_decreasing(records(&sizes), &config);

            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_skipped_only_when_too_big(
            sizes in prop::collection::vec(0u64..5_000, 0..60),
            capacity in 0u64..6_000,
            overhead in 0u64..200,
        ) {
            let config = CapacityConfig::new(capacity, 0, overhead);
            let result = first_fit_decreasing(records(&sizes), &config);

            for file in &result.skipped {
                prop_assert!(file.size > config.single_bin_threshold());
            }
            for file in result.bins.iter().flat_map(|b| b.files()) {
                prop_assert!(file.size <= config.single_bin_threshold());
            }
        }

        #[test]
        fn prop_uniform_sizes_more_capacity_never_needs_more_discs(
            size in 1u64..1_000,
            count in 0usize..60,
            slack in 0u64..4_000,
            extra in 0u64..2_000,
        ) {
            let files = vec![size; count];
            let base = size + slack;
            let per_disc = (base / size) as usize;

            prop_assert_eq!(bin_count(&files, base), count.div_ceil(per_disc));
            prop_assert!(bin_count(&files, base + extra) <= bin_count(&files, base));
        }
    }
}
