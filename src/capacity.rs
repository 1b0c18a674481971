//! Disc capacity resolution.
//!
//! Turns a media profile name or an explicit `(value, unit)` pair into a byte
//! capacity, and converts the reserve percentage into bytes. The profile and
//! unit tables are constant data.

use crate::error::ConfigError;

/// Nominal media capacities in bytes.
pub const MEDIA_PROFILES: &[(&str, u64)] = &[
    ("cd700", 700 * 1_000_000),
    ("dvd5", 4_700_372_992),
    ("dvd9", 8_540_000_000),
    ("bdr25", 25 * 1_000_000_000),
    ("bdr50", 50 * 1_000_000_000),
];

/// Byte multipliers for explicit capacities, decimal and binary prefixes.
pub const UNIT_FACTORS: &[(&str, u64)] = &[
    ("B", 1),
    ("KB", 1_000),
    ("KiB", 1024),
    ("MB", 1_000_000),
    ("MiB", 1024 * 1024),
    ("GB", 1_000_000_000),
    ("GiB", 1024 * 1024 * 1024),
    ("TB", 1_000_000_000_000),
    ("TiB", 1024 * 1024 * 1024 * 1024),
];

/// Profile used when no capacity is configured (single-layer DVD).
pub const DEFAULT_PROFILE: &str = "dvd5";

/// Unit applied to an explicit capacity when none is given.
pub const DEFAULT_UNIT: &str = "GiB";

pub const DEFAULT_RESERVE_PERCENT: f64 = 2.0;

/// Where the disc capacity comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CapacitySource {
    Profile(String),
    Explicit { value: f64, unit: String },
    Default,
}

impl CapacitySource {
    /// Resolves the source to an absolute byte capacity.
    pub fn resolve(&self) -> Result<u64, ConfigError> {
        match self {
            CapacitySource::Profile(name) => profile_capacity(name),
            CapacitySource::Explicit { value, unit } => explicit_capacity(*value, unit),
            CapacitySource::Default => profile_capacity(DEFAULT_PROFILE),
        }
    }
}

/// Looks up a media profile.
///
/// # Examples
///
/// ```
/// use discpack::capacity::profile_capacity;
///
/// assert_eq!(profile_capacity("dvd5").unwrap(), 4_700_372_992);
/// assert!(profile_capacity("floppy").is_err());
/// ```
pub fn profile_capacity(name: &str) -> Result<u64, ConfigError> {
    MEDIA_PROFILES
        .iter()
        .find(|(profile, _)| *profile == name)
        .map(|(_, bytes)| *bytes)
        .ok_or_else(|| ConfigError::UnknownProfile {
            name: name.to_string(),
            known: profile_names().join(", "),
        })
}

/// Returns the byte multiplier for a unit. Unit names are case-sensitive
/// so that `KB` and `KiB` can never be confused.
pub fn unit_factor(unit: &str) -> Result<u64, ConfigError> {
    UNIT_FACTORS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, factor)| *factor)
        .ok_or_else(|| ConfigError::UnknownUnit {
            unit: unit.to_string(),
            known: UNIT_FACTORS
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Converts `value` in `unit` to bytes, truncating any fractional byte.
pub fn explicit_capacity(value: f64, unit: &str) -> Result<u64, ConfigError> {
    let factor = unit_factor(unit)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidCapacity(value));
    }
    Ok((value * factor as f64) as u64)
}

/// Converts a reserve percentage of `capacity` into whole bytes (truncated).
///
/// # Examples
///
/// ```
/// use discpack::capacity::reserve_bytes;
///
/// assert_eq!(reserve_bytes(4_700_372_992, 2.0).unwrap(), 94_007_459);
/// assert_eq!(reserve_bytes(4_700_372_992, 0.0).unwrap(), 0);
/// ```
pub fn reserve_bytes(capacity: u64, percent: f64) -> Result<u64, ConfigError> {
    if !percent.is_finite() || percent < 0.0 {
        return Err(ConfigError::InvalidReserve(percent));
    }
    if percent == 0.0 {
        return Ok(0);
    }
    Ok((capacity as f64 * (percent / 100.0)) as u64)
}

pub fn profile_names() -> Vec<&'static str> {
    MEDIA_PROFILES.iter().map(|(name, _)| *name).collect()
}

/// Resolved capacity settings for one run. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityConfig {
    /// Nominal disc capacity in bytes
    pub capacity: u64,
    /// Bytes held back from every disc
    pub reserve_bytes: u64,
    /// Bytes charged for every placed file on top of its size
    pub per_file_overhead: u64,
}

impl CapacityConfig {
    pub fn new(capacity: u64, reserve_bytes: u64, per_file_overhead: u64) -> Self {
        Self {
            capacity,
            reserve_bytes,
            per_file_overhead,
        }
    }

    /// Resolves `source`, then applies the reserve percentage.
    pub fn resolve(
        source: &CapacitySource,
        reserve_percent: f64,
        per_file_overhead: u64,
    ) -> Result<Self, ConfigError> {
        let capacity = source.resolve()?;
        let reserve = reserve_bytes(capacity, reserve_percent)?;
        Ok(Self::new(capacity, reserve, per_file_overhead))
    }

    /// `max(0, capacity - reserve)`
    pub fn effective_capacity(&self) -> u64 {
        self.capacity.saturating_sub(self.reserve_bytes)
    }

    /// Largest file size that still fits an empty disc once overhead is charged.
    pub fn single_bin_threshold(&self) -> u64 {
        self.effective_capacity()
            .saturating_sub(self.per_file_overhead)
    }
}
