//! The `plan` command.
//!
//! One run resolves every setting first, so configuration errors surface
//! before anything is scanned or written. It then scans, packs, prints the
//! report, writes the requested exports, optionally stages the discs, and
//! finally lists everything that could not be processed.

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use std::fs;
use std::path::{Path, PathBuf};

use crate::capacity::{CapacityConfig, CapacitySource};
use crate::cli::PlanArgs;
use crate::config::{Config, MediaConfig};
use crate::error::ConfigError;
use crate::export::{write_csv, write_json};
use crate::log::{RunSummary, write_plan_log, write_stage_log};
use crate::materialise::{LinkStrategy, MaterialiseReport, materialise, materialise_concurrent};
use crate::packer::{PackingResult, first_fit_decreasing};
use crate::report::{human_bytes, render_report};
use crate::scanner::{ScanOptions, scan_directory};
use crate::tui::{UI, safe_truncate_path};

/// How a plan run ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The scan found no files, nothing was written
    NothingToPack,
    /// A plan was produced; `warnings` counts scan and staging failures
    Packed { discs: usize, warnings: usize },
}

/// Fully validated settings for one run.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub root: PathBuf,
    pub capacity: CapacityConfig,
    pub scan: ScanOptions,
    pub link_type: LinkStrategy,
    pub jobs: usize,
    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub materialise: Option<PathBuf>,
    pub write_log: bool,
}

/// Picks the capacity source: CLI profile, CLI capacity, config profile,
/// config capacity, then the built-in default.
pub fn capacity_source(args: &PlanArgs, media: &MediaConfig) -> CapacitySource {
    let unit = args.unit.clone().unwrap_or_else(|| media.unit.clone());

    if let Some(profile) = &args.profile {
        CapacitySource::Profile(profile.clone())
    } else if let Some(value) = args.capacity {
        CapacitySource::Explicit { value, unit }
    } else if let Some(profile) = &media.profile {
        CapacitySource::Profile(profile.clone())
    } else if let Some(value) = media.capacity {
        CapacitySource::Explicit { value, unit }
    } else {
        CapacitySource::Default
    }
}

impl PlanSettings {
    /// Merges command-line flags over the configuration file and validates
    /// the result.
    pub fn resolve(args: &PlanArgs, config: &Config) -> Result<Self, ConfigError> {
        let media = &config.media;
        let capacity = CapacityConfig::resolve(
            &capacity_source(args, media),
            args.reserve.unwrap_or(media.reserve_percent),
            args.per_file_overhead.unwrap_or(media.per_file_overhead),
        )?;

        let include_ext = if args.include_ext.is_empty() {
            &config.scan.include_extensions
        } else {
            &args.include_ext
        };
        let exclude = if args.exclude.is_empty() {
            &config.scan.exclude_patterns
        } else {
            &args.exclude
        };
        let scan = ScanOptions::new(
            include_ext,
            exclude,
            args.follow_symlinks_override()
                .unwrap_or(config.scan.follow_symlinks),
            args.hidden_override().unwrap_or(config.scan.ignore_hidden),
        )?;

        let link_type = match &args.link_type {
            Some(name) => name.parse()?,
            None => config.stage.link_type,
        };

        let jobs = args
            .jobs
            .map(usize::from)
            .unwrap_or(config.stage.max_concurrent_links)
            .max(1);

        Ok(Self {
            root: args.root.clone(),
            capacity,
            scan,
            link_type,
            jobs,
            export_json: args.export_json.clone(),
            export_csv: args.export_csv.clone(),
            report_path: args.report.clone(),
            materialise: args.materialise.clone(),
            write_log: args.log,
        })
    }
}

/// Handles the plan command.
///
/// # Returns
///
/// [`PlanOutcome::NothingToPack`] when the scan found no files, otherwise the
/// number of discs and warnings.
///
/// # Errors
///
/// Returns an error for invalid settings (before any side effect), a missing
/// root folder, or an export, report or log file that cannot be written.
pub async fn handle_plan(args: &PlanArgs, config: &Config) -> Result<PlanOutcome> {
    let settings = PlanSettings::resolve(args, config)?;
    run_plan(&settings, config).await
}

/// Runs a plan with already validated settings.
pub async fn run_plan(settings: &PlanSettings, config: &Config) -> Result<PlanOutcome> {
    if !settings.root.is_dir() {
        return Err(eyre!("Root folder not found: {}", settings.root.display()));
    }

    let ui = UI::new()
        .with_color_theme(config.ui.color.theme.clone())
        .with_progress(config.ui.progress);
    if ui.show_progress && ui.term.is_term() {
        ui.print_header(&settings.root.display().to_string())?;
    }

    let spinner = ui.create_spinner("Scanning files...");
    let pb = spinner.clone();
    let scan = scan_directory(&settings.root, &settings.scan, move |path| {
        pb.set_message(format!("Scanning: {}", safe_truncate_path(&path, 62)));
    })
    .await?;
    spinner.finish_and_clear();

    ui.print_info(&format!(
        "Found {} files ({})",
        scan.total_files(),
        human_bytes(scan.total_size)
    ))?;

    if scan.is_empty() {
        for error in &scan.errors {
            ui.print_warning(error)?;
        }
        ui.print_warning("No files found to pack.")?;
        return Ok(PlanOutcome::NothingToPack);
    }

    let result = first_fit_decreasing(scan.files.clone(), &settings.capacity);
    let report = render_report(&result, &settings.capacity);
    print!("{}", report);

    if let Some(path) = &settings.report_path {
        fs::write(path, &report)
            .wrap_err_with(|| format!("Failed to write report to {}", path.display()))?;
        ui.print_success(&format!("Report written to {}", path.display()))?;
    }
    if let Some(path) = &settings.export_json {
        write_json(&result, path)
            .wrap_err_with(|| format!("Failed to write JSON to {}", path.display()))?;
        ui.print_success(&format!("JSON written to {}", path.display()))?;
    }
    if let Some(path) = &settings.export_csv {
        write_csv(&result, path)
            .wrap_err_with(|| format!("Failed to write CSV to {}", path.display()))?;
        ui.print_success(&format!("CSV written to {}", path.display()))?;
    }

    let staging = match &settings.materialise {
        Some(target) => Some(stage(&result, target, settings, &ui).await?),
        None => None,
    };

    let summary = RunSummary {
        root: &settings.root,
        capacity: &settings.capacity,
        scan: &scan,
        result: &result,
        staging: staging.as_ref(),
    };
    if let Some(staged) = &staging {
        write_stage_log(&staged.target, &summary).await?;
    }
    if settings.write_log {
        let log_path = write_plan_log(Path::new("."), &summary).await?;
        ui.print_success(&format!("Log written to {}", log_path.display()))?;
    }

    let failures = staging.as_ref().map(|s| s.failures.as_slice()).unwrap_or_default();
    for error in &scan.errors {
        ui.print_warning(error)?;
    }
    for failure in failures {
        ui.print_warning(&failure.to_string())?;
    }

    let warnings = scan.errors.len() + failures.len();
    if warnings > 0 {
        ui.print_warning(&format!("{} entries could not be processed", warnings))?;
    }

    Ok(PlanOutcome::Packed {
        discs: result.bins.len(),
        warnings,
    })
}

async fn stage(
    result: &PackingResult,
    target: &Path,
    settings: &PlanSettings,
    ui: &UI,
) -> Result<MaterialiseReport> {
    let pb = ui.create_progress_bar(result.packed_count() as u64, "Staging files...");

    let report = if settings.jobs > 1 {
        let bar = pb.clone();
        materialise_concurrent(result, target, settings.link_type, settings.jobs, move |path| {
            let bar = bar.clone();
            async move {
                bar.set_message(safe_truncate_path(&path, 62));
                bar.inc(1);
            }
        })
        .await?
    } else {
        materialise(result, target, settings.link_type, |path| {
            pb.set_message(safe_truncate_path(&path.display().to_string(), 62));
            pb.inc(1);
        })?
    };
    pb.finish_and_clear();

    if report.is_clean() {
        ui.print_success(&format!(
            "Staged {} files under {} ({})",
            report.placed,
            target.display(),
            report.strategy
        ))?;
    } else {
        ui.print_warning(&format!(
            "Staged {} files under {}, {} failed",
            report.placed,
            target.display(),
            report.failures.len()
        ))?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::profile_capacity;
    use crate::export::Manifest;
    use tempfile::TempDir;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.ui.progress = false;
        config
    }

    fn args(root: &Path) -> PlanArgs {
        PlanArgs {
            root: root.to_path_buf(),
            ..PlanArgs::default()
        }
    }

    #[test]
    fn test_capacity_precedence() {
        let mut media = MediaConfig::default();
        let mut cli = PlanArgs::default();
        assert_eq!(capacity_source(&cli, &media), CapacitySource::Default);

        media.capacity = Some(700.0);
        media.unit = "MB".to_string();
        assert_eq!(
            capacity_source(&cli, &media),
            CapacitySource::Explicit {
                value: 700.0,
                unit: "MB".to_string()
            }
        );

        media.profile = Some("bdr25".to_string());
        assert_eq!(
            capacity_source(&cli, &media),
            CapacitySource::Profile("bdr25".to_string())
        );

        cli.capacity = Some(1.0);
        cli.unit = Some("TB".to_string());
        assert_eq!(
            capacity_source(&cli, &media),
            CapacitySource::Explicit {
                value: 1.0,
                unit: "TB".to_string()
            }
        );

        cli.profile = Some("cd700".to_string());
        assert_eq!(
            capacity_source(&cli, &media),
            CapacitySource::Profile("cd700".to_string())
        );
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = PlanSettings::resolve(&PlanArgs::default(), &Config::default()).unwrap();

        assert_eq!(settings.capacity.capacity, profile_capacity("dvd5").unwrap());
        assert_eq!(settings.capacity.reserve_bytes, 94_007_459);
        assert_eq!(settings.capacity.effective_capacity(), 4_606_365_533);
        assert_eq!(settings.link_type, LinkStrategy::Symlink);
        assert_eq!(settings.jobs, 1);
        assert!(settings.scan.ignore_hidden);
    }

    #[test]
    fn test_resolve_cli_overrides_config() {
        let mut config = Config::default();
        config.stage.link_type = LinkStrategy::Copy;
        config.stage.max_concurrent_links = 8;
        config.scan.ignore_hidden = true;

        let cli = PlanArgs {
            link_type: Some("hardlink".to_string()),
            jobs: Some(2),
            include_hidden: true,
            reserve: Some(0.0),
            ..PlanArgs::default()
        };
        let settings = PlanSettings::resolve(&cli, &config).unwrap();

        assert_eq!(settings.link_type, LinkStrategy::Hardlink);
        assert_eq!(settings.jobs, 2);
        assert!(!settings.scan.ignore_hidden);
        assert_eq!(settings.capacity.reserve_bytes, 0);

        let from_config = PlanSettings::resolve(&PlanArgs::default(), &config).unwrap();
        assert_eq!(from_config.link_type, LinkStrategy::Copy);
        assert_eq!(from_config.jobs, 8);
    }

    #[test]
    fn test_resolve_follow_symlinks_override() {
        let mut config = Config::default();
        config.scan.follow_symlinks = true;

        let inherited = PlanSettings::resolve(&PlanArgs::default(), &config).unwrap();
        assert!(inherited.scan.follow_symlinks);

        let cli = PlanArgs {
            no_follow_symlinks: true,
            ..PlanArgs::default()
        };
        let settings = PlanSettings::resolve(&cli, &config).unwrap();
        assert!(!settings.scan.follow_symlinks);

        let cli = PlanArgs {
            follow_symlinks: true,
            ..PlanArgs::default()
        };
        let settings = PlanSettings::resolve(&cli, &Config::default()).unwrap();
        assert!(settings.scan.follow_symlinks);
    }

    #[test]
    fn test_resolve_rejects_bad_settings() {
        let config = Config::default();

        let bad_profile = PlanArgs {
            profile: Some("floppy".to_string()),
            ..PlanArgs::default()
        };
        assert!(matches!(
            PlanSettings::resolve(&bad_profile, &config),
            Err(ConfigError::UnknownProfile { .. })
        ));

        let bad_unit = PlanArgs {
            capacity: Some(4.0),
            unit: Some("gib".to_string()),
            ..PlanArgs::default()
        };
        assert!(matches!(
            PlanSettings::resolve(&bad_unit, &config),
            Err(ConfigError::UnknownUnit { .. })
        ));

        let bad_link = PlanArgs {
            link_type: Some("reflink".to_string()),
            ..PlanArgs::default()
        };
        assert_eq!(
            PlanSettings::resolve(&bad_link, &config).unwrap_err(),
            ConfigError::UnknownLinkStrategy("reflink".to_string())
        );

        let bad_glob = PlanArgs {
            exclude: vec!["[".to_string()],
            ..PlanArgs::default()
        };
        assert!(matches!(
            PlanSettings::resolve(&bad_glob, &config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[tokio::test]
    async fn test_bad_link_type_touches_nothing() {
        let src = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.bin"), b"data").unwrap();
        let out = TempDir::new().unwrap();
        let json = out.path().join("plan.json");
        let target = out.path().join("stage");

        let cli = PlanArgs {
            export_json: Some(json.clone()),
            materialise: Some(target.clone()),
            link_type: Some("teleport".to_string()),
            ..args(src.path())
        };

        assert!(handle_plan(&cli, &quiet_config()).await.is_err());
        assert!(!json.exists());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cli = args(&dir.path().join("absent"));

        assert!(handle_plan(&cli, &quiet_config()).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_root_is_nothing_to_pack() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let json = out.path().join("plan.json");
        let cli = PlanArgs {
            export_json: Some(json.clone()),
            ..args(src.path())
        };

        let outcome = handle_plan(&cli, &quiet_config()).await.unwrap();

        assert_eq!(outcome, PlanOutcome::NothingToPack);
        assert!(!json.exists());
    }

    #[tokio::test]
    async fn test_full_run() {
        let src = TempDir::new().unwrap();
        for (name, len) in [("big.bin", 3000), ("a.bin", 1000), ("b.bin", 1000), ("c.bin", 1000)] {
            std::fs::write(src.path().join(name), vec![0u8; len]).unwrap();
        }
        let out = TempDir::new().unwrap();
        let target = out.path().join("stage");

        let cli = PlanArgs {
            capacity: Some(4000.0),
            unit: Some("B".to_string()),
            reserve: Some(0.0),
            export_json: Some(out.path().join("plan.json")),
            export_csv: Some(out.path().join("plan.csv")),
            report: Some(out.path().join("plan.txt")),
            materialise: Some(target.clone()),
            link_type: Some("copy".to_string()),
            jobs: Some(3),
            ..args(src.path())
        };

        let outcome = handle_plan(&cli, &quiet_config()).await.unwrap();

        assert_eq!(outcome, PlanOutcome::Packed { discs: 2, warnings: 0 });

        let manifest: Manifest =
            serde_json::from_str(&std::fs::read_to_string(out.path().join("plan.json")).unwrap())
                .unwrap();
        assert_eq!(manifest.bins.len(), 2);
        assert_eq!(manifest.bins[0].used_bytes, 4000);

        let csv = std::fs::read_to_string(out.path().join("plan.csv")).unwrap();
        assert_eq!(csv.lines().count(), 5);

        let report = std::fs::read_to_string(out.path().join("plan.txt")).unwrap();
        assert!(report.contains("Discs required: 2"));

        assert!(target.join("disc_001/big.bin").is_file());
        assert!(target.join("disc_002").is_dir());
        assert!(target.join("discpack.log").is_file());
    }
}
