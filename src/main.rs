// src/main.rs
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use discpack::cli::{Args, Commands};
use discpack::config::Config;
use discpack::plan::{PlanOutcome, handle_plan};
use discpack::report::render_profiles;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("discpack={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(args.verbose);

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match args.command {
        Commands::Plan(plan) => match handle_plan(&plan, &config).await? {
            PlanOutcome::NothingToPack => return Ok(ExitCode::from(2)),
            PlanOutcome::Packed { .. } => {}
        },
        Commands::Profiles => {
            print!("{}", render_profiles());
        }
    }

    Ok(ExitCode::SUCCESS)
}
