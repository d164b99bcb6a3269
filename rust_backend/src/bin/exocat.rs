//! `exocat`: build ExoCat tables from HST Phase II proposals.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use exocat_apt::config::ExocatConfig;
use exocat_apt::core::domain::ProposalId;
use exocat_apt::fetch::{LocalSource, ProposalSource, StsciSource};
use exocat_apt::preprocessing::pipeline::{ExocatPipeline, PipelineConfig};
use exocat_apt::services::batch::{BatchReport, BatchRunner};
use exocat_apt::services::run_log::{FileRunLog, RunLog};

#[derive(Debug, Parser)]
#[command(
    name = "exocat",
    version,
    about = "Reconcile HST APT proposals into ExoCat tables"
)]
struct Args {
    /// TOML configuration file. Defaults to exocat.toml if one is found.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proposal to process. May be repeated; skips MAST discovery.
    #[arg(short, long = "proposal")]
    proposals: Vec<String>,

    /// Read `<id>.apt` and `<id>_visit_status.xml` from this directory
    /// instead of downloading them.
    #[arg(long)]
    local_dir: Option<PathBuf>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        _ => builder.filter_level(log::LevelFilter::Trace),
    };
    builder.try_init()
}

fn load_config(args: &Args) -> Result<ExocatConfig> {
    let mut config = match &args.config {
        Some(path) => ExocatConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ExocatConfig::from_default_location().unwrap_or_else(|e| {
            info!("{}, using defaults", e);
            ExocatConfig::default()
        }),
    };

    if !args.proposals.is_empty() {
        config.discovery.proposals = args.proposals.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.table_dir = dir.clone();
    }
    if let Some(dir) = &args.log_dir {
        config.output.log_dir = dir.clone();
    }
    Ok(config)
}

async fn run_batch<S: ProposalSource>(
    source: S,
    config: &ExocatConfig,
    log: &mut dyn RunLog,
) -> Result<BatchReport> {
    let pipeline = ExocatPipeline::with_config(PipelineConfig {
        filter: config.spectral_filter(),
        screen: config.exoplanet_screen(),
        validate: config.reconcile.validate,
    });
    let runner = BatchRunner::new(source, pipeline, &config.output.table_dir)
        .with_visit_status(config.source.visit_status);

    let fixed: Vec<ProposalId> = config.discovery.fixed_proposals();
    let report = if fixed.is_empty() {
        runner.run_discovered(log).await?
    } else {
        runner.run(fixed, log).await
    };
    if report.run_log_failures > 0 {
        warn!("{} run log writes failed", report.run_log_failures);
    }
    Ok(report)
}

async fn run(args: &Args, config: &ExocatConfig, log: &mut dyn RunLog) -> Result<BatchReport> {
    match &args.local_dir {
        Some(dir) => {
            let source = LocalSource::from_dir(dir)?;
            info!(
                "Using {} local proposals from {}",
                source.len(),
                dir.display()
            );
            run_batch(source, config, log).await
        }
        None => {
            let source = StsciSource::new(config.source.clone(), config.discovery.clone())?;
            run_batch(source, config, log).await
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbosity).context("Failed to initialise logging")?;

    let config = load_config(&args)?;
    let started = Local::now().naive_local();
    let mut run_log =
        FileRunLog::open(&config.output.log_dir, &started).context("Failed to open run log")?;
    info!("Run log: {}", run_log.path().display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let report = runtime.block_on(run(&args, &config, &mut run_log));
    run_log.close()?;

    let report = report?;
    for entry in &report.proposals {
        println!("{:>8}  {}", entry.proposal.as_str(), entry.outcome);
    }
    println!("{}", report.summary());
    Ok(())
}
