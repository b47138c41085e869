pub mod aggregate;
pub mod brief;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod heatmap;
pub mod hierarchy;
pub mod ingest;
pub mod models;
pub mod scoring;
pub mod snapshot;

use crate::config::{LoggingConfig, PipelineConfig};
use crate::errors::{AppError, AppResult};
use crate::heatmap::{build_heatmap, parse_heatmap_csv, render_heatmap_csv, render_heatmap_summary};
use crate::ingest::normalize::{load_issue_rows, parse_date};
use crate::models::{HeatmapRow, Snapshot};
use crate::snapshot::{build_snapshot, load_snapshot, render_snapshot_json, write_text_file};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Debug, Parser)]
#[command(
    name = "portfolio-pulse",
    version,
    about = "Weekly portfolio confidence snapshot, risk heatmap and executive brief"
)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Transform an issue-tracker CSV export into snapshot JSON
    Transform(TransformArgs),
    /// Derive the risk-driver heatmap (CSV + Markdown summary) from a snapshot
    Heatmap(HeatmapArgs),
    /// Render the executive brief from a snapshot
    Brief(BriefArgs),
    /// Print a terminal dashboard over a snapshot and optional heatmap
    Dashboard(DashboardArgs),
}

#[derive(Debug, Args)]
pub struct TransformArgs {
    /// Path to input CSV
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,
    /// Path to output snapshot JSON
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,
    /// Week ending date (YYYY-MM-DD)
    #[arg(long)]
    pub week_ending: String,
}

#[derive(Debug, Args)]
pub struct HeatmapArgs {
    /// Path to snapshot JSON
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,
    #[arg(long, value_name = "PATH")]
    pub out_csv: PathBuf,
    #[arg(long, value_name = "PATH")]
    pub out_md: PathBuf,
}

#[derive(Debug, Args)]
pub struct BriefArgs {
    /// Path to snapshot JSON
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,
    /// Path to write the Markdown brief
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Path to snapshot JSON
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,
    /// Heatmap CSV produced by `heatmap`
    #[arg(long, value_name = "PATH")]
    pub heatmap: Option<PathBuf>,
    /// Initiative name to drill into (defaults to the first)
    #[arg(long)]
    pub initiative: Option<String>,
}

pub fn transform_csv_to_snapshot(
    input: &Path,
    output: &Path,
    week_ending: &str,
    config: &PipelineConfig,
) -> AppResult<Snapshot> {
    if parse_date(week_ending).is_none() {
        return Err(AppError::invalid_week_ending(week_ending));
    }
    let rows = load_issue_rows(input)?;
    let snapshot = build_snapshot(&rows, week_ending, &config.source_tag)?;
    write_text_file(output, &render_snapshot_json(&snapshot)?)?;
    Ok(snapshot)
}

pub fn generate_heatmap(input: &Path, out_csv: &Path, out_md: &Path) -> AppResult<Vec<HeatmapRow>> {
    let snapshot = load_snapshot(input)?;
    let rows = build_heatmap(&snapshot);
    let csv = render_heatmap_csv(&rows);
    let summary = render_heatmap_summary(&snapshot.portfolio.week_ending, &rows);
    write_text_file(out_csv, &csv)?;
    write_text_file(out_md, &summary)?;
    tracing::info!(rows = rows.len(), "wrote heatmap artifacts");
    Ok(rows)
}

pub fn generate_brief(input: &Path, output: &Path) -> AppResult<String> {
    let snapshot = load_snapshot(input)?;
    let brief = brief::render_brief(&snapshot)?;
    write_text_file(output, &brief)?;
    Ok(brief)
}

pub fn render_dashboard_text(
    input: &Path,
    heatmap_path: Option<&Path>,
    initiative: Option<&str>,
) -> AppResult<String> {
    let snapshot = load_snapshot(input)?;
    let heatmap = match heatmap_path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|error| {
                AppError::Io(format!("failed reading {}: {}", path.to_string_lossy(), error))
            })?;
            Some(parse_heatmap_csv(&text))
        }
        None => None,
    };
    let view = dashboard::build_dashboard(&snapshot, heatmap, initiative)?;
    Ok(dashboard::render_dashboard(&view))
}

/// Runs one subcommand and returns the lines to print on success.
pub fn execute(command: &Command, config: &PipelineConfig) -> AppResult<Vec<String>> {
    match command {
        Command::Transform(args) => {
            transform_csv_to_snapshot(&args.input, &args.output, &args.week_ending, config)?;
            Ok(vec![format!(
                "Wrote snapshot to: {}",
                args.output.to_string_lossy()
            )])
        }
        Command::Heatmap(args) => {
            generate_heatmap(&args.input, &args.out_csv, &args.out_md)?;
            Ok(vec![
                format!("Wrote heatmap CSV to: {}", args.out_csv.to_string_lossy()),
                format!("Wrote heatmap summary to: {}", args.out_md.to_string_lossy()),
            ])
        }
        Command::Brief(args) => {
            generate_brief(&args.input, &args.output)?;
            Ok(vec![format!(
                "Wrote executive brief to: {}",
                args.output.to_string_lossy()
            )])
        }
        Command::Dashboard(args) => Ok(vec![render_dashboard_text(
            &args.input,
            args.heatmap.as_deref(),
            args.initiative.as_deref(),
        )?]),
    }
}

/// Parses arguments and executes without touching global logging state.
pub fn run_from_args<I, T>(args: I) -> AppResult<Vec<String>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|error| AppError::Cli(error.to_string()))?;
    let config = PipelineConfig::load(cli.config.as_deref())?;
    execute(&cli.command, &config)
}

pub fn run() -> AppResult<()> {
    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;
    let _guard = init_tracing(&config.logging)?;

    for line in execute(&cli.command, &config)? {
        println!("{line}");
    }
    Ok(())
}

/// Console logs go to stderr so stdout stays clean for artifacts and confirmations. The
/// returned guard must outlive the run when file logging is enabled.
fn init_tracing(logging: &LoggingConfig) -> AppResult<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.filter));

    let (result, guard) = match &logging.directory {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, "portfolio-pulse.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let result = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(non_blocking)
                .try_init();
            (result, Some(guard))
        }
        None if logging.json => {
            let result = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(std::io::stderr)
                .try_init();
            (result, None)
        }
        None => {
            let result = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
            (result, None)
        }
    };

    result.map_err(|error| AppError::Internal(error.to_string()))?;
    Ok(guard)
}
