use billings_reshape::{BillingsProcessor, PipelineConfig};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Reshape a wide billings export into long records and summary reports.
#[derive(Parser, Debug)]
#[command(name = "billings-reshape", version, about)]
struct Args {
    /// Wide-format CSV export to process
    input: PathBuf,

    /// Where to write the interim long-format CSV
    #[arg(long)]
    interim: Option<PathBuf>,

    /// Where to write the summary workbook
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file with pipeline settings; command line paths take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter: a level (error, warn, info, debug, trace) or directives such as `billings_reshape=debug`
    #[arg(long, default_value = "info")]
    log_level: String,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f ::";

/// Routes the library's `log` records through a fmt subscriber that prints
/// `<timestamp> :: <message>` on stdout.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(false)
        .with_level(false)
        .with_ansi(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args.log_level);

    let mut config = match &args.config {
        Some(path) => match PipelineConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => PipelineConfig::default(),
    };

    config.input_path = args.input;
    if let Some(interim) = args.interim {
        config.interim_path = interim;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }

    info!("Processing {}", config.input_path.display());
    match BillingsProcessor::run(&config) {
        Ok(run) => {
            info!(
                "{} records, {} countries, {} periods, {} segments",
                run.records.len(),
                run.summary.country_billings.len(),
                run.summary.period_billings.len(),
                run.summary.segment_stats.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
