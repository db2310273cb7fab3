use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use occupancy_lens::config::{read_config, RunConfig};
use occupancy_lens::export::{to_delimited, utilization_records};
use occupancy_lens::logger::initiate_logger;
use occupancy_lens::{build_report, load, OccupancyError, SourceSet};

#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct CliArgs {
    #[arg(short = 'c', long, value_name = "Report Configuration File")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config = match read_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read {}: {e}", args.config.display());
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = initiate_logger(&config.log_settings) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let start = std::time::Instant::now();
    match run(config) {
        Ok(()) => {
            info!("Report finished in {} ms.", start.elapsed().as_millis());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: RunConfig) -> Result<(), OccupancyError> {
    let sources = match &config.sources.directory {
        Some(dir) => SourceSet::directory(dir)?,
        None => SourceSet::files(config.sources.files.iter()),
    };
    let columns = config.columns.resolve()?;
    info!("Loading {} source files", sources.len());
    let loaded = load(&sources, &columns)?;

    let report = build_report(&loaded.table, &config.selection, columns.value_kind)?;
    for diagnostic in loaded.diagnostics.iter().chain(&report.diagnostics) {
        println!("{diagnostic}");
    }
    for entity in report.charted() {
        println!(
            "{:<30} peak {:>4}  utilization {:>6.2}%",
            entity.entity, entity.peak, entity.utilization.percent
        );
    }

    let bytes = to_delimited(&utilization_records(&report))?;
    if let Some(parent) = config.output.export_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config.output.export_path, bytes)?;
    info!("Utilization written to {}", config.output.export_path.display());
    Ok(())
}
