//! DBC Log Decoder CLI Application
//!
//! This is the command-line interface for the DBC log decoder.
//! It uses the dbc-log-decoder library and adds:
//! - Log file discovery and per-file output naming
//! - Held-value CSV with resampling, sparse CSV, JSON lines
//! - Dated output folders and their cleanup
//! - Parallel frame decoding

use anyhow::{Context, Result};
use clap::Parser;
use dbc_log_decoder::{DecodedFrame, Decoder, DecoderConfig, MessageDefinition, Timestamp};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

mod config;
mod report;
mod state;

use config::{AppConfig, CsvMode, OutputFormat};

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_OUTPUT_DIR: &str = "csv";

/// DBC Log Decoder - Decode CAN trace logs into CSV
#[derive(Parser, Debug)]
#[command(name = "dbc-log-cli")]
#[command(about = "Decode CAN trace logs with a DBC file", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the DBC file
    #[arg(short, long, value_name = "FILE")]
    dbc: Option<PathBuf>,

    /// Trace log file(s) to decode (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    log: Vec<PathBuf>,

    /// Directory searched for *.log files when no --log is given
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Directory for output files (created if missing)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Minimum time between two held CSV rows
    #[arg(short, long, value_name = "MS")]
    sample_rate_ms: Option<u64>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// CSV row mode
    #[arg(long, value_enum)]
    mode: Option<CsvMode>,

    /// Header lines at the top of each trace file
    #[arg(long, value_name = "COUNT")]
    header_lines: Option<usize>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the parsed DBC as JSON and exit
    #[arg(long)]
    dump_schema: bool,

    /// Delete yesterday's dated output folder before decoding
    #[arg(long)]
    clean_previous_day: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// Everything a run needs, after merging the config file and the flags
#[derive(Debug)]
struct Settings {
    dbc: PathBuf,
    logs: Vec<PathBuf>,
    log_dir: PathBuf,
    output_dir: PathBuf,
    format: OutputFormat,
    mode: CsvMode,
    sample_rate_ms: u64,
    decoder_config: DecoderConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("DBC Log Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", dbc_log_decoder::VERSION);

    let settings = resolve_settings(&args)?;
    log::debug!("Settings: {:?}", settings);

    let mut decoder = Decoder::new();
    decoder
        .add_dbc(&settings.dbc)
        .with_context(|| format!("Failed to load DBC file: {:?}", settings.dbc))?;

    let stats = decoder.database_stats();
    log::info!(
        "Signal database: {} messages, {} signals, {} skipped lines",
        stats.num_messages,
        stats.num_signals,
        stats.num_skipped_lines
    );
    for skipped in decoder.skipped_lines() {
        log::debug!("DBC line {} skipped: {}", skipped.line_number, skipped.reason);
    }

    if args.dump_schema {
        return dump_schema(&decoder);
    }

    decode_logs(&decoder, &settings, args.clean_previous_day)
}

/// Merge the optional config file with the command line (flags win)
fn resolve_settings(args: &Args) -> Result<Settings> {
    let app = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let dbc = args
        .dbc
        .clone()
        .or_else(|| app.input.dbc_file.clone())
        .context("No DBC file given (use --dbc or set input.dbc_file)")?;

    let logs = if args.log.is_empty() {
        app.input.files.clone()
    } else {
        args.log.clone()
    };

    let mut decoder_config = app.decoder_config();
    if let Some(header_lines) = args.header_lines {
        decoder_config = decoder_config.with_header_lines(header_lines);
    }

    Ok(Settings {
        dbc,
        logs,
        log_dir: args
            .log_dir
            .clone()
            .or_else(|| app.input.log_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        output_dir: args
            .output_dir
            .clone()
            .or_else(|| app.output.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        format: args.format.or(app.output.format).unwrap_or_default(),
        mode: args.mode.or(app.output.mode).unwrap_or_default(),
        sample_rate_ms: args.sample_rate_ms.or(app.output.sample_rate_ms).unwrap_or(0),
        decoder_config,
    })
}

/// Print every message definition, sorted by ID
fn dump_schema(decoder: &Decoder) -> Result<()> {
    let mut messages: Vec<&MessageDefinition> = decoder.database().messages().collect();
    messages.sort_by_key(|m| m.id);
    serde_json::to_writer_pretty(io::stdout().lock(), &messages)?;
    println!();
    Ok(())
}

/// Decode every selected log file; a failing file does not stop the others
fn decode_logs(decoder: &Decoder, settings: &Settings, clean_previous_day: bool) -> Result<()> {
    let logs = if settings.logs.is_empty() {
        find_log_files(&settings.log_dir)?
    } else {
        settings.logs.clone()
    };
    if logs.is_empty() {
        log::warn!("No log files found in {:?}", settings.log_dir);
        return Ok(());
    }

    fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", settings.output_dir))?;

    if clean_previous_day {
        let today = chrono::Local::now().date_naive();
        report::clean_previous_day(&settings.output_dir, today)
            .context("Failed to delete previous day's folder")?;
    }

    let columns = decoder.signal_names();
    log::info!("Sample rate is: {} ms", settings.sample_rate_ms);

    let mut failures = 0;
    for log_path in &logs {
        match process_log(decoder, log_path, &columns, settings) {
            Ok(output) => println!("Data from {:?} saved to {:?} successfully.", log_path, output),
            Err(e) => {
                log::error!("Error saving data from {:?}: {:#}", log_path, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} log files could not be processed", failures, logs.len());
    }
    Ok(())
}

/// All `*.log` files of a directory, sorted by name
fn find_log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read log directory: {:?}", dir))?;

    let mut logs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "log") {
            logs.push(path);
        }
    }
    logs.sort();
    Ok(logs)
}

/// Decode one log file and write its output; returns the output path
fn process_log(
    decoder: &Decoder,
    log_path: &Path,
    columns: &[String],
    settings: &Settings,
) -> Result<PathBuf> {
    let frames = Decoder::read_frames(log_path, &settings.decoder_config)
        .with_context(|| format!("Failed to read log file: {:?}", log_path))?;

    // Decoding is independent per frame; the indexed collect keeps log order
    let decoded: Vec<DecodedFrame<Timestamp>> = frames
        .par_iter()
        .filter_map(|frame| decoder.decode_frame(frame))
        .collect();
    log::info!(
        "{:?}: {} frames read, {} decoded",
        log_path,
        frames.len(),
        decoded.len()
    );

    let stem = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("decoded");

    let output = match (settings.format, settings.mode) {
        (OutputFormat::Json, _) => {
            let path = settings.output_dir.join(format!("{}.jsonl", stem));
            let rows = report::write_json_lines(BufWriter::new(create(&path)?), &decoded)?;
            log::debug!("Wrote {} JSON records to {:?}", rows, path);
            path
        }
        (OutputFormat::Csv, CsvMode::Held) => {
            let path = settings.output_dir.join(format!("{}.csv", stem));
            let rows = report::write_held_csv(
                BufWriter::new(create(&path)?),
                &decoded,
                columns,
                settings.sample_rate_ms,
            )?;
            log::debug!("Wrote {} rows to {:?}", rows, path);
            path
        }
        (OutputFormat::Csv, CsvMode::Sparse) => {
            let today = chrono::Local::now().date_naive();
            let path = report::sparse_output_path(&settings.output_dir, today)?;
            let rows = report::write_sparse_csv(BufWriter::new(create(&path)?), &decoded, columns)?;
            log::debug!("Wrote {} rows to {:?}", rows, path);
            path
        }
    };

    Ok(output)
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
