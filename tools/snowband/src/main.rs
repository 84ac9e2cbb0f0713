/// Snow-band parameter generator: bands the fine DEM under every active
/// model-grid cell and writes the tab-delimited snow parameter file.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use snowband_core::{GeoTiffSource, PassStrategy, SnowbandConfig, SnowbandEngine};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// ── Constants ────────────────────────────────────────────────────────────────

/// Output file name when `--output` is not given.
const DEFAULT_OUTPUT: &str = "snow.param";
/// Log level when neither RUST_LOG nor `--log-level` is set.
const DEFAULT_LOG_LEVEL: &str = "info";

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Resolve the band ceiling first, then re-derive bands while writing
    TwoPass,
    /// Compute every cell once and pad after the ceiling is known
    Buffered,
}

impl From<Strategy> for PassStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::TwoPass => PassStrategy::TwoPass,
            Strategy::Buffered => PassStrategy::Buffered,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "snowband",
    version,
    about = "Generate elevation snow-band parameters for every active model grid cell"
)]
struct Args {
    /// Model grid mask GeoTIFF (1 = active cell)
    #[arg(short, long)]
    mask: PathBuf,

    /// Fine-resolution elevation GeoTIFF, co-registered with the mask
    #[arg(short, long)]
    elevation: PathBuf,

    /// Output snow parameter file (overwritten)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Vertical band height in metres (overrides the config file)
    #[arg(short, long)]
    interval: Option<u32>,

    /// JSON run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ceiling discovery strategy (overrides the config file)
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Omit the header line
    #[arg(long)]
    no_header: bool,

    /// Keep elevations below 0 m instead of treating them as missing
    #[arg(long)]
    keep_negative: bool,

    /// Write a JSON run summary here
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

// ── Config ───────────────────────────────────────────────────────────────────

fn load_config(args: &Args) -> Result<SnowbandConfig> {
    let mut cfg = match &args.config {
        Some(path) => SnowbandConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SnowbandConfig::default(),
    };
    if let Some(interval) = args.interval {
        cfg.interval = interval;
    }
    if let Some(strategy) = args.strategy {
        cfg.strategy = strategy.into();
    }
    if args.no_header {
        cfg.write_header = false;
    }
    if args.keep_negative {
        cfg.min_valid_elevation = None;
    }
    Ok(cfg)
}

// ── main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    let cfg = load_config(&args)?;
    info!(interval = cfg.interval, strategy = ?cfg.strategy, "starting snow-band run");

    let engine = SnowbandEngine::new(cfg).context("invalid run configuration")?;
    let summary = engine
        .run_to_path(
            &GeoTiffSource::new(&args.mask),
            &GeoTiffSource::new(&args.elevation),
            &args.output,
        )
        .with_context(|| format!("generating {}", args.output.display()))?;

    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json).with_context(|| format!("Write failed: {}", path.display()))?;
    }

    // SNOW_BAND in the model's global parameter file must match this.
    println!("Number of maximum bands: {}", summary.band_ceiling);
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
