//! CLI argument parsing for navrcut

use crate::navr::Metric;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the exported dataset
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// Tabular CSV export
    Csv,
    /// Structured JSON export with metadata
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "navrcut")]
#[command(version)]
#[command(about = "Normalize brain-atlas effect sizes and threshold them against NAVR references", long_about = None)]
pub struct Cli {
    /// CSV file with per-structure effect sizes (Structure + Cohen_d columns)
    pub input: PathBuf,

    /// Atlas vocabulary to classify structures against
    #[arg(short = 'a', long = "atlas", default_value = "desikan")]
    pub atlas: String,

    /// Metric the NAVR reference tables are keyed by (required with --threshold)
    #[arg(short = 'm', long = "metric", value_enum)]
    pub metric: Option<Metric>,

    /// Directory holding the per-atlas NAVR reference files
    #[arg(long = "data-dir", value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Apply NAVR thresholding before exporting
    #[arg(short = 't', long = "threshold")]
    pub threshold: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Output file; "auto" picks a dated file name, omit for stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<String>,

    /// Print summary statistics in addition to the export
    #[arg(short = 's', long = "summary")]
    pub summary: bool,

    /// Enable debug logging
    #[arg(long = "debug")]
    pub debug: bool,
}
