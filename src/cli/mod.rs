pub mod import;
pub mod merge;
pub mod report;
pub mod sources;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::merge::MergeInput;

#[derive(Parser)]
#[command(
    name = "kakei",
    about = "Normalize messy Japanese bank and card CSV exports into one transaction table."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize source CSV exports into the canonical schema.
    Import {
        /// CSV files to import (default: every *.csv in --input-dir)
        files: Vec<PathBuf>,
        /// Source format key (see `kakei sources`)
        #[arg(long)]
        source: String,
        /// Directory scanned when no files are given
        #[arg(long = "input-dir", default_value = ".")]
        input_dir: PathBuf,
        /// Normalized CSV output path
        #[arg(long, default_value = "normalized_transactions.csv")]
        output: PathBuf,
        /// Year completing month/day-only dates (e.g. 2026)
        #[arg(long = "default-year")]
        default_year: Option<i32>,
    },
    /// Combine normalized CSVs from several sources into one analysis table.
    Merge {
        /// Inputs as name:type:path, type one of credit_card or bank
        #[arg(required = true)]
        inputs: Vec<MergeInput>,
        /// Merged CSV output path
        #[arg(long, default_value = "all_transactions.csv")]
        output: PathBuf,
    },
    /// Generate a Markdown household cash-flow report for one year.
    Report {
        /// Merged transactions CSV
        #[arg(long, default_value = "all_transactions.csv")]
        input: PathBuf,
        /// Report year (e.g. 2025)
        #[arg(long)]
        year: i32,
        /// Classification rules JSON file
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Report output path (default: {year}_household_cashflow.md)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List built-in source formats.
    Sources,
}
