//! Command-line interface definition.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "croft",
    version,
    about = "Multi-field, multi-crop cultivation planner"
)]
pub struct Cli {
    /// Worker threads for candidate generation ("auto" = CPU count)
    #[arg(long, global = true, default_value = "auto")]
    pub threads: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Produce a full allocation plan
    Optimize {
        /// Fields JSON file
        #[arg(long)]
        fields: PathBuf,
        /// Crop profiles JSON file
        #[arg(long)]
        crops: PathBuf,
        /// Weather file (.json or .csv)
        #[arg(long)]
        weather: PathBuf,
        /// Interaction rules JSON file
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Algorithm configuration JSON file (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Planning window start (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Planning window end (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Write the plan JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Evaluate the best cultivation periods for one (field, crop) pair
    Period {
        #[arg(long)]
        fields: PathBuf,
        #[arg(long)]
        crops: PathBuf,
        #[arg(long)]
        weather: PathBuf,
        /// Field ID to evaluate
        #[arg(long)]
        field: String,
        /// Crop ID to evaluate
        #[arg(long)]
        crop: String,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Apply move/remove/add instructions to a plan and re-optimize
    Adjust {
        /// Existing plan JSON file
        #[arg(long)]
        plan: PathBuf,
        /// Move instructions JSON file
        #[arg(long)]
        moves: PathBuf,
        #[arg(long)]
        fields: PathBuf,
        #[arg(long)]
        crops: PathBuf,
        #[arg(long)]
        weather: PathBuf,
        #[arg(long)]
        rules: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Write the adjust result JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
