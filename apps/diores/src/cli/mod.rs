//! # DIORES CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `average` - Compute the averages of a record file
//! - `check-field` - Range-check one value
//! - `validate` - Check the form steps of a record file
//! - `predict` - Finalize a record file and query the prediction service

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand, ValueEnum};
use diores_core::{DioresError, Field, Step, Track};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// DIORES - orientation form engine
///
/// Computes track-weighted averages, validates the form steps and forwards
/// finalized records to the prediction service.
#[derive(Parser, Debug)]
#[command(name = "diores")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./diores.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Form step selector.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepArg {
    PersonalInfo,
    PriorAverages,
    ExamInfo,
    /// Every step in order.
    All,
}

impl StepArg {
    /// Steps this selector covers.
    #[must_use]
    pub fn steps(self) -> Vec<Step> {
        match self {
            StepArg::PersonalInfo => vec![Step::PersonalInfo],
            StepArg::PriorAverages => vec![Step::PriorAverages],
            StepArg::ExamInfo => vec![Step::ExamInfo],
            StepArg::All => Step::ALL.to_vec(),
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compute the averages of a record
    Average {
        /// Record file (JSON object keyed by field name)
        #[arg(short, long)]
        file: PathBuf,

        /// Track (S1, S2, S3); defaults to the record's Série
        #[arg(short, long)]
        track: Option<Track>,

        /// Exempt the student from EPS
        #[arg(long)]
        unfit: bool,
    },

    /// Range-check a single value
    CheckField {
        /// Field name, e.g. MATH or Moy_nde
        #[arg(short, long)]
        field: Field,

        /// Raw value as typed in the form; omit for an empty field
        #[arg(short, long)]
        value: Option<String>,
    },

    /// Check the form steps of a record
    Validate {
        /// Record file (JSON object keyed by field name)
        #[arg(short, long)]
        file: PathBuf,

        /// Step to check
        #[arg(short, long, value_enum, default_value = "all")]
        step: StepArg,
    },

    /// Finalize a record and ask the prediction service
    Predict {
        /// Record file (JSON object keyed by field name)
        #[arg(short, long)]
        file: PathBuf,

        /// Print the request body instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), DioresError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(config, host, port).await,
        Commands::Average { file, track, unfit } => cmd_average(&file, track, unfit, json_mode),
        Commands::CheckField { field, value } => {
            cmd_check_field(&config, field, value.as_deref(), json_mode)
        }
        Commands::Validate { file, step } => cmd_validate(&config, &file, step, json_mode),
        Commands::Predict { file, dry_run } => cmd_predict(&config, &file, dry_run, json_mode).await,
    }
}
