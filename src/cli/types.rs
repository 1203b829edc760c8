//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use crate::cli::commands::daemon::DaemonArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::status::StatusArgs;
use crate::cli::commands::sweep::SweepArgs;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Vigil - Background risk and escalation engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize Vigil configuration and database
    Init(InitArgs),

    /// Run one sweep of the risk or reminder engine
    Sweep(SweepArgs),

    /// Run both engines on their configured intervals
    Daemon(DaemonArgs),

    /// Show engine locks, cursors and flagged campaigns
    Status(StatusArgs),
}
