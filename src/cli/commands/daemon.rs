//! Implementation of the `vigil daemon` command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::signal;

use crate::adapters::sqlite::initialize_database;
use crate::cli::commands::build_engine;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::{
    DaemonStatus, EngineDaemon, EngineDaemonConfig, EngineDaemonEvent, RunOutcome, StopReason,
};

/// Arguments for the daemon command
#[derive(Args, Debug)]
pub struct DaemonArgs {
    /// Override the risk sweep interval in seconds
    #[arg(long)]
    pub risk_interval_secs: Option<u64>,

    /// Override the reminder sweep interval in seconds
    #[arg(long)]
    pub reminder_interval_secs: Option<u64>,

    /// Wait for the first interval instead of sweeping at startup
    #[arg(long)]
    pub no_initial_run: bool,
}

/// Final summary for the daemon command
#[derive(Debug, Serialize)]
pub struct DaemonOutput {
    pub success: bool,
    pub stop_reason: &'static str,
    pub risk_runs: u64,
    pub reminder_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub skipped_runs: u64,
    pub total_escalations: u64,
    pub total_reminders: u64,
}

impl DaemonOutput {
    fn from_status(reason: StopReason, status: &DaemonStatus) -> Self {
        Self {
            success: reason == StopReason::Requested,
            stop_reason: match reason {
                StopReason::Requested => "requested",
                StopReason::TooManyFailures => "too_many_failures",
            },
            risk_runs: status.risk_runs,
            reminder_runs: status.reminder_runs,
            successful_runs: status.successful_runs,
            failed_runs: status.failed_runs,
            skipped_runs: status.skipped_runs,
            total_escalations: status.total_escalations,
            total_reminders: status.total_reminders,
        }
    }
}

impl CommandOutput for DaemonOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            "Daemon Summary".to_string(),
            "==============".to_string(),
            format!("Stopped:           {}", self.stop_reason),
            format!("Risk sweeps:       {}", self.risk_runs),
            format!("Reminder sweeps:   {}", self.reminder_runs),
            format!("Successful:        {}", self.successful_runs),
            format!("Failed:            {}", self.failed_runs),
            format!("Skipped (locked):  {}", self.skipped_runs),
            format!("Escalations fired: {}", self.total_escalations),
            format!("Reminders sent:    {}", self.total_reminders),
        ];
        if self.stop_reason == "too_many_failures" {
            lines.push("One engine failed repeatedly; see logs for details".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Execute the daemon command
pub async fn execute(args: DaemonArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = initialize_database(&config.database.database_url())
        .await
        .context("Failed to initialize database")?;
    let engine = Arc::new(build_engine(&pool, config));

    let mut daemon_config = EngineDaemonConfig::from_config(&config.engine);
    if let Some(secs) = args.risk_interval_secs {
        daemon_config.risk_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.reminder_interval_secs {
        daemon_config.reminder_interval = Duration::from_secs(secs);
    }
    if args.no_initial_run {
        daemon_config.run_on_startup = false;
    }

    if !json_mode {
        println!("Starting Vigil engine daemon");
        println!(
            "   Risk sweep every     {}s",
            daemon_config.risk_interval.as_secs()
        );
        println!(
            "   Reminder sweep every {}s",
            daemon_config.reminder_interval.as_secs()
        );
        println!();
    }

    let daemon = EngineDaemon::new(engine, daemon_config);
    let stop_handle = daemon.handle();
    let status_handle = daemon.handle();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            stop_handle.stop();
        }
    });

    let mut events = daemon.run().await;
    let mut stop_reason = StopReason::Requested;
    while let Some(event) = events.recv().await {
        match &event {
            EngineDaemonEvent::Started => {
                if !json_mode {
                    println!("Daemon started; press Ctrl-C to stop");
                }
            }
            EngineDaemonEvent::SweepStarted { engine, run_number } => {
                if !json_mode {
                    println!("{} sweep #{} started", engine.as_str(), run_number);
                }
            }
            EngineDaemonEvent::SweepCompleted {
                engine,
                run_number,
                outcome,
                duration_ms,
            } => {
                if !json_mode {
                    match outcome {
                        RunOutcome::Completed(stats) => println!(
                            "{} sweep #{} completed in {}ms: {} tenants, {} flags, {} escalations, {} reminders",
                            engine.as_str(),
                            run_number,
                            duration_ms,
                            stats.tenants_processed,
                            stats.flags_raised,
                            stats.escalations,
                            stats.reminders_sent
                        ),
                        RunOutcome::LockHeld => println!(
                            "{} sweep #{} skipped: lock held elsewhere",
                            engine.as_str(),
                            run_number
                        ),
                    }
                }
            }
            EngineDaemonEvent::SweepFailed {
                engine,
                run_number,
                error,
            } => {
                if !json_mode {
                    println!("{} sweep #{} failed: {}", engine.as_str(), run_number, error);
                }
            }
            EngineDaemonEvent::Stopped { reason } => {
                stop_reason = *reason;
                if !json_mode {
                    println!();
                }
                break;
            }
        }
    }

    let status = status_handle.status().await;
    output(&DaemonOutput::from_status(stop_reason, &status), json_mode);

    if stop_reason == StopReason::TooManyFailures {
        anyhow::bail!("engine daemon stopped after repeated sweep failures");
    }
    Ok(())
}
