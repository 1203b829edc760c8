//! Implementation of the `vigil sweep` command.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use uuid::Uuid;

use crate::adapters::sqlite::initialize_database;
use crate::cli::commands::build_engine;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::{EngineKind, RunOutcome, RunStats};

/// Arguments for the sweep command
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Which engine to run
    #[arg(long, value_enum, default_value_t = EngineSelect::All)]
    pub engine: EngineSelect,

    /// Restrict the run to a single tenant (skips the lock and cursor)
    #[arg(long)]
    pub tenant: Option<Uuid>,
}

/// Engine selector for manual sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineSelect {
    /// Risk evaluation, propagation, aggregation and escalation
    Risk,
    /// Due-date reminders
    Reminders,
    /// Both engines, risk first
    All,
}

impl EngineSelect {
    fn kinds(self) -> &'static [EngineKind] {
        match self {
            Self::Risk => &[EngineKind::Risk],
            Self::Reminders => &[EngineKind::Reminders],
            Self::All => &[EngineKind::Risk, EngineKind::Reminders],
        }
    }
}

/// Output for the sweep command
#[derive(Debug, Serialize)]
pub struct SweepOutput {
    pub success: bool,
    pub runs: Vec<EngineRunOutput>,
}

/// Outcome of one engine's run within a sweep invocation.
#[derive(Debug, Serialize)]
pub struct EngineRunOutput {
    pub engine: &'static str,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RunStats>,
}

impl CommandOutput for SweepOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for run in &self.runs {
            match &run.stats {
                Some(stats) => {
                    lines.push(format!("{} sweep completed", run.engine));
                    lines.push(format!(
                        "  tenants processed: {} ({} failed)",
                        stats.tenants_processed, stats.tenants_failed
                    ));
                    lines.push(format!("  tasks evaluated:   {}", stats.tasks_evaluated));
                    lines.push(format!(
                        "  flags raised:      {} ({} propagated)",
                        stats.flags_raised, stats.propagations
                    ));
                    lines.push(format!("  campaigns updated: {}", stats.campaigns_updated));
                    lines.push(format!("  escalations:       {}", stats.escalations));
                    lines.push(format!("  reminders sent:    {}", stats.reminders_sent));
                    if stats.units_failed > 0 {
                        lines.push(format!("  units failed:      {}", stats.units_failed));
                    }
                }
                None => lines.push(format!(
                    "{} sweep skipped: another runner holds the lock",
                    run.engine
                )),
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Execute the sweep command
pub async fn execute(args: SweepArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = initialize_database(&config.database.database_url())
        .await
        .context("Failed to initialize database")?;
    let engine = build_engine(&pool, config);

    let mut runs = Vec::new();
    for &kind in args.engine.kinds() {
        let outcome = match args.tenant {
            Some(org_id) => engine.run_for_tenant(kind, org_id).await?,
            None => engine.run_sweep(kind).await?,
        };
        runs.push(match outcome {
            RunOutcome::Completed(stats) => EngineRunOutput {
                engine: kind.as_str(),
                outcome: "completed",
                stats: Some(stats),
            },
            RunOutcome::LockHeld => EngineRunOutput {
                engine: kind.as_str(),
                outcome: "skipped",
                stats: None,
            },
        });
    }

    output(
        &SweepOutput {
            success: true,
            runs,
        },
        json_mode,
    );
    Ok(())
}
