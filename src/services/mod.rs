pub mod campaign_aggregator;
pub mod engine;
pub mod engine_daemon;
pub mod escalation;
pub mod history;
pub mod reminders;
pub mod risk_evaluator;
pub mod risk_propagator;

pub use campaign_aggregator::{assess_campaign, TaskRiskView};
pub use engine::{EngineKind, RiskEngine, RunOutcome, RunStats};
pub use engine_daemon::{
    DaemonHandle, DaemonStatus, EngineDaemon, EngineDaemonConfig, EngineDaemonEvent, StopReason,
};
pub use escalation::next_stage;
pub use history::EventHistory;
pub use reminders::{next_reminder, ReminderKind};
pub use risk_evaluator::evaluate_task;
pub use risk_propagator::{propagate_risk, Propagation};
