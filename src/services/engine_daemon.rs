//! Background scheduler for the sweep engines.
//!
//! Drives the risk sweep and the reminder sweep on their own cadences from
//! one loop. Lock handling lives in the engine itself; the daemon only
//! supplies the timers, a stop flag, a status snapshot, and an event
//! channel for whoever is watching.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::{interval, Instant};

use crate::domain::errors::DomainResult;
use crate::domain::models::EngineConfig;
use crate::services::engine::{EngineKind, RiskEngine, RunOutcome};

/// Configuration for the sweep daemon.
#[derive(Debug, Clone)]
pub struct EngineDaemonConfig {
    /// Interval between risk sweeps.
    pub risk_interval: Duration,
    /// Interval between reminder sweeps.
    pub reminder_interval: Duration,
    /// Whether to sweep immediately on startup.
    pub run_on_startup: bool,
    /// Maximum consecutive failures of one engine before stopping.
    pub max_consecutive_failures: u32,
}

impl Default for EngineDaemonConfig {
    fn default() -> Self {
        Self {
            risk_interval: Duration::from_secs(3600),
            reminder_interval: Duration::from_secs(1800),
            run_on_startup: true,
            max_consecutive_failures: 3,
        }
    }
}

impl EngineDaemonConfig {
    /// Derive daemon timing from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            risk_interval: Duration::from_secs(config.risk_interval_secs),
            reminder_interval: Duration::from_secs(config.reminder_interval_secs),
            run_on_startup: true,
            max_consecutive_failures: config.max_consecutive_failures,
        }
    }

    /// Create config for tight cadences (testing).
    pub fn frequent() -> Self {
        Self {
            risk_interval: Duration::from_secs(2),
            reminder_interval: Duration::from_secs(1),
            run_on_startup: true,
            max_consecutive_failures: 2,
        }
    }
}

/// Event emitted by the sweep daemon.
#[derive(Debug, Clone)]
pub enum EngineDaemonEvent {
    /// Daemon started.
    Started,
    /// A sweep began.
    SweepStarted { engine: EngineKind, run_number: u64 },
    /// A sweep finished (including lock-held skips).
    SweepCompleted {
        engine: EngineKind,
        run_number: u64,
        outcome: RunOutcome,
        duration_ms: u64,
    },
    /// A sweep failed.
    SweepFailed {
        engine: EngineKind,
        run_number: u64,
        error: String,
    },
    /// Daemon stopped.
    Stopped { reason: StopReason },
}

/// Reason the daemon stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Requested to stop.
    Requested,
    /// One engine failed too many times in a row.
    TooManyFailures,
}

/// Status of the sweep daemon.
#[derive(Debug, Clone)]
pub struct DaemonStatus {
    /// Whether the daemon is running.
    pub running: bool,
    /// Risk sweeps attempted.
    pub risk_runs: u64,
    /// Reminder sweeps attempted.
    pub reminder_runs: u64,
    /// Successful sweeps across both engines.
    pub successful_runs: u64,
    /// Failed sweeps across both engines.
    pub failed_runs: u64,
    /// Sweeps skipped because the lock was held.
    pub skipped_runs: u64,
    /// Last sweep time, either engine.
    pub last_run: Option<Instant>,
    /// Total escalations fired since start.
    pub total_escalations: u64,
    /// Total reminders sent since start.
    pub total_reminders: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            running: false,
            risk_runs: 0,
            reminder_runs: 0,
            successful_runs: 0,
            failed_runs: 0,
            skipped_runs: 0,
            last_run: None,
            total_escalations: 0,
            total_reminders: 0,
        }
    }
}

/// Handle to control the sweep daemon.
pub struct DaemonHandle {
    stop_flag: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    status: Arc<RwLock<DaemonStatus>>,
}

impl DaemonHandle {
    /// Request the daemon to stop. Wakes the loop if it is idle between
    /// sweeps; a sweep already in flight finishes first.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check if stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    /// Get current daemon status.
    pub async fn status(&self) -> DaemonStatus {
        self.status.read().await.clone()
    }
}

/// Sweep scheduler daemon.
pub struct EngineDaemon {
    engine: Arc<RiskEngine>,
    config: EngineDaemonConfig,
    status: Arc<RwLock<DaemonStatus>>,
    stop_flag: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
}

impl EngineDaemon {
    /// Create a new sweep daemon.
    pub fn new(engine: Arc<RiskEngine>, config: EngineDaemonConfig) -> Self {
        Self {
            engine,
            config,
            status: Arc::new(RwLock::new(DaemonStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            stop_notify: Arc::new(Notify::new()),
        }
    }

    /// Get a handle to control the daemon.
    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            stop_flag: self.stop_flag.clone(),
            stop_notify: self.stop_notify.clone(),
            status: self.status.clone(),
        }
    }

    /// Get configuration.
    pub fn config(&self) -> &EngineDaemonConfig {
        &self.config
    }

    /// Run the daemon, returning a channel for events.
    pub async fn run(self) -> mpsc::Receiver<EngineDaemonEvent> {
        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            self.run_loop(tx).await;
        });

        rx
    }

    /// Run the daemon with an existing sender.
    pub async fn run_with_sender(self, tx: mpsc::Sender<EngineDaemonEvent>) {
        self.run_loop(tx).await;
    }

    /// Run one sweep immediately (manual invocation).
    pub async fn run_once(&self, kind: EngineKind) -> DomainResult<RunOutcome> {
        self.engine.run_sweep(kind).await
    }

    async fn run_loop(self, tx: mpsc::Sender<EngineDaemonEvent>) {
        {
            let mut status = self.status.write().await;
            status.running = true;
        }
        let _ = tx.send(EngineDaemonEvent::Started).await;

        let mut risk_failures = 0u32;
        let mut reminder_failures = 0u32;
        let mut risk_timer = interval(self.config.risk_interval);
        let mut reminder_timer = interval(self.config.reminder_interval);

        // interval timers fire immediately once; swallow that tick unless a
        // startup sweep is wanted
        if !self.config.run_on_startup {
            risk_timer.tick().await;
            reminder_timer.tick().await;
        }

        let reason = loop {
            tokio::select! {
                _ = self.stop_notify.notified() => {
                    break StopReason::Requested;
                }
                _ = risk_timer.tick() => {
                    if self.stop_flag.load(Ordering::Acquire) {
                        break StopReason::Requested;
                    }
                    self.run_cycle(EngineKind::Risk, &tx, &mut risk_failures).await;
                    if risk_failures >= self.config.max_consecutive_failures {
                        break StopReason::TooManyFailures;
                    }
                }
                _ = reminder_timer.tick() => {
                    if self.stop_flag.load(Ordering::Acquire) {
                        break StopReason::Requested;
                    }
                    self.run_cycle(EngineKind::Reminders, &tx, &mut reminder_failures).await;
                    if reminder_failures >= self.config.max_consecutive_failures {
                        break StopReason::TooManyFailures;
                    }
                }
            }

            if self.stop_flag.load(Ordering::Acquire) {
                break StopReason::Requested;
            }
        };

        {
            let mut status = self.status.write().await;
            status.running = false;
        }
        let _ = tx.send(EngineDaemonEvent::Stopped { reason }).await;
    }

    async fn run_cycle(
        &self,
        kind: EngineKind,
        tx: &mpsc::Sender<EngineDaemonEvent>,
        consecutive_failures: &mut u32,
    ) {
        let run_number = {
            let mut status = self.status.write().await;
            match kind {
                EngineKind::Risk => {
                    status.risk_runs += 1;
                    status.risk_runs
                }
                EngineKind::Reminders => {
                    status.reminder_runs += 1;
                    status.reminder_runs
                }
            }
        };

        let _ = tx
            .send(EngineDaemonEvent::SweepStarted {
                engine: kind,
                run_number,
            })
            .await;

        let start = Instant::now();
        let result = self.engine.run_sweep(kind).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => {
                *consecutive_failures = 0;
                {
                    let mut status = self.status.write().await;
                    status.successful_runs += 1;
                    status.last_run = Some(Instant::now());
                    match outcome {
                        RunOutcome::Completed(stats) => {
                            status.total_escalations += stats.escalations as u64;
                            status.total_reminders += stats.reminders_sent as u64;
                        }
                        RunOutcome::LockHeld => status.skipped_runs += 1,
                    }
                }
                let _ = tx
                    .send(EngineDaemonEvent::SweepCompleted {
                        engine: kind,
                        run_number,
                        outcome,
                        duration_ms,
                    })
                    .await;
            }
            Err(error) => {
                *consecutive_failures += 1;
                {
                    let mut status = self.status.write().await;
                    status.failed_runs += 1;
                }
                let _ = tx
                    .send(EngineDaemonEvent::SweepFailed {
                        engine: kind,
                        run_number,
                        error: error.to_string(),
                    })
                    .await;
            }
        }
    }
}
