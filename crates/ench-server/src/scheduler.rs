//! Check scheduler
//!
//! Every configured check gets its own task and timer. The first tick of
//! every timer waits for the shared initial delay; after that each check
//! fires on its own period. A tick runs its check to completion, so one
//! check never overlaps itself, and a failed cycle only produces a log line.

use chrono::Utc;
use ench_checks::{CheckEngine, CheckKind, Delivery};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Runs the configured checks on their intervals until stopped
pub struct Scheduler {
    engine: Arc<CheckEngine>,
    initial_delay: Duration,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(engine: Arc<CheckEngine>) -> Self {
        let initial_delay = engine.config().initial_delay;
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            engine,
            initial_delay,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn one task per configured check
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        let first_tick = Instant::now() + self.initial_delay;
        let mut tasks = self.tasks.lock().await;

        for (kind, period) in self.engine.configured_checks() {
            info!(
                check = %kind,
                period_min = period.as_secs() / 60,
                delay_secs = self.initial_delay.as_secs(),
                "Scheduling check"
            );

            let engine = self.engine.clone();
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            tasks.push(tokio::spawn(async move {
                let mut ticker = time::interval_at(first_tick, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            run_cycle(&engine, kind).await;
                        }
                        _ = shutdown_rx.recv() => break,
                    }
                }

                debug!(check = %kind, "Check task stopped");
            }));
        }
    }

    /// Signal every check task to stop after its current cycle
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for every check task to finish
    pub async fn join(&self) {
        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Check task panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Run one cycle of a check, logging instead of propagating failures
///
/// Returns whether the cycle completed.
pub async fn run_cycle(engine: &CheckEngine, kind: CheckKind) -> bool {
    match engine.run(kind, Utc::now()).await {
        Ok(outcome) => {
            if let Delivery::Sent { target } = &outcome.delivery {
                debug!(check = %kind, target = %target, "Cycle complete");
            }
            true
        }
        Err(e) => {
            error!(check = %kind, error = %e, "Check cycle failed");
            false
        }
    }
}

/// Run every configured check once, in scheduling order
///
/// Returns the number of failed cycles.
pub async fn run_once(engine: &CheckEngine) -> usize {
    let mut failed = 0;
    for (kind, _) in engine.configured_checks() {
        if !run_cycle(engine, kind).await {
            failed += 1;
        }
    }
    failed
}
