use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use recap_summary::{AutoSummaryController, SummaryOutcome, DEFAULT_COLLECTION};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

/// Calls `check_and_trigger` on a fixed interval
pub struct Scheduler {
    controller: Arc<AutoSummaryController>,
    interval: Duration,
    collection: String,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(controller: Arc<AutoSummaryController>, interval: Duration) -> Self {
        Self {
            controller,
            interval,
            collection: DEFAULT_COLLECTION.to_string(),
            run_on_start: true,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    /// One check, logged by status
    pub async fn run_once(&self) -> SummaryOutcome {
        info!(collection = %self.collection, "Running auto-summary check");
        let outcome = self.controller.check_and_trigger(&self.collection).await;
        log_outcome(&outcome);
        outcome
    }

    /// Run until Ctrl-C
    pub async fn run(&self) -> usize {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves; returns the number of checks performed.
    ///
    /// A check in progress always finishes before shutdown is observed.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        info!(
            interval_secs = self.interval.as_secs(),
            threshold = self.controller.threshold(),
            "Scheduler started"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !self.run_on_start {
            // First tick completes immediately
            ticker.tick().await;
        }

        tokio::pin!(shutdown);
        let mut checks = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(checks, "Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                    checks += 1;
                }
            }
        }
        checks
    }
}

pub fn log_outcome(outcome: &SummaryOutcome) {
    match outcome {
        SummaryOutcome::NoSummaryNeeded { new_sessions_count, threshold, .. } => {
            info!(new_sessions_count, threshold, "No summary needed");
        }
        SummaryOutcome::SummaryCompleted {
            summary_key,
            new_sessions_processed,
            metadata_saved,
            ..
        } => {
            info!(%summary_key, new_sessions_processed, metadata_saved, "Summary completed");
            if !metadata_saved {
                warn!("Summary metadata was not saved; the next check will summarize again");
            }
        }
        SummaryOutcome::AlreadyRunning { message } => info!("{}", message),
        SummaryOutcome::SaveFailed { error, .. } => error!(%error, "Summary generated but not saved"),
        SummaryOutcome::Error { error_kind, error, .. } => {
            error!(%error_kind, %error, "Auto-summary check failed")
        }
    }
}
