//! Auto-refresh timer, countdown and refresh cycle counter

use crate::orchestrator::StatusOrchestrator;
use crate::summary::SummaryRequest;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

/// Cycle counter and countdown shown next to the service list
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshCycle {
    pub interval_secs: u64,
    pub summary_modulus: u64,
    pub cycle_count: u64,
    pub countdown_secs: u64,
}

impl RefreshCycle {
    pub fn new(interval: Duration, summary_modulus: u64) -> Self {
        let interval_secs = interval.as_secs().max(1);
        Self {
            interval_secs,
            summary_modulus: summary_modulus.max(1),
            cycle_count: 0,
            countdown_secs: interval_secs,
        }
    }

    /// One second elapsed. Wraps back to the full interval at zero.
    pub fn tick_countdown(&mut self) {
        self.countdown_secs = if self.countdown_secs > 0 {
            self.countdown_secs - 1
        } else {
            self.interval_secs
        };
    }

    /// Count an auto-refresh. Returns true when the summary is due as well.
    pub fn complete_cycle(&mut self) -> bool {
        self.cycle_count += 1;
        self.countdown_secs = self.interval_secs;
        self.cycle_count % self.summary_modulus == 0
    }

    pub fn reset(&mut self) {
        self.cycle_count = 0;
        self.countdown_secs = self.interval_secs;
    }
}

/// Drives periodic background refreshes and signals the summary panel
pub struct AutoRefresher {
    orchestrator: Arc<StatusOrchestrator>,
    cycle: Arc<RwLock<RefreshCycle>>,
    visibility: watch::Receiver<bool>,
    summary_requests: mpsc::UnboundedSender<SummaryRequest>,
    period: Duration,
}

impl AutoRefresher {
    pub fn new(
        orchestrator: Arc<StatusOrchestrator>,
        cycle: RefreshCycle,
        visibility: watch::Receiver<bool>,
        summary_requests: mpsc::UnboundedSender<SummaryRequest>,
    ) -> Self {
        let period = Duration::from_secs(cycle.interval_secs);
        Self {
            orchestrator,
            cycle: Arc::new(RwLock::new(cycle)),
            visibility,
            summary_requests,
            period,
        }
    }

    pub async fn cycle(&self) -> RefreshCycle {
        self.cycle.read().await.clone()
    }

    pub fn request_summary(&self) {
        if self.summary_requests.send(SummaryRequest::Refresh).is_err() {
            warn!("Summary panel is not listening, dropping refresh request");
        }
    }

    /// Manual refresh: reset the cycle, always refresh the summary, then
    /// run a foreground refresh of every service.
    pub async fn manual_refresh_all(&self) {
        self.cycle.write().await.reset();
        self.request_summary();
        self.orchestrator.refresh_all(false).await;
    }

    /// Handle one auto-refresh firing. Returns false when skipped.
    pub async fn on_auto_refresh(&self) -> bool {
        if !*self.visibility.borrow() {
            debug!("View hidden, skipping auto-refresh");
            return false;
        }

        let summary_due = self.cycle.write().await.complete_cycle();
        if summary_due {
            self.request_summary();
        }

        self.orchestrator.refresh_all(true).await;
        true
    }

    pub async fn on_countdown_tick(&self) {
        self.cycle.write().await.tick_countdown();
    }

    /// Fire `on_auto_refresh` every period until shutdown.
    #[instrument(skip_all)]
    pub async fn run_auto_refresh(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting auto-refresh every {:?}", self.period);
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_auto_refresh().await;
                }
                _ = shutdown.changed() => break,
            }
        }

        info!("Auto-refresh stopped");
    }

    /// Decrement the visible countdown every second until shutdown.
    pub async fn run_countdown(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_countdown_tick().await,
                _ = shutdown.changed() => break,
            }
        }
    }
}
