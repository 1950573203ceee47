//! Wires the orchestrator, scheduler and summary panel together

use crate::config::Config;
use crate::errors::{DashboardError, Result};
use crate::orchestrator::{Coin, ServiceBoard, StatusOrchestrator};
use crate::scheduler::{AutoRefresher, RefreshCycle};
use crate::summary::{PanelState, SummaryPanel, SummaryRequest};
use crate::text_service::{MeteredTextService, TextService};

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tracing::{error, info, instrument};
use uuid::Uuid;

const METRICS_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Everything a renderer needs, captured at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub dashboard_id: String,
    pub visible: bool,
    pub board: ServiceBoard,
    pub cycle: RefreshCycle,
    pub summary: PanelState,
}

pub struct Dashboard {
    dashboard_id: String,
    text_service: Arc<MeteredTextService<Arc<dyn TextService>>>,
    orchestrator: Arc<StatusOrchestrator>,
    panel: Arc<SummaryPanel>,
    refresher: Arc<AutoRefresher>,
    visibility: watch::Sender<bool>,
    summary_requests: Mutex<Option<mpsc::UnboundedReceiver<SummaryRequest>>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    pub fn new(config: &Config, text_service: Arc<dyn TextService>, coin: Arc<dyn Coin>) -> Self {
        let text_service = Arc::new(MeteredTextService::new(text_service));
        let shared: Arc<dyn TextService> = text_service.clone();

        let orchestrator = Arc::new(StatusOrchestrator::new(config, Arc::clone(&shared), coin));
        let panel = Arc::new(SummaryPanel::new(shared));

        let (summary_tx, summary_rx) = mpsc::unbounded_channel();
        let (visibility, visibility_rx) = watch::channel(true);
        let (shutdown, _) = watch::channel(false);

        let refresher = Arc::new(AutoRefresher::new(
            Arc::clone(&orchestrator),
            RefreshCycle::new(config.auto_refresh_interval, config.summary_refresh_modulus),
            visibility_rx,
            summary_tx,
        ));

        Self {
            dashboard_id: Uuid::new_v4().to_string(),
            text_service,
            orchestrator,
            panel,
            refresher,
            visibility,
            summary_requests: Mutex::new(Some(summary_rx)),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.dashboard_id
    }

    /// Load the service list and the summary once, without starting timers.
    pub async fn load_once(&self) {
        tokio::join!(
            self.orchestrator.initialize_service_set(),
            self.panel.refresh_summary()
        );
    }

    /// Spawn initialization, the summary panel and both timers.
    #[instrument(skip(self), fields(dashboard_id = %self.dashboard_id))]
    pub async fn start(&self) -> Result<()> {
        let requests = self
            .summary_requests
            .lock()
            .await
            .take()
            .ok_or(DashboardError::AlreadyStarted)?;

        info!("Starting dashboard {}", self.dashboard_id);
        let mut tasks = self.tasks.lock().await;

        let orchestrator = Arc::clone(&self.orchestrator);
        tasks.push(tokio::spawn(async move {
            orchestrator.initialize_service_set().await;
        }));

        let panel = Arc::clone(&self.panel);
        let shutdown = self.shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            panel.run(requests, shutdown).await;
        }));

        let refresher = Arc::clone(&self.refresher);
        let shutdown = self.shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            refresher.run_auto_refresh(shutdown).await;
        }));

        let refresher = Arc::clone(&self.refresher);
        let shutdown = self.shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            refresher.run_countdown(shutdown).await;
        }));

        let text_service = Arc::clone(&self.text_service);
        let mut shutdown = self.shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            let mut ticker = interval(METRICS_REPORT_INTERVAL);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => report_metrics(&text_service, "Text service metrics").await,
                    _ = shutdown.changed() => break,
                }
            }
        }));

        Ok(())
    }

    /// Stop every timer and wait for the spawned tasks to finish.
    pub async fn shutdown(&self) {
        info!("Shutting down dashboard {}", self.dashboard_id);
        let _ = self.shutdown.send(true);

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                error!("Dashboard task ended abnormally: {}", e);
            }
        }

        report_metrics(&self.text_service, "Final text service metrics").await;
        info!("Dashboard shutdown complete");
    }

    pub async fn manual_refresh_all(&self) {
        self.refresher.manual_refresh_all().await;
    }

    pub async fn refresh_single(&self, service_id: &str) {
        self.orchestrator.refresh_single(service_id).await;
    }

    /// Auto-refresh only runs while the view is visible.
    pub fn set_visible(&self, visible: bool) {
        self.visibility.send_replace(visible);
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let visible = *self.visibility.borrow();
        DashboardSnapshot {
            dashboard_id: self.dashboard_id.clone(),
            visible,
            board: self.orchestrator.board().await,
            cycle: self.refresher.cycle().await,
            summary: self.panel.state().await,
        }
    }
}

async fn report_metrics(text_service: &MeteredTextService<Arc<dyn TextService>>, label: &str) {
    let metrics = text_service.metrics().await;
    info!(
        "{} - {} attempts, {:.1}% success rate, {} rate limited, avg {}ms",
        label, metrics.attempts, metrics.success_rate, metrics.rate_limited, metrics.avg_duration_ms
    );
}
