//! Global outage summary panel

use crate::models::{OutageSummary, SummarySource};
use crate::text_service::TextService;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, watch};
use tracing::{debug, error, info, instrument};

pub const NO_DISRUPTIONS_TEXT: &str =
    "No specific widespread outages identified by the scanner at this time. Systems appear stable.";
pub const SUMMARY_UNAVAILABLE_TEXT: &str =
    "Scanner data retrieved, but summary is currently unavailable.";
pub const SUMMARY_FAILED_TEXT: &str = "Could not load current global outage reports.";

/// Asks the panel to fetch a fresh summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryRequest {
    Refresh,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PanelState {
    pub summary: OutageSummary,
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Independently refreshed view of global disruptions
pub struct SummaryPanel {
    text_service: Arc<dyn TextService>,
    state: Arc<RwLock<PanelState>>,
}

impl SummaryPanel {
    pub fn new(text_service: Arc<dyn TextService>) -> Self {
        Self {
            text_service,
            state: Arc::new(RwLock::new(PanelState::default())),
        }
    }

    pub async fn state(&self) -> PanelState {
        self.state.read().await.clone()
    }

    /// Fetch the summary and replace the panel contents in one write.
    pub async fn refresh_summary(&self) {
        self.state.write().await.is_loading = true;

        let (summary, error) = match self.text_service.summarize_global_outages().await {
            Ok(raw) => {
                let sources: Vec<SummarySource> = raw
                    .citations
                    .into_iter()
                    .filter_map(|c| SummarySource::try_from(c).ok())
                    .collect();
                let text = match raw.text.trim() {
                    "" if sources.is_empty() => NO_DISRUPTIONS_TEXT.to_string(),
                    "" => SUMMARY_UNAVAILABLE_TEXT.to_string(),
                    text => text.to_string(),
                };
                debug!("Summary refreshed with {} sources", sources.len());
                (OutageSummary { text, sources }, None)
            }
            Err(e) => {
                error!("Failed to fetch global outage summary: {}", e);
                (
                    OutageSummary {
                        text: SUMMARY_FAILED_TEXT.to_string(),
                        sources: Vec::new(),
                    },
                    Some(format!("Failed to load Global Outage Scanner data. {}", e)),
                )
            }
        };

        let mut state = self.state.write().await;
        state.summary = summary;
        state.error = error;
        state.last_updated = Some(Utc::now());
        state.is_loading = false;
    }

    /// Refresh once, then once per request until shutdown or the sender goes away.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        mut requests: mpsc::UnboundedReceiver<SummaryRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("Starting summary panel");
        self.refresh_summary().await;

        loop {
            tokio::select! {
                request = requests.recv() => {
                    let Some(SummaryRequest::Refresh) = request else {
                        break;
                    };
                    let mut coalesced = 0;
                    while requests.try_recv().is_ok() {
                        coalesced += 1;
                    }
                    if coalesced > 0 {
                        debug!("Coalesced {} queued summary requests", coalesced);
                    }
                    self.refresh_summary().await;
                }
                _ = shutdown.changed() => break,
            }
        }

        info!("Summary panel stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DashboardError;
    use crate::models::{Citation, RawSummary};
    use crate::test_support::FakeTextService;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_successful_refresh_filters_sources() {
        let fake = Arc::new(FakeTextService::new());
        fake.set_summary(RawSummary {
            text: " Widespread DNS trouble. ".to_string(),
            citations: vec![
                Citation::new("https://a.example", "A"),
                Citation {
                    uri: Some("https://b.example".to_string()),
                    title: None,
                },
                Citation {
                    uri: None,
                    title: Some("No link".to_string()),
                },
            ],
        });
        let panel = SummaryPanel::new(fake);

        panel.refresh_summary().await;

        let state = panel.state().await;
        assert_eq!(state.summary.text, "Widespread DNS trouble.");
        assert_eq!(state.summary.sources.len(), 1);
        assert!(
            state
                .summary
                .sources
                .iter()
                .all(|s| !s.uri.is_empty() && !s.title.is_empty())
        );
        assert!(state.error.is_none());
        assert!(state.last_updated.is_some());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_empty_text_fallbacks() {
        let fake = Arc::new(FakeTextService::new());
        fake.set_summary(RawSummary::default());
        let panel = SummaryPanel::new(Arc::clone(&fake) as Arc<dyn TextService>);

        panel.refresh_summary().await;
        assert_eq!(panel.state().await.summary.text, NO_DISRUPTIONS_TEXT);

        fake.set_summary(RawSummary {
            text: String::new(),
            citations: vec![Citation::new("https://a.example", "A")],
        });
        panel.refresh_summary().await;
        assert_eq!(panel.state().await.summary.text, SUMMARY_UNAVAILABLE_TEXT);
    }

    #[tokio::test]
    async fn test_failure_replaces_summary_and_success_clears_error() {
        let fake = Arc::new(FakeTextService::new());
        let panel = SummaryPanel::new(Arc::clone(&fake) as Arc<dyn TextService>);

        panel.refresh_summary().await;
        assert_eq!(panel.state().await.summary.sources.len(), 1);

        fake.fail_summary(Some(DashboardError::RateLimited));
        panel.refresh_summary().await;

        let state = panel.state().await;
        assert_eq!(state.summary.text, SUMMARY_FAILED_TEXT);
        assert!(state.summary.sources.is_empty());
        assert!(
            state
                .error
                .as_deref()
                .unwrap()
                .starts_with("Failed to load Global Outage Scanner data.")
        );
        assert!(state.last_updated.is_some());

        fake.fail_summary(None);
        panel.refresh_summary().await;
        assert!(panel.state().await.error.is_none());
    }

    #[tokio::test]
    async fn test_run_refreshes_on_start_and_on_request() {
        let fake = Arc::new(FakeTextService::new());
        let panel = Arc::new(SummaryPanel::new(Arc::clone(&fake) as Arc<dyn TextService>));
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(SummaryRequest::Refresh).unwrap();
        let task = {
            let panel = Arc::clone(&panel);
            tokio::spawn(async move { panel.run(rx, shutdown_rx).await })
        };

        // Closing the channel ends the loop after the queued request
        drop(tx);
        task.await.unwrap();
        drop(shutdown_tx);

        assert_eq!(fake.summary_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let fake = Arc::new(FakeTextService::new());
        let panel = Arc::new(SummaryPanel::new(Arc::clone(&fake) as Arc<dyn TextService>));
        let (_tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = {
            let panel = Arc::clone(&panel);
            tokio::spawn(async move { panel.run(rx, shutdown_rx).await })
        };
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(fake.summary_calls.load(Ordering::SeqCst), 1);
    }
}
