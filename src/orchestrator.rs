//! Service list ownership and simulated status transitions

use crate::config::Config;
use crate::errors::{DashboardError, RATE_LIMIT_MESSAGE, Result};
use crate::models::{ServiceRecord, ServiceStatus};
use crate::text_service::{TextService, sanitize_names};

use chrono::Utc;
use futures::future::join_all;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

pub const INITIAL_FETCH_FAILED_DETAIL: &str = "Failed to fetch initial status.";
pub const OUTAGE_DETAIL_FAILED: &str = "Could not retrieve specific outage details due to an error.";
pub const REVALIDATING_DETAIL: &str = "Re-validating status...";

const ERROR_DETAIL_CHARS: usize = 100;

/// Source of the random draws behind simulated status changes.
pub trait Coin: Send + Sync {
    /// Returns true with the given probability.
    fn flip(&self, probability: f64) -> bool;
}

/// `Coin` backed by the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngCoin;

impl Coin for ThreadRngCoin {
    fn flip(&self, probability: f64) -> bool {
        rand::rng().random_bool(probability.clamp(0.0, 1.0))
    }
}

/// Everything the service list view shows
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceBoard {
    pub services: Vec<ServiceRecord>,
    pub is_loading: bool,
    pub is_background_refreshing: bool,
    /// Shared user-visible banner message
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
struct StatusPolicy {
    operational_probability: f64,
    background_change_probability: f64,
    single_flip_probability: f64,
    unknown_outage_probability: f64,
}

/// Owns the monitored services and drives their refreshes
pub struct StatusOrchestrator {
    core_services: Vec<String>,
    additional_services: usize,
    policy: StatusPolicy,
    text_service: Arc<dyn TextService>,
    coin: Arc<dyn Coin>,
    board: Arc<RwLock<ServiceBoard>>,
}

impl StatusOrchestrator {
    pub fn new(config: &Config, text_service: Arc<dyn TextService>, coin: Arc<dyn Coin>) -> Self {
        Self {
            core_services: config.core_services.clone(),
            additional_services: config.additional_services,
            policy: StatusPolicy {
                operational_probability: config.operational_probability,
                background_change_probability: config.background_change_probability,
                single_flip_probability: config.single_flip_probability,
                unknown_outage_probability: config.unknown_outage_probability,
            },
            text_service,
            coin,
            board: Arc::new(RwLock::new(ServiceBoard::default())),
        }
    }

    /// Current state of the service list
    pub async fn board(&self) -> ServiceBoard {
        self.board.read().await.clone()
    }

    pub async fn services(&self) -> Vec<ServiceRecord> {
        self.board.read().await.services.clone()
    }

    /// Seed the list with core and discovered services. No-op once populated.
    #[instrument(skip(self))]
    pub async fn initialize_service_set(&self) {
        if !self.board.read().await.services.is_empty() {
            return;
        }

        self.board.write().await.is_loading = true;
        let discovered = self.discover_services().await;

        let mut board = self.board.write().await;
        if board.services.is_empty() {
            match discovered {
                Ok(records) => {
                    info!("Initialized {} services", records.len());
                    board.services = records;
                    board.error = None;
                }
                Err(e) => {
                    error!("Failed to load service data: {}", e);
                    board.services = self.fallback_services();
                    board.error = Some(format!("Failed to load service data. {}", e));
                }
            }
        } else {
            debug!("Service list was populated concurrently, discarding discovery result");
        }
        board.is_loading = false;
    }

    async fn discover_services(&self) -> Result<Vec<ServiceRecord>> {
        let discovered = self
            .text_service
            .list_related_names(&self.core_services, self.additional_services)
            .await?;
        let discovered = sanitize_names(discovered, &self.core_services, self.additional_services);

        let names: Vec<String> = self.core_services.iter().cloned().chain(discovered).collect();
        let statuses: Vec<ServiceStatus> = names
            .iter()
            .map(|_| self.draw_status())
            .collect();

        let details = join_all(names.iter().zip(&statuses).map(|(name, status)| async move {
            if *status == ServiceStatus::Outage {
                self.text_service.describe_outage(name).await.map(Some)
            } else {
                Ok(None)
            }
        }))
        .await;

        let mut records = Vec::with_capacity(names.len());
        for (index, ((name, status), details)) in names.iter().zip(statuses).zip(details).enumerate() {
            let mut record = ServiceRecord::new(name, index, status).checked_now();
            record.details = details?;
            records.push(record);
        }

        Ok(records)
    }

    fn fallback_services(&self) -> Vec<ServiceRecord> {
        self.core_services
            .iter()
            .enumerate()
            .map(|(index, name)| {
                ServiceRecord::new(name, index, ServiceStatus::Unknown)
                    .with_details(INITIAL_FETCH_FAILED_DETAIL)
                    .checked_now()
            })
            .collect()
    }

    /// Recompute every service's status.
    ///
    /// Foreground refreshes redraw each status; background refreshes keep the
    /// prior status unless the change flip fires. Records in `Checking` belong
    /// to an in-flight single refresh and are left alone, both when planning
    /// and when merging results back.
    #[instrument(skip(self))]
    pub async fn refresh_all(&self, is_background: bool) {
        let snapshot: Vec<(String, String, ServiceStatus)> = {
            let board = self.board.read().await;
            board
                .services
                .iter()
                .map(|s| (s.id.clone(), s.name.clone(), s.status))
                .collect()
        };

        if snapshot.is_empty() {
            self.initialize_service_set().await;
            return;
        }

        self.mark_refreshing(is_background).await;

        let plan: Vec<(String, String, ServiceStatus)> = snapshot
            .into_iter()
            .filter(|(_, _, status)| *status != ServiceStatus::Checking)
            .map(|(id, name, prior)| {
                let next = self.next_status(prior, is_background);
                (id, name, next)
            })
            .collect();

        let outcomes = join_all(plan.iter().map(|(_, name, status)| async move {
            if *status == ServiceStatus::Outage {
                self.text_service.describe_outage(name).await.map(Some)
            } else {
                Ok(None)
            }
        }))
        .await;

        let mut rate_limited = false;
        let mut board = self.board.write().await;
        for ((id, name, status), outcome) in plan.into_iter().zip(outcomes) {
            let details = match outcome {
                Ok(details) => details,
                Err(e) => {
                    warn!("Failed to fetch details for {}: {}", name, e);
                    rate_limited |= e.is_rate_limited();
                    Some(OUTAGE_DETAIL_FAILED.to_string())
                }
            };

            let Some(record) = board.services.iter_mut().find(|s| s.id == id) else {
                continue;
            };
            if record.status == ServiceStatus::Checking {
                debug!("Skipping {} while a single refresh is in flight", name);
                continue;
            }
            record.status = status;
            record.details = details;
            record.last_checked = Some(Utc::now());
        }

        board.error = rate_limited.then(|| RATE_LIMIT_MESSAGE.to_string());
        if is_background {
            board.is_background_refreshing = false;
        } else {
            board.is_loading = false;
        }

        debug!(
            "Refreshed {} services (background: {})",
            board.services.len(),
            is_background
        );
    }

    /// Re-check one service, passing it through `Checking`.
    #[instrument(skip(self))]
    pub async fn refresh_single(&self, service_id: &str) {
        let (name, prior) = {
            let mut board = self.board.write().await;
            let Some(record) = board.services.iter_mut().find(|s| s.id == service_id) else {
                warn!("No service with id {}", service_id);
                return;
            };
            if record.status == ServiceStatus::Checking {
                debug!("Service {} is already being checked", record.name);
                return;
            }
            let prior = record.status;
            record.status = ServiceStatus::Checking;
            record.details = Some(REVALIDATING_DETAIL.to_string());
            (record.name.clone(), prior)
        };

        let next = match prior {
            ServiceStatus::Unknown => {
                if self.coin.flip(self.policy.unknown_outage_probability) {
                    ServiceStatus::Outage
                } else {
                    ServiceStatus::Operational
                }
            }
            _ if self.coin.flip(self.policy.single_flip_probability) => prior.flipped(),
            _ => prior,
        };

        let details = if next == ServiceStatus::Outage {
            self.text_service.describe_outage(&name).await.map(Some)
        } else {
            Ok(None)
        };

        let mut board = self.board.write().await;
        let banner = {
            let Some(record) = board.services.iter_mut().find(|s| s.id == service_id) else {
                return;
            };
            record.last_checked = Some(Utc::now());
            match details {
                Ok(details) => {
                    record.status = next;
                    record.details = details;
                    None
                }
                Err(e) => {
                    error!("Failed to refresh service {}: {}", name, e);
                    record.status = ServiceStatus::Unknown;
                    record.details = Some(error_detail(&e));
                    Some(format!("Error refreshing {}: {}", name, e))
                }
            }
        };
        board.error = banner;
    }

    async fn mark_refreshing(&self, is_background: bool) {
        let mut board = self.board.write().await;
        if is_background {
            board.is_background_refreshing = true;
        } else {
            board.is_loading = true;
        }
    }

    fn draw_status(&self) -> ServiceStatus {
        if self.coin.flip(self.policy.operational_probability) {
            ServiceStatus::Operational
        } else {
            ServiceStatus::Outage
        }
    }

    fn next_status(&self, prior: ServiceStatus, is_background: bool) -> ServiceStatus {
        if !is_background {
            return self.draw_status();
        }
        if self.coin.flip(self.policy.background_change_probability) {
            prior.flipped()
        } else {
            prior
        }
    }
}

fn error_detail(error: &DashboardError) -> String {
    let message: String = error.to_string().chars().take(ERROR_DETAIL_CHARS).collect();
    format!("Error refreshing: {}...", message)
}
