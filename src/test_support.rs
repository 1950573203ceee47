//! Deterministic collaborators for unit tests

use crate::errors::{DashboardError, Result};
use crate::models::{Citation, RawSummary};
use crate::orchestrator::Coin;
use crate::text_service::TextService;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

fn replay(err: &DashboardError) -> DashboardError {
    match err {
        DashboardError::Configuration(msg) => DashboardError::Configuration(msg.clone()),
        DashboardError::RateLimited => DashboardError::RateLimited,
        DashboardError::Auth(msg) => DashboardError::Auth(msg.clone()),
        DashboardError::Generic(msg) => DashboardError::Generic(msg.clone()),
        other => DashboardError::Generic(other.to_string()),
    }
}

/// Scripted text service. Names, details and summaries are canned.
pub struct FakeTextService {
    names: Mutex<Vec<String>>,
    names_failure: Mutex<Option<DashboardError>>,
    outage_failures: Mutex<HashMap<String, DashboardError>>,
    summary: Mutex<RawSummary>,
    summary_failure: Mutex<Option<DashboardError>>,
    outage_gate: Mutex<Option<Arc<Semaphore>>>,
    pub describe_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
}

impl FakeTextService {
    pub fn new() -> Self {
        Self {
            names: Mutex::new(
                ["GitHub", "Zoom", "Slack", "Stripe", "Cloudflare", "Salesforce", "Google Cloud"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            names_failure: Mutex::new(None),
            outage_failures: Mutex::new(HashMap::new()),
            summary: Mutex::new(RawSummary {
                text: "ConnectSphere users report login failures.".to_string(),
                citations: vec![Citation::new("https://status.example/connectsphere", "ConnectSphere status")],
            }),
            summary_failure: Mutex::new(None),
            outage_gate: Mutex::new(None),
            describe_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_names(self, names: &[&str]) -> Self {
        *self.names.lock().unwrap() = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn fail_names(&self, err: DashboardError) {
        *self.names_failure.lock().unwrap() = Some(err);
    }

    pub fn fail_outage_for(&self, name: &str, err: DashboardError) {
        self.outage_failures.lock().unwrap().insert(name.to_string(), err);
    }

    pub fn set_summary(&self, summary: RawSummary) {
        *self.summary.lock().unwrap() = summary;
    }

    pub fn fail_summary(&self, err: Option<DashboardError>) {
        *self.summary_failure.lock().unwrap() = err;
    }

    /// Make every outage description wait for a permit on the returned gate.
    pub fn gate_outages(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.outage_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn details_for(name: &str) -> String {
        format!("{} control plane is unresponsive", name)
    }
}

#[async_trait]
impl TextService for FakeTextService {
    async fn list_related_names(&self, _excluding: &[String], count: usize) -> Result<Vec<String>> {
        if let Some(err) = self.names_failure.lock().unwrap().as_ref() {
            return Err(replay(err));
        }
        Ok(self.names.lock().unwrap().iter().take(count).cloned().collect())
    }

    async fn describe_outage(&self, service_name: &str) -> Result<String> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.outage_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let permit = gate.acquire().await.map_err(|e| DashboardError::Generic(e.to_string()))?;
            permit.forget();
        }

        if let Some(err) = self.outage_failures.lock().unwrap().get(service_name) {
            return Err(replay(err));
        }
        Ok(Self::details_for(service_name))
    }

    async fn summarize_global_outages(&self) -> Result<RawSummary> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.summary_failure.lock().unwrap().as_ref() {
            return Err(replay(err));
        }
        Ok(self.summary.lock().unwrap().clone())
    }
}

/// Coin that replays a fixed script, then keeps answering `fallback`.
pub struct ScriptedCoin {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl ScriptedCoin {
    pub fn new(script: &[bool], fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            fallback,
        }
    }

    pub fn always(outcome: bool) -> Self {
        Self::new(&[], outcome)
    }
}

impl Coin for ScriptedCoin {
    fn flip(&self, _probability: f64) -> bool {
        self.script.lock().unwrap().pop_front().unwrap_or(self.fallback)
    }
}
