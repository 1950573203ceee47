//! The external text service boundary and a metrics-recording wrapper

use crate::errors::{DashboardError, Result};
use crate::models::RawSummary;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Names longer than this are treated as noise from the model.
const MAX_NAME_LEN: usize = 50;

/// Turns prompts into free text for the dashboard.
#[async_trait]
pub trait TextService: Send + Sync {
    /// Ask for `count` well-known service names not in `excluding`.
    async fn list_related_names(&self, excluding: &[String], count: usize) -> Result<Vec<String>>;

    /// One-line plausible reason for an outage of `service_name`.
    async fn describe_outage(&self, service_name: &str) -> Result<String>;

    /// Search-augmented narrative of current global disruptions.
    async fn summarize_global_outages(&self) -> Result<RawSummary>;
}

#[async_trait]
impl<T: TextService + ?Sized> TextService for Arc<T> {
    async fn list_related_names(&self, excluding: &[String], count: usize) -> Result<Vec<String>> {
        (**self).list_related_names(excluding, count).await
    }

    async fn describe_outage(&self, service_name: &str) -> Result<String> {
        (**self).describe_outage(service_name).await
    }

    async fn summarize_global_outages(&self) -> Result<RawSummary> {
        (**self).summarize_global_outages().await
    }
}

/// Split a comma-separated model answer into clean, distinct names.
pub fn parse_service_names(response: &str, excluding: &[String], count: usize) -> Vec<String> {
    sanitize_names(response.split(',').map(str::to_string), excluding, count)
}

/// Trim names and drop blanks, overlong names and case-insensitive duplicates.
pub fn sanitize_names<I>(names: I, excluding: &[String], count: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: Vec<String> = excluding.iter().map(|s| s.to_lowercase()).collect();
    let mut clean = Vec::new();

    for name in names {
        if clean.len() == count {
            break;
        }
        let name = name.trim();
        if name.is_empty() || name.chars().count() >= MAX_NAME_LEN {
            continue;
        }
        let key = name.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        clean.push(name.to_string());
    }

    clean
}

/// Text service wrapper that records call outcomes
pub struct MeteredTextService<S> {
    inner: S,
    metrics: TextServiceMetrics,
}

impl<S: TextService> MeteredTextService<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            metrics: TextServiceMetrics::new(),
        }
    }

    pub async fn metrics(&self) -> TextServiceMetricsSnapshot {
        self.metrics.snapshot().await
    }

    async fn record<T>(&self, operation: &str, started: Instant, result: &Result<T>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => self.metrics.record_success(duration).await,
            Err(e) => {
                debug!("Text service {} failed after {:?}: {}", operation, duration, e);
                self.metrics.record_failure(duration, e).await;
            }
        }
    }
}

#[async_trait]
impl<S: TextService> TextService for MeteredTextService<S> {
    async fn list_related_names(&self, excluding: &[String], count: usize) -> Result<Vec<String>> {
        let started = Instant::now();
        let result = self.inner.list_related_names(excluding, count).await;
        self.record("list_related_names", started, &result).await;
        result
    }

    async fn describe_outage(&self, service_name: &str) -> Result<String> {
        let started = Instant::now();
        let result = self.inner.describe_outage(service_name).await;
        self.record("describe_outage", started, &result).await;
        result
    }

    async fn summarize_global_outages(&self) -> Result<RawSummary> {
        let started = Instant::now();
        let result = self.inner.summarize_global_outages().await;
        self.record("summarize_global_outages", started, &result).await;
        result
    }
}

#[derive(Debug, Default)]
struct Counters {
    attempts: u64,
    successes: u64,
    failures: u64,
    rate_limited: u64,
    total_duration: Duration,
}

#[derive(Debug)]
struct TextServiceMetrics {
    counters: RwLock<Counters>,
}

impl TextServiceMetrics {
    fn new() -> Self {
        Self {
            counters: RwLock::new(Counters::default()),
        }
    }

    async fn record_success(&self, duration: Duration) {
        let mut counters = self.counters.write().await;
        counters.attempts += 1;
        counters.successes += 1;
        counters.total_duration += duration;
    }

    async fn record_failure(&self, duration: Duration, error: &DashboardError) {
        let mut counters = self.counters.write().await;
        counters.attempts += 1;
        counters.failures += 1;
        if error.is_rate_limited() {
            counters.rate_limited += 1;
        }
        counters.total_duration += duration;
    }

    async fn snapshot(&self) -> TextServiceMetricsSnapshot {
        let counters = self.counters.read().await;

        let success_rate = if counters.attempts > 0 {
            (counters.successes as f64 / counters.attempts as f64) * 100.0
        } else {
            0.0
        };

        let avg_duration = if counters.attempts > 0 {
            counters.total_duration / counters.attempts as u32
        } else {
            Duration::ZERO
        };

        TextServiceMetricsSnapshot {
            attempts: counters.attempts,
            successes: counters.successes,
            failures: counters.failures,
            rate_limited: counters.rate_limited,
            success_rate,
            avg_duration_ms: avg_duration.as_millis() as u64,
        }
    }
}

/// Snapshot of text service metrics
#[derive(Debug, Clone)]
pub struct TextServiceMetricsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub rate_limited: u64,
    pub success_rate: f64,
    pub avg_duration_ms: u64,
}
