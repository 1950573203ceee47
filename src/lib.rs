//! Simulated Service Status Dashboard Library
//!
//! This library keeps a list of monitored services with simulated health,
//! refreshes it on a timer and on demand, and shows a global outage summary
//! produced by a generative-language API.

pub mod config;
pub mod dashboard;
pub mod errors;
pub mod gemini;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod scheduler;
pub mod summary;
pub mod text_service;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use errors::{DashboardError, Result};
pub use gemini::GeminiClient;
pub use models::{OutageSummary, ServiceRecord, ServiceStatus, SummarySource};
pub use orchestrator::{Coin, StatusOrchestrator, ThreadRngCoin};
pub use summary::SummaryPanel;
pub use text_service::TextService;
