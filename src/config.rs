//! Configuration management for the status dashboard

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Credential for the generative-language API
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Base URL of the generative-language API
    pub gemini_base_url: String,

    /// Model used for every text request
    pub gemini_model: String,

    /// Services that are always monitored
    pub core_services: Vec<String>,

    /// How many extra service names to discover at startup
    pub additional_services: usize,

    /// Period of the background auto-refresh
    pub auto_refresh_interval: Duration,

    /// The summary panel refreshes on every Nth auto-refresh
    pub summary_refresh_modulus: u64,

    /// HTTP timeout for text service requests
    pub http_timeout: Duration,

    /// Chance that a freshly drawn status is operational
    pub operational_probability: f64,

    /// Chance that a background refresh flips a service's status
    pub background_change_probability: f64,

    /// Chance that a single-service refresh flips a known status
    pub single_flip_probability: f64,

    /// Chance that a single-service refresh of an unknown service lands on outage
    pub unknown_outage_probability: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            core_services: vec![
                "AWS".to_string(),
                "Proofpoint".to_string(),
                "Office 365".to_string(),
            ],
            additional_services: 7,
            auto_refresh_interval: Duration::from_secs(360),
            summary_refresh_modulus: 3,
            http_timeout: Duration::from_secs(30),
            operational_probability: 0.85,
            background_change_probability: 0.2,
            single_flip_probability: 0.3,
            unknown_outage_probability: 0.2,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(api_key) = lookup("API_KEY") {
            config.api_key = api_key.trim().to_string();
        }

        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            config.gemini_base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(model) = lookup("GEMINI_MODEL") {
            config.gemini_model = model;
        }

        if let Some(core_services) = lookup("CORE_SERVICES") {
            config.core_services = core_services
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(additional) = lookup("ADDITIONAL_SERVICES") {
            if let Ok(count) = additional.parse() {
                config.additional_services = count;
            }
        }

        if let Some(interval) = lookup("AUTO_REFRESH_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.auto_refresh_interval = Duration::from_secs(seconds);
            }
        }

        if let Some(modulus) = lookup("SUMMARY_REFRESH_MODULUS") {
            if let Ok(modulus) = modulus.parse() {
                config.summary_refresh_modulus = modulus;
            }
        }

        if let Some(timeout) = lookup("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        let probabilities: [(&str, &mut f64); 4] = [
            ("OPERATIONAL_PROBABILITY", &mut config.operational_probability),
            ("BACKGROUND_CHANGE_PROBABILITY", &mut config.background_change_probability),
            ("SINGLE_FLIP_PROBABILITY", &mut config.single_flip_probability),
            ("UNKNOWN_OUTAGE_PROBABILITY", &mut config.unknown_outage_probability),
        ];
        for (key, slot) in probabilities {
            if let Some(value) = lookup(key) {
                if let Ok(p) = value.parse() {
                    *slot = p;
                }
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("API_KEY environment variable not set".to_string());
        }

        if self.gemini_base_url.is_empty() {
            return Err("gemini_base_url cannot be empty".to_string());
        }

        if self.gemini_model.is_empty() {
            return Err("gemini_model cannot be empty".to_string());
        }

        if self.core_services.is_empty() {
            return Err("at least one core service must be specified".to_string());
        }

        if self.auto_refresh_interval.as_secs() == 0 {
            return Err("auto_refresh_interval must be at least one second".to_string());
        }

        if self.summary_refresh_modulus == 0 {
            return Err("summary_refresh_modulus must be greater than 0".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("http_timeout must be greater than 0".to_string());
        }

        let probabilities = [
            ("operational_probability", self.operational_probability),
            ("background_change_probability", self.background_change_probability),
            ("single_flip_probability", self.single_flip_probability),
            ("unknown_outage_probability", self.unknown_outage_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} must be between 0 and 1", name));
            }
        }

        Ok(())
    }
}
