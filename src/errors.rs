//! Error types for the status dashboard

use std::fmt;

pub type Result<T> = std::result::Result<T, DashboardError>;

/// User-facing text shown whenever the text service reports rate limiting.
pub const RATE_LIMIT_MESSAGE: &str = "API Rate Limit Exceeded: Too many requests. Please wait a few minutes before trying again or refresh less frequently.";

#[derive(Debug)]
pub enum DashboardError {
    /// Missing or invalid configuration, fatal at startup
    Configuration(String),

    /// The text service refused the request because of quota or rate limits
    RateLimited,

    /// The credential was rejected by the text service
    Auth(String),

    /// Any other text service failure, with context
    Generic(String),

    /// `Dashboard::start` was called on a running dashboard
    AlreadyStarted,

    /// HTTP client failure outside of a request (e.g. client construction)
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// IO operation failed
    Io(std::io::Error),
}

impl DashboardError {
    /// Classify a failed text service call from its HTTP status and error text.
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let lowered = message.to_lowercase();

        if status == Some(429)
            || lowered.contains("429")
            || lowered.contains("resource_exhausted")
            || lowered.contains("rate limit")
        {
            return DashboardError::RateLimited;
        }

        if matches!(status, Some(401) | Some(403))
            || lowered.contains("api key not valid")
            || lowered.contains("permission denied")
        {
            return DashboardError::Auth(message.to_string());
        }

        DashboardError::Generic(message.to_string())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DashboardError::RateLimited)
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            DashboardError::RateLimited => f.write_str(RATE_LIMIT_MESSAGE),
            DashboardError::Auth(msg) => write!(
                f,
                "Gemini API request failed: API key may be invalid or missing permissions. Details: {}",
                msg
            ),
            DashboardError::Generic(msg) => write!(f, "Gemini API request failed: {}", msg),
            DashboardError::AlreadyStarted => f.write_str("Dashboard has already been started"),
            DashboardError::Http(err) => write!(f, "HTTP error: {}", err),
            DashboardError::Json(err) => write!(f, "JSON error: {}", err),
            DashboardError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::Http(err) => Some(err),
            DashboardError::Json(err) => Some(err),
            DashboardError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Io(err)
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Http(err)
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Json(err)
    }
}
