//! Service and summary data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceStatus {
    Operational,
    Outage,
    Checking,
    Unknown,
}

impl ServiceStatus {
    /// Operational becomes Outage, everything else becomes Operational.
    pub fn flipped(self) -> Self {
        match self {
            ServiceStatus::Operational => ServiceStatus::Outage,
            _ => ServiceStatus::Operational,
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Operational => write!(f, "OPERATIONAL"),
            ServiceStatus::Outage => write!(f, "OUTAGE"),
            ServiceStatus::Checking => write!(f, "CHECKING"),
            ServiceStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One monitored entity's current simulated health state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub status: ServiceStatus,
    pub details: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl ServiceRecord {
    pub fn new(name: &str, index: usize, status: ServiceStatus) -> Self {
        Self {
            id: service_id(name, index),
            name: name.to_string(),
            status,
            details: None,
            last_checked: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn checked_now(mut self) -> Self {
        self.last_checked = Some(Utc::now());
        self
    }
}

/// A citation exactly as the text service returned it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl Citation {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            title: Some(title.into()),
        }
    }
}

/// Free text plus citations from the search-augmented summary call.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RawSummary {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// A citation that carries both a URI and a title.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarySource {
    pub uri: String,
    pub title: String,
}

impl TryFrom<Citation> for SummarySource {
    type Error = Citation;

    fn try_from(citation: Citation) -> Result<Self, Self::Error> {
        match (&citation.uri, &citation.title) {
            (Some(uri), Some(title)) if !uri.trim().is_empty() && !title.trim().is_empty() => {
                Ok(SummarySource {
                    uri: uri.trim().to_string(),
                    title: title.trim().to_string(),
                })
            }
            _ => Err(citation),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct OutageSummary {
    pub text: String,
    pub sources: Vec<SummarySource>,
}

/// Stable id for a service: name slug plus discovery index.
pub fn service_id(name: &str, index: usize) -> String {
    let slug = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{}-{}", slug, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_id() {
        assert_eq!(service_id("Office 365", 2), "office-365-2");
        assert_eq!(service_id("  Google   Cloud ", 4), "google-cloud-4");
        assert_ne!(service_id("AWS", 0), service_id("AWS", 1));
    }

    #[test]
    fn test_status_flip() {
        assert_eq!(ServiceStatus::Operational.flipped(), ServiceStatus::Outage);
        assert_eq!(ServiceStatus::Outage.flipped(), ServiceStatus::Operational);
        assert_eq!(ServiceStatus::Unknown.flipped(), ServiceStatus::Operational);
    }

    #[test]
    fn test_citation_requires_uri_and_title() {
        assert!(SummarySource::try_from(Citation::new("https://a.example", "A")).is_ok());
        assert!(
            SummarySource::try_from(Citation {
                uri: Some("https://b.example".to_string()),
                title: None,
            })
            .is_err()
        );
        assert!(SummarySource::try_from(Citation::new("  ", "Blank uri")).is_err());
    }

    #[test]
    fn test_record_creation() {
        let record = ServiceRecord::new("AWS", 0, ServiceStatus::Outage)
            .with_details("Region down")
            .checked_now();

        assert_eq!(record.id, "aws-0");
        assert_eq!(record.details.as_deref(), Some("Region down"));
        assert!(record.last_checked.is_some());
    }
}
