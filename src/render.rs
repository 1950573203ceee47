//! Plain-text rendering of dashboard snapshots

use crate::dashboard::DashboardSnapshot;
use crate::models::ServiceStatus;
use std::fmt::Write;

/// `360` becomes `6m 0s`.
pub fn format_countdown(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

pub fn render_snapshot(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let board = &snapshot.board;

    let _ = write!(
        out,
        "Core services auto-refresh in: {}",
        format_countdown(snapshot.cycle.countdown_secs)
    );
    if board.is_background_refreshing {
        out.push_str(" (Refreshing core services...)");
    }
    out.push('\n');

    if let Some(error) = board.error.as_ref().filter(|_| !board.is_loading) {
        let _ = writeln!(out, "System Alert: {}", error);
    }

    if board.services.is_empty() {
        if board.is_loading {
            out.push_str("Initializing Mission Control Systems... Please stand by.\n");
        } else {
            out.push_str("No services currently configured for monitoring.\n");
        }
    }

    for service in &board.services {
        let checked = service
            .last_checked
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        let _ = writeln!(
            out,
            "  [{:<11}] {:<24} checked {}",
            service.status.to_string(),
            service.name,
            checked
        );
        if let Some(details) = service.details.as_ref() {
            if service.status != ServiceStatus::Operational {
                let _ = writeln!(out, "                {}", details);
            }
        }
    }

    out.push_str("\nGlobal Outage Scanner\n");
    let summary = &snapshot.summary;
    if summary.is_loading {
        out.push_str("  Scanning...\n");
    } else if let Some(error) = &summary.error {
        let _ = writeln!(out, "  Scanner Error: {}", error);
    } else {
        let _ = writeln!(out, "  {}", summary.summary.text);
        if !summary.summary.sources.is_empty() {
            out.push_str("  Corroborating sources:\n");
            for source in &summary.summary.sources {
                let _ = writeln!(out, "    - {} <{}>", source.title, source.uri);
            }
        }
    }
    if let Some(updated) = summary.last_updated {
        let _ = writeln!(out, "  Scanner last updated: {}", updated.format("%H:%M:%S"));
    }

    out
}

/// Shown instead of the dashboard when the credential is missing.
pub fn render_configuration_error(message: &str) -> String {
    format!(
        "API Key Configuration Error\n\
         \n\
         {}\n\
         \n\
         This application requires a valid API key to function. Set the API_KEY \
         environment variable and restart.\n",
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutageSummary, ServiceRecord, SummarySource};
    use crate::orchestrator::ServiceBoard;
    use crate::scheduler::RefreshCycle;
    use crate::summary::PanelState;
    use std::time::Duration;

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            dashboard_id: "test".to_string(),
            visible: true,
            board: ServiceBoard {
                services: vec![
                    ServiceRecord::new("AWS", 0, ServiceStatus::Operational).checked_now(),
                    ServiceRecord::new("Zoom", 1, ServiceStatus::Outage)
                        .with_details("Media relays are saturated")
                        .checked_now(),
                ],
                is_loading: false,
                is_background_refreshing: true,
                error: Some("API Rate Limit Exceeded".to_string()),
            },
            cycle: RefreshCycle::new(Duration::from_secs(360), 3),
            summary: PanelState {
                summary: OutageSummary {
                    text: "QuantumLink DNS issues.".to_string(),
                    sources: vec![SummarySource {
                        uri: "https://a.example".to_string(),
                        title: "A".to_string(),
                    }],
                },
                ..PanelState::default()
            },
        }
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(360), "6m 0s");
        assert_eq!(format_countdown(59), "0m 59s");
    }

    #[test]
    fn test_render_snapshot() {
        let text = render_snapshot(&snapshot());
        assert!(text.contains("auto-refresh in: 6m 0s (Refreshing core services...)"));
        assert!(text.contains("System Alert: API Rate Limit Exceeded"));
        assert!(text.contains("Media relays are saturated"));
        assert!(text.contains("QuantumLink DNS issues."));
        assert!(text.contains("- A <https://a.example>"));
    }

    #[test]
    fn test_render_scanner_error_hides_text() {
        let mut snapshot = snapshot();
        snapshot.summary.error = Some("Failed to load Global Outage Scanner data.".to_string());
        let text = render_snapshot(&snapshot);
        assert!(text.contains("Scanner Error:"));
        assert!(!text.contains("QuantumLink"));
    }

    #[test]
    fn test_render_configuration_error() {
        let text = render_configuration_error("API_KEY environment variable not set");
        assert!(text.starts_with("API Key Configuration Error"));
        assert!(text.contains("API_KEY environment variable not set"));
    }
}
