use super::{
    events::Event,
    models::{ScanResult, ScanType},
};
use crate::utils::time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCheck {
    pub service: String,
    pub present: bool,
}

/// Everything one dispatch produced. Persisted as the scan record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub scan_id: String,
    pub target: String,
    pub scan_type: ScanType,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub tools_started: usize,
    pub results: Vec<ScanResult>,
    pub skipped: Vec<String>,
    pub services: Vec<ServiceCheck>,
}

impl RunState {
    pub fn new(target: &str, scan_type: ScanType) -> Self {
        Self {
            scan_id: time::new_scan_id(target),
            target: target.to_string(),
            scan_type,
            started_at: Utc::now(),
            finished_at: None,
            tools_started: 0,
            results: vec![],
            skipped: vec![],
            services: vec![],
        }
    }

    pub fn on_event(&mut self, ev: Event) {
        match ev {
            Event::ScanStarted { target, strategy } => {
                tracing::info!("Starting {} strategy on {}", strategy, target);
            }
            Event::ToolStarted(tool) => {
                tracing::info!("Tool started: {} on {}", tool, self.target);
                self.tools_started += 1;
            }
            Event::ToolCompleted(result) => {
                if result.succeeded {
                    tracing::info!("Tool completed: {} on {}", result.tool_name, self.target);
                } else {
                    tracing::error!(
                        "Tool failed: {} on {}: {}",
                        result.tool_name,
                        self.target,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                self.results.push(result);
            }
            Event::ToolSkipped(tool) => {
                tracing::warn!("Tool skipped, not available: {}", tool);
                self.skipped.push(tool.name().to_string());
            }
            Event::ServiceChecked(service, present) => {
                tracing::info!(
                    "Service {} {} on {}",
                    service,
                    if present { "detected" } else { "not detected" },
                    self.target
                );
                self.services.push(ServiceCheck {
                    service: service.to_string(),
                    present,
                });
            }
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Service, Tool};
    use pretty_assertions::assert_eq;

    #[test]
    fn events_are_recorded() {
        let mut state = RunState::new("10.0.0.5", ScanType::Normal);
        state.on_event(Event::ToolStarted(Tool::Nmap));
        state.on_event(Event::ToolCompleted(ScanResult::success(Tool::Nmap, "ok".into())));
        state.on_event(Event::ToolStarted(Tool::Nikto));
        state.on_event(Event::ToolCompleted(ScanResult::failure(Tool::Nikto, "boom".into())));
        state.on_event(Event::ToolSkipped(Tool::Enum4linux));
        state.on_event(Event::ServiceChecked(Service::Http, true));

        assert_eq!(state.tools_started, 2);
        assert_eq!(state.results.len(), 2);
        assert_eq!(state.failed_count(), 1);
        assert_eq!(state.skipped, vec!["enum4linux".to_string()]);
        assert_eq!(
            state.services,
            vec![ServiceCheck {
                service: "http".into(),
                present: true
            }]
        );
    }

    #[test]
    fn finish_sets_timestamp() {
        let mut state = RunState::new("example.com", ScanType::Light);
        assert!(state.finished_at.is_none());
        state.finish();
        assert!(state.finished_at.is_some());
        assert!(state.scan_id.starts_with("example.com_"));
    }
}
