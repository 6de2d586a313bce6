use super::models::{ScanResult, Service, Tool};

#[derive(Debug, Clone)]
pub enum Event {
    ScanStarted { target: String, strategy: &'static str },
    ToolStarted(Tool),
    ToolCompleted(ScanResult),
    ToolSkipped(Tool),
    ServiceChecked(Service, bool),
}
