use super::errors::RaccoonError;
use super::models::{Service, Tool};
use crate::executors::runner::ToolRunner;
use std::collections::HashMap;

/// Answers "is service X present on target" from an `nmap -sV` transcript.
///
/// One detector lives for one dispatch. The first successful probe per target
/// is cached, so several escalation checks share a single probe. Failed probes
/// are not cached.
pub struct ServiceDetector<'a> {
    runner: &'a dyn ToolRunner,
    probe_available: bool,
    cache: HashMap<String, String>,
}

impl<'a> ServiceDetector<'a> {
    pub fn new(runner: &'a dyn ToolRunner, probe_available: bool) -> Self {
        Self {
            runner,
            probe_available,
            cache: HashMap::new(),
        }
    }

    /// Fail-closed: any probe error means "not present".
    pub async fn detect(&mut self, target: &str, service: &Service) -> bool {
        match self.probe(target).await {
            Ok(output) => service.matches(output),
            Err(e) => {
                tracing::error!("Error detecting service {} on {}: {}", service, target, e);
                false
            }
        }
    }

    async fn probe(&mut self, target: &str) -> Result<&str, RaccoonError> {
        if !self.cache.contains_key(target) {
            if !self.probe_available {
                return Err(RaccoonError::ToolUnavailable(Tool::Nmap.name().to_string()));
            }
            let args = vec!["-sV".to_string(), target.to_string()];
            let result = self.runner.run(Tool::Nmap, &args).await?;
            self.cache.insert(target.to_string(), result.stdout);
        }
        Ok(self.cache.get(target).map(String::as_str).unwrap_or_default())
    }
}
