use crate::config::ToolsConfig;
use crate::core::models::Tool;
use std::collections::HashSet;
use std::path::PathBuf;
use which::which;

#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub tool: Tool,
    pub command: String,
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

/// The enabled tools pile intersected with what is installed.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    enabled: Vec<Tool>,
    installed: HashSet<Tool>,
    statuses: Vec<ToolStatus>,
}

impl ToolRegistry {
    /// Resolve the pile against PATH.
    pub fn discover(pile: &[String], tools: &ToolsConfig) -> Self {
        let enabled = resolve_pile(pile);
        let mut installed = HashSet::new();
        let mut statuses = Vec::new();

        for tool in Tool::ALL {
            let command = tools.command(tool).to_string();
            let path = match which(&command) {
                Ok(path) => {
                    tracing::debug!("Found {}: {:?}", command, path);
                    installed.insert(tool);
                    Some(path)
                }
                Err(_) => None,
            };
            statuses.push(ToolStatus {
                tool,
                command,
                enabled: enabled.contains(&tool),
                path,
            });
        }

        let registry = Self {
            enabled,
            installed,
            statuses,
        };
        tracing::info!(
            "Tool registry: {} enabled, {} usable",
            registry.enabled.len(),
            registry.usable().len()
        );
        registry
    }

    /// Build a registry without touching PATH.
    pub fn from_parts(pile: &[String], installed: impl IntoIterator<Item = Tool>) -> Self {
        Self {
            enabled: resolve_pile(pile),
            installed: installed.into_iter().collect(),
            statuses: Vec::new(),
        }
    }

    /// No recognised tool is enabled.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    pub fn is_available(&self, tool: Tool) -> bool {
        self.enabled.contains(&tool) && self.installed.contains(&tool)
    }

    pub fn usable(&self) -> Vec<Tool> {
        self.enabled
            .iter()
            .copied()
            .filter(|tool| self.installed.contains(tool))
            .collect()
    }

    pub fn statuses(&self) -> &[ToolStatus] {
        &self.statuses
    }
}

fn resolve_pile(pile: &[String]) -> Vec<Tool> {
    let mut enabled = Vec::new();
    for name in pile {
        match Tool::from_name(name) {
            Some(tool) if !enabled.contains(&tool) => enabled.push(tool),
            Some(_) => {}
            None => tracing::warn!("Unknown tool in tools_pile: {}", name),
        }
    }
    enabled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pile(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_pile_is_empty() {
        let registry = ToolRegistry::from_parts(&[], Tool::ALL);
        assert!(registry.is_empty());
        assert!(!registry.is_available(Tool::Nmap));
    }

    #[test]
    fn unknown_names_do_not_count() {
        let registry = ToolRegistry::from_parts(&pile(&["masscan", "zmap"]), Tool::ALL);
        assert!(registry.is_empty());
    }

    #[test]
    fn available_requires_enabled_and_installed() {
        let registry = ToolRegistry::from_parts(&pile(&["nmap", "nikto"]), [Tool::Nmap, Tool::WhatWeb]);
        assert!(!registry.is_empty());
        assert!(registry.is_available(Tool::Nmap));
        assert!(!registry.is_available(Tool::Nikto));
        assert!(!registry.is_available(Tool::WhatWeb));
        assert_eq!(registry.usable(), vec![Tool::Nmap]);
    }

    #[test]
    fn duplicates_and_aliases_collapse() {
        let registry =
            ToolRegistry::from_parts(&pile(&["theHarvester", "theharvester", "smtp-user-enum"]), Tool::ALL);
        assert_eq!(registry.usable(), vec![Tool::TheHarvester, Tool::SmtpEnum]);
    }

    #[test]
    fn discover_reports_every_tool() {
        let mut tools = ToolsConfig::default();
        tools.nmap.command = Some("sh".to_string());
        tools.nikto.command = Some("definitely-not-installed-xyz".to_string());
        let registry = ToolRegistry::discover(&pile(&["nmap", "nikto"]), &tools);

        assert_eq!(registry.statuses().len(), Tool::ALL.len());
        assert!(registry.is_available(Tool::Nmap));
        assert!(!registry.is_available(Tool::Nikto));
        let nikto = registry
            .statuses()
            .iter()
            .find(|s| s.tool == Tool::Nikto)
            .unwrap();
        assert!(nikto.enabled);
        assert!(nikto.path.is_none());
    }
}
