use crate::core::models::Tool;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Enabled tool identifiers. Empty blocks all scanning.
    pub tools_pile: Vec<String>,
    pub reachability: ReachabilityConfig,
    pub scheduler: SchedulerConfig,
    pub smtp_enum: SmtpEnumConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReachabilityConfig {
    pub command: String,
    pub count: u32,
    pub wait_secs: u32,
    pub timeout_ms: u64,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            command: "ping".to_string(),
            count: 1,
            wait_secs: 1,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 1 keeps the batch strictly sequential.
    pub max_parallel_jobs: usize,
    pub job_timeout_secs: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel_jobs: 1,
            job_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmtpEnumConfig {
    pub method: String,
    pub wordlist: String,
}

impl Default for SmtpEnumConfig {
    fn default() -> Self {
        Self {
            method: "VRFY".to_string(),
            wordlist: "/usr/share/wordlists/metasploit/unix_users.txt".to_string(),
        }
    }
}

/// Per-tool overrides. Unset fields fall back to the tool's defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolSettings {
    pub command: Option<String>,
    pub timeout_ms: Option<u64>,
    /// Extra arguments, split shell-style but never run through a shell.
    pub extra_args: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub nmap: ToolSettings,
    pub whatweb: ToolSettings,
    pub sublist3r: ToolSettings,
    pub theharvester: ToolSettings,
    pub nikto: ToolSettings,
    pub enum4linux: ToolSettings,
    pub smtp_enum: ToolSettings,
}

impl ToolsConfig {
    pub fn settings(&self, tool: Tool) -> &ToolSettings {
        match tool {
            Tool::Nmap => &self.nmap,
            Tool::WhatWeb => &self.whatweb,
            Tool::Sublist3r => &self.sublist3r,
            Tool::TheHarvester => &self.theharvester,
            Tool::Nikto => &self.nikto,
            Tool::Enum4linux => &self.enum4linux,
            Tool::SmtpEnum => &self.smtp_enum,
        }
    }

    pub fn command(&self, tool: Tool) -> &str {
        self.settings(tool)
            .command
            .as_deref()
            .unwrap_or_else(|| tool.default_binary())
    }

    pub fn timeout_ms(&self, tool: Tool) -> u64 {
        self.settings(tool)
            .timeout_ms
            .unwrap_or_else(|| default_timeout_ms(tool))
    }

    pub fn extra_args(&self, tool: Tool) -> Result<Vec<String>> {
        match &self.settings(tool).extra_args {
            Some(raw) => shell_words::split(raw)
                .with_context(|| format!("Invalid extra_args for {}: {:?}", tool, raw)),
            None => Ok(vec![]),
        }
    }
}

fn default_timeout_ms(tool: Tool) -> u64 {
    match tool {
        Tool::Nmap => 1_800_000, // full port sweeps are slow
        Tool::Nikto => 600_000,
        _ => 120_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_defaults() {
        let tools = ToolsConfig::default();
        assert_eq!(tools.command(Tool::TheHarvester), "theHarvester");
        assert_eq!(tools.command(Tool::SmtpEnum), "smtp-user-enum");
        assert_eq!(tools.timeout_ms(Tool::Nmap), 1_800_000);
        assert_eq!(tools.timeout_ms(Tool::WhatWeb), 120_000);
        assert!(tools.extra_args(Tool::Nikto).unwrap().is_empty());
    }

    #[test]
    fn extra_args_are_split_without_a_shell() {
        let mut tools = ToolsConfig::default();
        tools.nmap.extra_args = Some(r#"-Pn --script "default and safe""#.to_string());
        assert_eq!(
            tools.extra_args(Tool::Nmap).unwrap(),
            vec!["-Pn", "--script", "default and safe"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_an_error() {
        let mut tools = ToolsConfig::default();
        tools.nikto.extra_args = Some("-Tuning \"1".to_string());
        assert!(tools.extra_args(Tool::Nikto).is_err());
    }
}
