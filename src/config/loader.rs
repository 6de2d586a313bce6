use super::types::GlobalConfig;
use crate::core::models::Tool;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATHS: &[&str] = &["./raccoon.toml", "./config/raccoon.toml"];

/// Environment variables holding a JSON array of enabled tools, highest priority first.
const TOOLS_PILE_VARS: &[&str] = &["RACCOON_TOOLS_PILE", "TOOLS_PILE"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, then apply environment overrides.
    pub fn load_with_custom_path(custom_path: Option<&Path>) -> Result<GlobalConfig> {
        let mut config = Self::load_file(custom_path)?;
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Self::validate_config(&config)?;
        Ok(config)
    }

    fn load_file(custom_path: Option<&Path>) -> Result<GlobalConfig> {
        if let Some(path) = custom_path {
            return Self::load_from_file(path)
                .with_context(|| format!("Failed to load config from custom path: {:?}", path));
        }

        for path in Self::candidate_paths() {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from: {:?}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {:#}", path, e);
                        continue;
                    }
                }
            }
        }

        tracing::info!("No configuration file found, using default settings");
        Ok(GlobalConfig::default())
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect();
        if let Some(dirs) = ProjectDirs::from("", "", "raccoon") {
            paths.push(dirs.config_dir().join("raccoon.toml"));
        }
        paths
    }

    fn load_from_file(path: &Path) -> Result<GlobalConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse TOML config: {:?}", path))
    }

    /// The tools pile may come from the environment as a JSON string array.
    pub fn apply_env_overrides<F>(config: &mut GlobalConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in TOOLS_PILE_VARS {
            if let Some(raw) = lookup(key) {
                let pile: Vec<String> = serde_json::from_str(&raw)
                    .with_context(|| format!("{} must be a JSON array of strings", key))?;
                tracing::debug!("Tools pile from {}: {:?}", key, pile);
                config.tools_pile = pile;
                break;
            }
        }
        Ok(())
    }

    fn validate_config(config: &GlobalConfig) -> Result<()> {
        if config.scheduler.max_parallel_jobs == 0 {
            anyhow::bail!("scheduler.max_parallel_jobs must be greater than 0");
        }

        if config.scheduler.job_timeout_secs == Some(0) {
            anyhow::bail!("scheduler.job_timeout_secs must be greater than 0");
        }

        if config.reachability.command.is_empty() {
            anyhow::bail!("reachability.command cannot be empty");
        }

        if config.reachability.timeout_ms == 0 {
            anyhow::bail!("reachability.timeout_ms must be greater than 0");
        }

        for tool in Tool::ALL {
            if config.tools.command(tool).is_empty() {
                anyhow::bail!("{} command cannot be empty", tool);
            }
            if config.tools.timeout_ms(tool) == 0 {
                anyhow::bail!("{} timeout_ms must be greater than 0", tool);
            }
            config.tools.extra_args(tool)?;
        }

        for name in &config.tools_pile {
            if Tool::from_name(name).is_none() {
                tracing::warn!("Unknown tool in tools_pile, ignoring: {}", name);
            }
        }

        Ok(())
    }

    /// Serialize the defaults, handy as a starting point for a config file.
    pub fn default_template() -> Result<String> {
        toml::to_string_pretty(&GlobalConfig::default())
            .context("Failed to serialize configuration to TOML")
    }
}
