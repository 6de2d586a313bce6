use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure details for a single external tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecError {
    pub tool: String,
    pub args: Vec<String>,
    pub exit_code: Option<i32>,
    pub stderr_tail: String,
    /// Whatever the tool printed before failing.
    #[serde(default)]
    pub stdout: String,
    pub duration_ms: u128,
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "{} exited with code {}", self.tool, code)?,
            None => write!(f, "{} did not complete", self.tool)?,
        }
        if !self.stderr_tail.is_empty() {
            write!(f, ": {}", self.stderr_tail)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum RaccoonError {
    #[error("target {0} is not reachable")]
    Unreachable(String),

    #[error("no scanning tools available, install the necessary tools and list them in tools_pile")]
    NoTools,

    #[error("invalid target: {0:?}")]
    InvalidTarget(String),

    #[error("tool not available: {0}")]
    ToolUnavailable(String),

    #[error("execution failed: {0}")]
    Exec(ExecError),

    #[error("scan of {target} timed out after {secs}s")]
    Timeout { target: String, secs: u64 },

    #[error("cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
