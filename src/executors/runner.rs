use super::command::{CommandResult, execute};
use crate::config::ToolsConfig;
use crate::core::errors::RaccoonError;
use crate::core::models::Tool;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Seam between the strategies and the external processes they drive.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, tool: Tool, args: &[String]) -> Result<CommandResult, RaccoonError>;
}

/// Spawns the configured binary for each tool.
pub struct ProcessRunner {
    tools: ToolsConfig,
    cancel: CancellationToken,
}

impl ProcessRunner {
    pub fn new(tools: ToolsConfig, cancel: CancellationToken) -> Self {
        Self { tools, cancel }
    }

    fn argv(&self, tool: Tool, args: &[String]) -> Vec<String> {
        // Validated at config load; a bad value here only drops the extras.
        let mut argv = self.tools.extra_args(tool).unwrap_or_else(|e| {
            tracing::warn!("{:#}", e);
            Vec::new()
        });
        argv.extend_from_slice(args);
        argv
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, tool: Tool, args: &[String]) -> Result<CommandResult, RaccoonError> {
        let argv = self.argv(tool, args);
        let command = self.tools.command(tool);
        let timeout = Some(self.tools.timeout_ms(tool));
        execute(command, &argv, timeout, &self.cancel).await
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use crate::core::errors::ExecError;
    use std::sync::Mutex;
    use std::time::Duration;

    type Responder = Box<dyn Fn(Tool, &[String]) -> Result<String, String> + Send + Sync>;

    /// Records every invocation and answers from a closure instead of spawning.
    pub struct RecordingRunner {
        calls: Mutex<Vec<(Tool, Vec<String>)>>,
        respond: Responder,
        latency: Duration,
        failure_stdout: &'static str,
    }

    impl RecordingRunner {
        pub fn new<F>(respond: F) -> Self
        where
            F: Fn(Tool, &[String]) -> Result<String, String> + Send + Sync + 'static,
        {
            Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
                latency: Duration::ZERO,
                failure_stdout: "",
            }
        }

        /// Every tool succeeds; the version probe reports `services`.
        pub fn with_services(services: &'static str) -> Self {
            Self::new(move |tool, args| {
                if is_detection_probe(tool, args) {
                    Ok(services.to_string())
                } else {
                    Ok(canned_output(tool, args))
                }
            })
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        /// Failing tools still print `stdout`, like a scanner that exits 1 after reporting.
        pub fn with_failure_output(mut self, stdout: &'static str) -> Self {
            self.failure_stdout = stdout;
            self
        }

        pub fn calls(&self) -> Vec<(Tool, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn tools_called(&self) -> Vec<Tool> {
            self.calls().into_iter().map(|(tool, _)| tool).collect()
        }

        pub fn detection_probes(&self) -> usize {
            self.calls()
                .iter()
                .filter(|(tool, args)| is_detection_probe(*tool, args))
                .count()
        }
    }

    /// `nmap -sV <target>` is what the detector sends.
    pub fn is_detection_probe(tool: Tool, args: &[String]) -> bool {
        tool == Tool::Nmap && args.len() == 2 && args[0] == "-sV"
    }

    pub fn canned_output(tool: Tool, args: &[String]) -> String {
        format!("{} {}\n", tool.name(), args.join(" "))
    }

    #[async_trait]
    impl ToolRunner for RecordingRunner {
        async fn run(&self, tool: Tool, args: &[String]) -> Result<CommandResult, RaccoonError> {
            self.calls.lock().unwrap().push((tool, args.to_vec()));
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            match (self.respond)(tool, args) {
                Ok(stdout) => Ok(CommandResult {
                    stdout,
                    stderr: String::new(),
                    exit_code: 0,
                    duration_ms: 0,
                }),
                Err(stderr_tail) => Err(RaccoonError::Exec(ExecError {
                    tool: tool.name().to_string(),
                    args: args.to_vec(),
                    exit_code: Some(1),
                    stderr_tail,
                    stdout: self.failure_stdout.to_string(),
                    duration_ms: 0,
                })),
            }
        }
    }
}
