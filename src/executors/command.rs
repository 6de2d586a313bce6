use crate::core::errors::{ExecError, RaccoonError};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u128,
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Run `tool` with an argument vector. No shell is involved, so targets and
/// options are passed through verbatim.
pub async fn execute(
    tool: &str,
    args: &[String],
    timeout_ms: Option<u64>,
    cancel: &CancellationToken,
) -> Result<CommandResult, RaccoonError> {
    let start = Instant::now();
    tracing::debug!("Executing: {} {:?}", tool, args);

    if cancel.is_cancelled() {
        return Err(RaccoonError::Cancelled);
    }

    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            RaccoonError::Exec(exec_error(tool, args, None, format!("Failed to spawn {}: {}", tool, e), start))
        })?;

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let deadline = async {
        match timeout_ms {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending::<()>().await,
        }
    };

    // Killing the child closes its pipes, which lets both readers finish.
    let (stdout, stderr, outcome) = tokio::join!(
        read_all(stdout_handle),
        read_all(stderr_handle),
        async {
            tokio::select! {
                status = child.wait() => Outcome::Exited(status),
                _ = deadline => {
                    let _ = child.kill().await;
                    Outcome::TimedOut
                }
                _ = cancel.cancelled() => {
                    let _ = child.kill().await;
                    Outcome::Cancelled
                }
            }
        }
    );

    let status = match outcome {
        Outcome::Exited(Ok(status)) => status,
        Outcome::Exited(Err(e)) => {
            let msg = format!("Process error: {}", e);
            return Err(RaccoonError::Exec(exec_error(tool, args, None, msg, start)));
        }
        Outcome::TimedOut => {
            let msg = format!("Command timed out after {}ms", timeout_ms.unwrap_or_default());
            return Err(RaccoonError::Exec(exec_error(tool, args, None, msg, start)));
        }
        Outcome::Cancelled => return Err(RaccoonError::Cancelled),
    };

    let exit_code = status.code().unwrap_or(-1);
    if !status.success() {
        // The tool may have reported before failing.
        return Err(RaccoonError::Exec(ExecError {
            stdout,
            ..exec_error(tool, args, Some(exit_code), tail(&stderr, 10), start)
        }));
    }

    Ok(CommandResult {
        stdout,
        stderr,
        exit_code,
        duration_ms: start.elapsed().as_millis(),
    })
}

async fn read_all<R>(reader: Option<R>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        if let Err(e) = reader.read_to_end(&mut buf).await {
            tracing::debug!("Failed reading child output: {}", e);
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

fn exec_error(
    tool: &str,
    args: &[String],
    exit_code: Option<i32>,
    stderr_tail: String,
    start: Instant,
) -> ExecError {
    ExecError {
        tool: tool.to_string(),
        args: args.to_vec(),
        exit_code,
        stderr_tail,
        stdout: String::new(),
        duration_ms: start.elapsed().as_millis(),
    }
}
