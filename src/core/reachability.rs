use super::errors::RaccoonError;
use crate::config::ReachabilityConfig;
use crate::executors::command::execute;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// `Ok(false)` means the host did not answer; only an interrupt is an error.
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_reachable(&self, target: &str) -> Result<bool, RaccoonError>;
}

/// ICMP echo through the system `ping`.
pub struct PingCheck {
    config: ReachabilityConfig,
    cancel: CancellationToken,
}

impl PingCheck {
    pub fn new(config: ReachabilityConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    fn args(&self, target: &str) -> Vec<String> {
        vec![
            "-c".to_string(),
            self.config.count.to_string(),
            "-W".to_string(),
            self.config.wait_secs.to_string(),
            target.to_string(),
        ]
    }
}

#[async_trait]
impl Reachability for PingCheck {
    async fn is_reachable(&self, target: &str) -> Result<bool, RaccoonError> {
        let args = self.args(target);
        match execute(&self.config.command, &args, Some(self.config.timeout_ms), &self.cancel).await {
            Ok(_) => Ok(true),
            Err(RaccoonError::Cancelled) => Err(RaccoonError::Cancelled),
            Err(e) => {
                tracing::debug!("Reachability check for {} failed: {}", target, e);
                Ok(false)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn check_with(command: &str, cancel: CancellationToken) -> PingCheck {
        let config = ReachabilityConfig {
            command: command.to_string(),
            ..Default::default()
        };
        PingCheck::new(config, cancel)
    }

    fn check(command: &str) -> PingCheck {
        check_with(command, CancellationToken::new())
    }

    #[test]
    fn builds_ping_arguments() {
        assert_eq!(check("ping").args("10.0.0.1"), vec!["-c", "1", "-W", "1", "10.0.0.1"]);
    }

    #[tokio::test]
    async fn successful_exit_means_reachable() {
        assert!(check("true").is_reachable("10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn failed_exit_means_unreachable() {
        assert!(!check("false").is_reachable("10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn missing_binary_means_unreachable() {
        assert!(!check("no-such-ping-binary").is_reachable("10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn interrupt_is_not_reported_as_unreachable() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = check_with("true", cancel).is_reachable("10.0.0.1").await.unwrap_err();
        assert!(matches!(err, RaccoonError::Cancelled));
    }
}
