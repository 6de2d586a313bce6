use super::detector::ServiceDetector;
use super::errors::RaccoonError;
use super::events::Event;
use super::models::{ScanResult, ScanType, Tool};
use super::reachability::Reachability;
use super::state::RunState;
use super::strategy::{Probe, Strategy};
use crate::config::SmtpEnumConfig;
use crate::executors::runner::ToolRunner;
use crate::executors::toolchain::ToolRegistry;
use crate::reporters::writer;
use crate::storage::OutputStore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Resolves a scan type to its strategy and runs it after the precondition
/// checks.
pub struct Scanner {
    runner: Arc<dyn ToolRunner>,
    reachability: Arc<dyn Reachability>,
    registry: Arc<ToolRegistry>,
    smtp: SmtpEnumConfig,
    events: Option<mpsc::UnboundedSender<Event>>,
}

/// Per-dispatch context threaded through the strategy steps.
struct Dispatch<'a> {
    target: &'a str,
    state: RunState,
    store: OutputStore,
    detector: ServiceDetector<'a>,
}

impl Scanner {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        reachability: Arc<dyn Reachability>,
        registry: Arc<ToolRegistry>,
        smtp: SmtpEnumConfig,
    ) -> Self {
        Self {
            runner,
            reachability,
            registry,
            smtp,
            events: None,
        }
    }

    /// Mirror every event to a UI consumer.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<Event>) -> Self {
        self.events = Some(sender);
        self
    }

    pub async fn run_scan(
        &self,
        scan_type: ScanType,
        target: &str,
        output_dir: Option<&Path>,
    ) -> Result<RunState, RaccoonError> {
        validate_target(target)?;

        if !self.reachability.is_reachable(target).await? {
            tracing::error!("Target {} is not reachable.", target);
            return Err(RaccoonError::Unreachable(target.to_string()));
        }

        if self.registry.is_empty() {
            tracing::error!("No scanning tools available. Please install the necessary tools.");
            return Err(RaccoonError::NoTools);
        }

        let store = OutputStore::new(output_dir.map(Path::to_path_buf));
        store.prepare()?;

        tracing::info!(
            "Scan type {} initiated on {} with output directory: {:?}",
            scan_type,
            target,
            output_dir
        );

        let mut dispatch = Dispatch {
            target,
            state: RunState::new(target, scan_type),
            store,
            detector: ServiceDetector::new(self.runner.as_ref(), self.registry.is_available(Tool::Nmap)),
        };

        self.run_strategy(Strategy::Passive, &mut dispatch).await?;
        self.run_strategy(Strategy::from(scan_type), &mut dispatch).await?;

        let Dispatch { mut state, store, .. } = dispatch;
        state.finish();

        if let Some(dir) = store.dir() {
            match writer::write_scan_record(&state, dir) {
                Ok(path) => tracing::info!("Scan record written to {}", path.display()),
                Err(e) => tracing::error!("Failed to write scan record: {:#}", e),
            }
        }

        tracing::info!(
            "Scan {} on {} finished: {} tools run, {} failed, {} skipped",
            state.scan_id,
            target,
            state.results.len(),
            state.failed_count(),
            state.skipped.len()
        );
        Ok(state)
    }

    /// Unconditional probes first, then each escalation whose service was
    /// detected. Only cancellation aborts the sequence.
    async fn run_strategy(&self, strategy: Strategy, dispatch: &mut Dispatch<'_>) -> Result<(), RaccoonError> {
        self.emit(
            &mut dispatch.state,
            Event::ScanStarted {
                target: dispatch.target.to_string(),
                strategy: strategy.name(),
            },
        );

        for probe in strategy.probes(dispatch.target) {
            self.run_probe(&probe, dispatch).await?;
        }

        for escalation in strategy.escalations(dispatch.target, &self.smtp) {
            let present = dispatch.detector.detect(dispatch.target, &escalation.service).await;
            self.emit(&mut dispatch.state, Event::ServiceChecked(escalation.service, present));
            if present {
                self.run_probe(&escalation.probe, dispatch).await?;
            }
        }

        Ok(())
    }

    async fn run_probe(&self, probe: &Probe, dispatch: &mut Dispatch<'_>) -> Result<(), RaccoonError> {
        if !self.registry.is_available(probe.tool) {
            self.emit(&mut dispatch.state, Event::ToolSkipped(probe.tool));
            return Ok(());
        }

        self.emit(&mut dispatch.state, Event::ToolStarted(probe.tool));

        let result = match self.runner.run(probe.tool, &probe.args).await {
            Ok(output) => ScanResult::success(probe.tool, output.stdout),
            Err(RaccoonError::Cancelled) => return Err(RaccoonError::Cancelled),
            Err(e) => {
                let partial = match &e {
                    RaccoonError::Exec(exec) => exec.stdout.clone(),
                    _ => String::new(),
                };
                ScanResult::failure(probe.tool, e.to_string()).with_output(partial)
            }
        };

        if result.succeeded || !result.raw_output.is_empty() {
            dispatch
                .store
                .save(&result.raw_output, &OutputStore::file_name(probe.tool, dispatch.target));
        }

        self.emit(&mut dispatch.state, Event::ToolCompleted(result));
        Ok(())
    }

    fn emit(&self, state: &mut RunState, ev: Event) {
        if let Some(sender) = &self.events {
            let _ = sender.send(ev.clone());
        }
        state.on_event(ev);
    }
}

/// Targets go straight into argument vectors, so refuse anything a tool would
/// parse as an option.
pub fn validate_target(target: &str) -> Result<(), RaccoonError> {
    if target.is_empty() || target.starts_with('-') || target.chars().any(char::is_whitespace) {
        return Err(RaccoonError::InvalidTarget(target.to_string()));
    }
    Ok(())
}
