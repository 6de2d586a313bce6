use crate::{
    cli::args::{Cli, Command, ScanArgs},
    config::{ConfigLoader, GlobalConfig},
    core::{
        events::Event,
        reachability::PingCheck,
        scanner::{self, Scanner},
        scheduler::{self, Scheduler},
    },
    executors::{runner::ProcessRunner, toolchain::ToolRegistry},
    reporters::writer,
    ui::{printer, progress},
    utils::logging,
};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub async fn run(cli: Cli) -> Result<()> {
    let level = logging::level_from_cli(&cli);
    logging::init(level)?;
    let verbose = cli.verbose || cli.debug;

    let config = ConfigLoader::load_with_custom_path(cli.config.as_deref())?;
    tracing::debug!("Tools pile: {:?}", config.tools_pile);

    match cli.command {
        Command::Target { target } => {
            scanner::validate_target(&target)?;
            println!("{} {}", "Target set to".green(), target.bold());
            Ok(())
        }
        Command::Scan(args) => scan(&config, &args, verbose).await,
        Command::Schedule { file } => schedule(&config, &file, verbose).await,
        Command::Report { scan_id, output } => {
            let (path, rendered) = writer::generate_report(&output, &scan_id)?;
            println!("{}", rendered);
            println!("{} {}", "Report written to".green(), path.display());
            Ok(())
        }
        Command::Tools => {
            let registry = ToolRegistry::discover(&config.tools_pile, &config.tools);
            println!("{}", printer::tools_table(registry.statuses()));
            if registry.is_empty() {
                println!(
                    "{}",
                    "No usable tools: list installed tools in tools_pile or RACCOON_TOOLS_PILE".yellow()
                );
            }
            Ok(())
        }
        Command::Config => {
            print!("{}", ConfigLoader::default_template()?);
            Ok(())
        }
    }
}

/// Ctrl-C trips the token shared by every spawned tool.
fn cancellation_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trip = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping running tools");
            trip.cancel();
        }
    });
    token
}

fn build_scanner(
    config: &GlobalConfig,
    cancel: &CancellationToken,
    events: mpsc::UnboundedSender<Event>,
) -> Scanner {
    let registry = ToolRegistry::discover(&config.tools_pile, &config.tools);
    tracing::info!("Usable tools: {:?}", registry.usable());

    Scanner::new(
        Arc::new(ProcessRunner::new(config.tools.clone(), cancel.clone())),
        Arc::new(PingCheck::new(config.reachability.clone(), cancel.clone())),
        Arc::new(registry),
        config.smtp_enum.clone(),
    )
    .with_events(events)
}

async fn scan(config: &GlobalConfig, args: &ScanArgs, verbose: bool) -> Result<()> {
    let (scan_type, target) = args.resolve().map_err(anyhow::Error::msg)?;
    let cancel = cancellation_token();
    let (tx, rx) = mpsc::unbounded_channel();
    let printer_task = printer::spawn_event_printer(rx, verbose, ProgressBar::hidden());

    let scanner = build_scanner(config, &cancel, tx);
    let result = scanner
        .run_scan(scan_type, &target, args.output.as_deref())
        .await;
    drop(scanner);
    let _ = printer_task.await;

    let state = result.with_context(|| format!("{} scan of {} failed", scan_type, target))?;
    printer::print_summary(&state);
    if let Some(dir) = &args.output {
        println!(
            "{} {}",
            "Output written to".green().dimmed(),
            dir.display().to_string().dimmed()
        );
    }
    Ok(())
}

async fn schedule(config: &GlobalConfig, file: &Path, verbose: bool) -> Result<()> {
    let jobs = scheduler::load_jobs(file)?;
    if jobs.is_empty() {
        println!("{}", "Schedule file has no jobs".yellow());
        return Ok(());
    }

    let cancel = cancellation_token();
    let bar = progress::batch_bar(jobs.len());
    let (tx, rx) = mpsc::unbounded_channel();
    let printer_task = printer::spawn_event_printer(rx, verbose, bar.clone());

    let scanner = Arc::new(build_scanner(config, &cancel, tx));
    let summary = Scheduler::new(scanner, cancel)
        .with_max_parallel(config.scheduler.max_parallel_jobs)
        .with_job_timeout(config.scheduler.job_timeout_secs.map(Duration::from_secs))
        .with_progress(bar)
        .schedule(jobs)
        .await;
    let _ = printer_task.await;

    printer::print_batch_summary(&summary);
    Ok(())
}
