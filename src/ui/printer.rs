use crate::core::events::Event;
use crate::core::scheduler::BatchSummary;
use crate::core::state::RunState;
use crate::executors::toolchain::ToolStatus;
use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::ProgressBar;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

/// One status line per event. Raw tool output only when verbose.
pub fn format_event(event: &Event, verbose: bool) -> Option<String> {
    let line = match event {
        Event::ScanStarted { target, strategy } => {
            format!("{} {} scan on {}", "→".cyan(), strategy.bold(), target.bold())
        }
        Event::ToolStarted(tool) => format!("  {} running {}", "•".blue(), tool.name()),
        Event::ToolCompleted(result) if result.succeeded => {
            let mut line = format!("  {} {} completed", "✓".green(), result.tool_name.green().bold());
            if verbose && !result.raw_output.trim().is_empty() {
                line.push('\n');
                line.push_str(result.raw_output.trim_end());
            }
            line
        }
        Event::ToolCompleted(result) => format!(
            "  {} {} failed: {}",
            "✗".red(),
            result.tool_name.red().bold(),
            result.error.as_deref().unwrap_or("unknown error")
        ),
        Event::ToolSkipped(tool) => {
            format!("  {} {} skipped (not available)", "-".yellow(), tool.name().yellow())
        }
        Event::ServiceChecked(service, true) => {
            format!("  {} {} detected", "✓".green(), service.to_string().cyan())
        }
        Event::ServiceChecked(service, false) => {
            if !verbose {
                return None;
            }
            format!("  {} {} not detected", "·".dimmed(), service)
        }
    };
    Some(line)
}

/// A drawing bar owns the terminal; lines go above it instead of through it.
fn prints_through_bar(bar: &ProgressBar) -> bool {
    !bar.is_hidden() && !bar.is_finished()
}

/// Drain dispatcher events until every sender is dropped. Pass the active
/// batch bar, or `ProgressBar::hidden()` when there is none.
pub fn spawn_event_printer(
    mut rx: mpsc::UnboundedReceiver<Event>,
    verbose: bool,
    bar: ProgressBar,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(line) = format_event(&event, verbose) {
                if prints_through_bar(&bar) {
                    bar.println(line);
                } else {
                    println!("{}", line);
                }
            }
        }
    })
}

pub fn print_summary(state: &RunState) {
    println!("\n{}", "Scan complete".green().bold());
    println!("{}: {}", "Target".cyan().bold(), state.target);
    println!("{}: {}", "Scan ID".cyan().bold(), state.scan_id);
    println!("{}: {}", "Type".cyan().bold(), state.scan_type);

    let mut t = table();
    t.set_header(header(&["Tool", "Status", "Detail"]));
    for result in &state.results {
        let status = if result.succeeded {
            Cell::new("✓ Success").fg(Color::Green)
        } else {
            Cell::new("✗ Failed").fg(Color::Red)
        };
        let detail = match &result.error {
            Some(err) => err.clone(),
            None => format!("{} lines", result.raw_output.lines().count()),
        };
        t.add_row(vec![Cell::new(&result.tool_name), status, Cell::new(detail)]);
    }
    for name in &state.skipped {
        t.add_row(vec![
            Cell::new(name),
            Cell::new("- Skipped").fg(Color::Yellow),
            Cell::new("not available"),
        ]);
    }
    println!("{}", t);

    let detected: Vec<&str> = state
        .services
        .iter()
        .filter(|c| c.present)
        .map(|c| c.service.as_str())
        .collect();
    if !detected.is_empty() {
        println!("{}: {}", "Services".yellow().bold(), detected.join(", "));
    }
}

pub fn tools_table(statuses: &[ToolStatus]) -> String {
    let mut t = table();
    t.set_header(header(&["Tool", "Command", "Enabled", "Installed"]));
    for status in statuses {
        let enabled = if status.enabled {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        let installed = match &status.path {
            Some(path) => Cell::new(path.display()).fg(Color::Green),
            None => Cell::new("missing").fg(Color::Red),
        };
        t.add_row(vec![
            Cell::new(status.tool.name()),
            Cell::new(&status.command),
            enabled,
            installed,
        ]);
    }
    t.to_string()
}

pub fn print_batch_summary(summary: &BatchSummary) {
    println!(
        "\n{} {} attempted, {} succeeded, {} failed",
        "Batch complete:".green().bold(),
        summary.attempted,
        summary.succeeded.to_string().green(),
        summary.failures.len().to_string().red()
    );
    for failure in &summary.failures {
        println!(
            "  {} job {} ({}): {}",
            "✗".red(),
            failure.index + 1,
            failure.target,
            failure.error
        );
    }
}
