use crate::core::state::RunState;
use crate::utils::fs::atomic_write;
use crate::utils::time::sanitize_target;
use anyhow::{Context, Result};
use minijinja::{Environment, context};
use std::path::{Path, PathBuf};

const REPORT_TEMPLATE: &str = r#"Raccoon scan report
===================
Scan ID:   {{ scan_id }}
Target:    {{ target }}
Scan type: {{ scan_type }}
Started:   {{ started_at }}
Finished:  {{ finished_at or "did not finish" }}

Services
--------
{% for check in services -%}
{{ check.service }}: {{ "detected" if check.present else "not detected" }}
{% else -%}
no service checks ran
{% endfor %}
Tools ({{ succeeded }}/{{ results | length }} succeeded)
-----
{% for r in results -%}
[{{ "ok" if r.succeeded else "failed" }}] {{ r.tool_name }}{% if r.error %}: {{ r.error }}{% endif %}
{% endfor -%}
{% if skipped %}
Skipped (not available): {{ skipped | join(", ") }}
{% endif %}"#;

pub fn record_path(dir: &Path, scan_id: &str) -> PathBuf {
    dir.join(format!("scan_{}.json", scan_id))
}

pub fn report_path(dir: &Path, scan_id: &str) -> PathBuf {
    dir.join(format!("report_{}.txt", scan_id))
}

pub fn write_scan_record(state: &RunState, dir: &Path) -> Result<PathBuf> {
    let path = record_path(dir, &state.scan_id);
    let json = serde_json::to_string_pretty(state).context("Failed to serialize scan record")?;
    atomic_write(&path, json.as_bytes())?;
    Ok(path)
}

/// IDs come from the command line and become file names; they may not carry
/// path separators or other characters a generated ID never has.
fn check_scan_id(scan_id: &str) -> Result<()> {
    if scan_id.is_empty() || sanitize_target(scan_id) != scan_id {
        anyhow::bail!("Invalid scan ID: {:?}", scan_id);
    }
    Ok(())
}

pub fn load_scan_record(dir: &Path, scan_id: &str) -> Result<RunState> {
    check_scan_id(scan_id)?;
    let path = record_path(dir, scan_id);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("No scan record for {} at {:?}", scan_id, path))?;
    serde_json::from_str(&content).with_context(|| format!("Corrupt scan record: {:?}", path))
}

pub fn render_report(state: &RunState) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("report", REPORT_TEMPLATE)?;
    let template = env.get_template("report")?;

    let fmt = "%Y-%m-%d %H:%M:%S UTC";
    let rendered = template.render(context! {
        scan_id => &state.scan_id,
        target => &state.target,
        scan_type => state.scan_type.as_str(),
        started_at => state.started_at.format(fmt).to_string(),
        finished_at => state.finished_at.map(|t| t.format(fmt).to_string()),
        services => &state.services,
        results => &state.results,
        succeeded => state.results.len() - state.failed_count(),
        skipped => &state.skipped,
    })?;
    Ok(rendered)
}

/// Render the stored record for `scan_id` and write it next to it.
pub fn generate_report(dir: &Path, scan_id: &str) -> Result<(PathBuf, String)> {
    let state = load_scan_record(dir, scan_id)?;
    let rendered = render_report(&state)?;
    let path = report_path(dir, scan_id);
    atomic_write(&path, rendered.as_bytes())?;
    tracing::info!("Report generated for scan ID {}", scan_id);
    Ok((path, rendered))
}
