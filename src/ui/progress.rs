use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Bar for scheduled batches. Hidden when stderr is not a terminal.
pub fn batch_bar(jobs: usize) -> ProgressBar {
    let bar = ProgressBar::new(jobs as u64);
    match ProgressStyle::with_template("{spinner:.blue} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} jobs")
    {
        Ok(style) => bar.set_style(style.progress_chars("█▓░")),
        Err(e) => tracing::debug!("Falling back to default progress style: {}", e),
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
