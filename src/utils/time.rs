use regex::Regex;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-_\.]").expect("valid regex"));

static SCAN_SEQ: AtomicU64 = AtomicU64::new(0);

/// Scan IDs look like `<target>_<YYYYmmddHHMMSSmmm>-<seq>` and double as file
/// name stems. The sequence keeps IDs unique within a process.
pub fn new_scan_id(target: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    let seq = SCAN_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}-{}", sanitize_target(target), timestamp, seq)
}

/// Replace characters that aren't safe for filenames
pub fn sanitize_target(target: &str) -> String {
    UNSAFE_CHARS.replace_all(target, "_").to_string()
}
