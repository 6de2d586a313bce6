use crate::core::models::Tool;
use crate::utils::{fs::atomic_write, time::sanitize_target};
use std::path::{Path, PathBuf};

/// Raw tool transcripts, one file per tool and target. Without a directory
/// every save is a no-op.
#[derive(Debug, Clone, Default)]
pub struct OutputStore {
    dir: Option<PathBuf>,
}

impl OutputStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Create the directory if one was requested.
    pub fn prepare(&self) -> std::io::Result<()> {
        if let Some(dir) = &self.dir {
            std::fs::create_dir_all(dir)?;
            tracing::debug!("Output directory ready: {}", dir.display());
        }
        Ok(())
    }

    pub fn file_name(tool: Tool, target: &str) -> String {
        format!("{}_{}.txt", tool.name(), sanitize_target(target))
    }

    /// Persist `content`. Failures are logged and swallowed so a full disk
    /// never aborts a scan.
    pub fn save(&self, content: &str, filename: &str) {
        let Some(dir) = &self.dir else {
            return;
        };
        let path = dir.join(filename);
        match atomic_write(&path, content.as_bytes()) {
            Ok(()) => tracing::debug!("Saved output to {}", path.display()),
            Err(e) => tracing::error!("Error saving output to {}: {:#}", filename, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn no_dir_is_a_no_op() {
        let store = OutputStore::new(None);
        store.prepare().unwrap();
        store.save("ignored", "nmap_host.txt");
        assert!(store.dir().is_none());
    }

    #[test]
    fn saves_exact_content() {
        let dir = tempdir().unwrap();
        let store = OutputStore::new(Some(dir.path().join("out")));
        store.prepare().unwrap();
        store.prepare().unwrap();

        let raw = "Starting Nmap\n80/tcp open http\n\n";
        store.save(raw, &OutputStore::file_name(Tool::Nmap, "10.0.0.1"));

        let saved = std::fs::read_to_string(dir.path().join("out").join("nmap_10.0.0.1.txt")).unwrap();
        assert_eq!(saved, raw);
    }

    #[test]
    fn write_failure_is_swallowed() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let store = OutputStore::new(Some(blocker));
        store.save("data", "nikto_host.txt");
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(OutputStore::file_name(Tool::SmtpEnum, "mail.example.com"), "smtp_enum_mail.example.com.txt");
        assert_eq!(OutputStore::file_name(Tool::Nikto, "fe80::1"), "nikto_fe80__1.txt");
    }
}
