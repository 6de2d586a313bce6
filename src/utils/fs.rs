use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `content` to `path` through a uniquely named sibling temp file and a
/// rename, creating the parent directory first if needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid path: no parent directory"))?;
    if path.file_name().is_none() {
        anyhow::bail!("Invalid path: no file name: {:?}", path);
    }

    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {:?}", parent))?;

    let mut file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {:?}", parent))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write temp file for {:?}", path))?;
    file.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temp file for {:?}", path))?;

    file.persist(path)
        .with_context(|| format!("Failed to move temp file into {:?}", path))?;

    Ok(())
}
