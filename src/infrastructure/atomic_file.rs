use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to a file name while its contents are being written.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Sibling path used while writing `path`: the full file name plus `.tmp`,
/// so `a.json` and `a.csv` never share a temp file.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// Writes to the temp sibling, then renames over `path`.
pub fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let temp = temp_path(path);
    fs::write(&temp, contents).with_context(|| format!("Failed to write temp file {:?}", temp))?;
    fs::rename(&temp, path).with_context(|| format!("Failed to rename {:?} into place", temp))?;
    Ok(())
}
