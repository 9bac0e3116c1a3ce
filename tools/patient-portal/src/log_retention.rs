use crate::errors::PortalError;
use std::fs;
use std::path::{Path, PathBuf};

/// Deletes the oldest log files in `dir` until the directory fits in
/// `budget_bytes`. The active log is never removed.
pub fn enforce_total_budget(
    dir: &Path,
    budget_bytes: u64,
    active: &Path,
) -> Result<Vec<PathBuf>, PortalError> {
    let mut files = fs::read_dir(dir)
        .map_err(|e| PortalError::Io(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
        .collect::<Vec<_>>();

    let total = files
        .iter()
        .filter_map(|path| fs::metadata(path).ok().map(|meta| meta.len()))
        .sum::<u64>();
    if total <= budget_bytes {
        return Ok(Vec::new());
    }

    files.retain(|path| path != active);
    files.sort_by_key(|path| fs::metadata(path).ok().and_then(|m| m.modified().ok()));

    let mut remaining = total;
    let mut deleted = Vec::new();
    for path in files {
        if remaining <= budget_bytes {
            break;
        }
        let len = fs::metadata(&path)
            .map_err(|e| PortalError::Io(e.to_string()))?
            .len();
        fs::remove_file(&path).map_err(|e| PortalError::Io(e.to_string()))?;
        remaining = remaining.saturating_sub(len);
        deleted.push(path);
    }

    Ok(deleted)
}
