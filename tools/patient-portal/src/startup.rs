use crate::config::DataPaths;
use crate::errors::PortalError;
use crate::logging::append_run_log;
use crate::runtime::{FileSystem, Terminal};
use serde_json::json;

pub const EMPTY_STORE: &str = "[]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataFileStatus {
    pub users_created: bool,
    pub patients_created: bool,
}

/// Creates missing store files as empty lists. Existing files are never
/// touched.
pub fn ensure_data_files(
    fs: &dyn FileSystem,
    paths: &DataPaths,
) -> Result<DataFileStatus, PortalError> {
    fs.create_dir_all(&paths.dir)?;
    let mut status = DataFileStatus::default();
    for (path, created) in [
        (&paths.users, &mut status.users_created),
        (&paths.patients, &mut status.patients_created),
    ] {
        if fs.exists(path) {
            continue;
        }
        fs.write_string(path, EMPTY_STORE)?;
        *created = true;
        append_run_log(
            "info",
            "startup.data_file_created",
            json!({ "path": path.display().to_string() }),
        );
    }
    Ok(status)
}

pub fn banner_lines(title: &str) -> Vec<String> {
    let text = format!("  {title}  ");
    let width = text.chars().count();
    vec![
        format!("╔{}╗", "═".repeat(width)),
        format!("║{text}║"),
        format!("╚{}╝", "═".repeat(width)),
        "Starting up...".to_string(),
    ]
}

pub fn print_banner(terminal: &dyn Terminal, title: &str) -> Result<(), PortalError> {
    for line in banner_lines(title) {
        terminal.write_line(&line)?;
    }
    Ok(())
}
