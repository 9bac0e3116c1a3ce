use crate::errors::PortalError;
use crate::logging::{DEFAULT_DISK_BUDGET_BYTES, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::runtime::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_RANDOM_PATIENTS: u32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub random_patients: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub data: DataConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub users_file: String,
    pub patients_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayConfig {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemoConfig {
    pub random_patients: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                dir: PathBuf::from("data"),
                users_file: "users.json".to_string(),
                patients_file: "patients.json".to_string(),
            },
            display: DisplayConfig {
                title: "Patient Health System".to_string(),
            },
            logging: LoggingConfig {
                enabled: true,
                path: PathBuf::from(".cache/patient-portal/run.jsonl"),
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
                budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            },
            demo: DemoConfig {
                random_patients: 10,
            },
        }
    }
}

/// Absolute locations derived from the config and the process directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub dir: PathBuf,
    pub users: PathBuf,
    pub patients: PathBuf,
    pub log: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialAppConfig {
    data: Option<PartialDataConfig>,
    display: Option<PartialDisplayConfig>,
    logging: Option<PartialLoggingConfig>,
    demo: Option<PartialDemoConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialDataConfig {
    dir: Option<PathBuf>,
    users_file: Option<String>,
    patients_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialDisplayConfig {
    title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    enabled: Option<bool>,
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
    budget_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialDemoConfig {
    random_patients: Option<u32>,
}

pub fn load_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
    fs: &dyn FileSystem,
) -> Result<(AppConfig, DataPaths), PortalError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(&absolutize_path(process_cwd, path))?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| PortalError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;
    let paths = resolve_paths(process_cwd, &cfg);
    Ok((cfg, paths))
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(data) = partial.data {
        if let Some(dir) = data.dir {
            cfg.data.dir = dir;
        }
        if let Some(users_file) = data.users_file {
            cfg.data.users_file = users_file;
        }
        if let Some(patients_file) = data.patients_file {
            cfg.data.patients_file = patients_file;
        }
    }

    if let Some(display) = partial.display {
        if let Some(title) = display.title {
            cfg.display.title = title;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(value) = logging.enabled {
            cfg.logging.enabled = value;
        }
        if let Some(value) = logging.path {
            cfg.logging.path = value;
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
        if let Some(value) = logging.budget_bytes {
            cfg.logging.budget_bytes = value;
        }
    }

    if let Some(demo) = partial.demo {
        if let Some(value) = demo.random_patients {
            cfg.demo.random_patients = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(dir) = &overrides.data_dir {
        cfg.data.dir = dir.clone();
    }
    if let Some(path) = &overrides.log_file {
        cfg.logging.path = path.clone();
        cfg.logging.enabled = true;
    }
    if let Some(count) = overrides.random_patients {
        cfg.demo.random_patients = count;
    }
}

pub fn resolve_paths(process_cwd: &Path, cfg: &AppConfig) -> DataPaths {
    let dir = absolutize_path(process_cwd, &cfg.data.dir);
    DataPaths {
        users: dir.join(&cfg.data.users_file),
        patients: dir.join(&cfg.data.patients_file),
        log: absolutize_path(process_cwd, &cfg.logging.path),
        dir,
    }
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), PortalError> {
    if cfg.display.title.trim().is_empty() {
        return Err(PortalError::InvalidConfig(
            "display.title must not be empty".to_string(),
        ));
    }

    for (key, value) in [
        ("data.users_file", &cfg.data.users_file),
        ("data.patients_file", &cfg.data.patients_file),
    ] {
        if value.trim().is_empty() {
            return Err(PortalError::InvalidConfig(format!("{key} must not be empty")));
        }
    }

    if cfg.data.users_file == cfg.data.patients_file {
        return Err(PortalError::InvalidConfig(
            "data.users_file and data.patients_file must differ".to_string(),
        ));
    }

    if cfg.demo.random_patients > MAX_RANDOM_PATIENTS {
        return Err(PortalError::InvalidConfig(format!(
            "demo.random_patients must be at most {MAX_RANDOM_PATIENTS}"
        )));
    }

    if cfg.logging.max_payload_bytes == 0 {
        return Err(PortalError::InvalidConfig(
            "logging.max_payload_bytes must be greater than zero".to_string(),
        ));
    }

    if cfg.logging.budget_bytes == 0 {
        return Err(PortalError::InvalidConfig(
            "logging.budget_bytes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
