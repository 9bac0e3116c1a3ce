pub mod config;
pub mod demo;
pub mod errors;
pub mod flow;
pub mod graph;
pub mod handlers;
pub mod log_retention;
pub mod logging;
pub mod records;
pub mod render;
pub mod runtime;
pub mod screen;
pub mod session;
pub mod startup;
pub mod store;
pub mod types;
pub mod validation;

use clap::{error::ErrorKind, Parser};
use config::{load_config, AppConfig, CliOverrides, DataPaths};
use errors::PortalError;
use flow::{FlowContext, FlowEngine};
use graph::NavigationGraph;
use handlers::HandlerTable;
use logging::{append_run_log, disable_run_log, init_run_log, JsonlLogger};
use runtime::ProductionRuntime;
use serde_json::json;
use startup::{ensure_data_files, print_banner};
use store::{PatientStore, UserStore};

#[derive(Debug, Clone, Parser)]
#[command(name = "patient-portal")]
#[command(version, about = "Terminal patient records portal")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
    #[arg(long)]
    pub data_dir: Option<std::path::PathBuf>,
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
    /// Replace the data files with demo accounts and patients, then exit.
    #[arg(long, default_value_t = false)]
    pub seed_demo: bool,
    #[arg(long)]
    pub random_patients: Option<u32>,
}

pub fn run() -> Result<i32, PortalError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| PortalError::Io(e.to_string()))?;
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &cwd, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    cwd: &std::path::Path,
    runtime: &ProductionRuntime,
) -> Result<i32, PortalError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(PortalError::Cli(error.to_string())),
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        data_dir: cli.data_dir.clone(),
        log_file: cli.log_file.clone(),
        random_patients: cli.random_patients,
    };
    let (cfg, paths) = load_config(&overrides, cwd, runtime.file_system.as_ref())?;

    if cfg.logging.enabled {
        init_run_log(JsonlLogger {
            path: paths.log.clone(),
            max_payload_bytes: cfg.logging.max_payload_bytes,
            budget_bytes: cfg.logging.budget_bytes,
        });
    } else {
        disable_run_log();
    }
    append_run_log(
        "info",
        "startup.config_loaded",
        json!({
            "data_dir": paths.dir.display().to_string(),
            "seed_demo": cli.seed_demo,
            "interactive": runtime.terminal.stdin_is_tty(),
        }),
    );

    if cli.seed_demo {
        return seed_demo(runtime, &cfg, &paths);
    }

    ensure_data_files(runtime.file_system.as_ref(), &paths)?;
    print_banner(runtime.terminal.as_ref(), &cfg.display.title)?;

    let graph = NavigationGraph::standard();
    graph.validate_standard()?;
    let ctx = FlowContext::new(
        cfg.display.title.clone(),
        runtime.terminal.clone(),
        UserStore::new(
            runtime.file_system.clone(),
            runtime.numbers.clone(),
            paths.users.clone(),
        ),
        PatientStore::new(runtime.file_system.clone(), paths.patients.clone()),
    );
    let mut engine = FlowEngine::new(graph, HandlerTable::standard(), ctx);
    engine.run()?;

    append_run_log("info", "shutdown", json!({}));
    Ok(0)
}

fn seed_demo(
    runtime: &ProductionRuntime,
    cfg: &AppConfig,
    paths: &DataPaths,
) -> Result<i32, PortalError> {
    runtime.terminal.write_line("Generating demo database...")?;
    let data = demo::build_demo_data(runtime.numbers.as_ref(), cfg.demo.random_patients)?;
    let summary = demo::write_demo_data(runtime.file_system.as_ref(), paths, &data)?;
    for line in demo::summary_lines(&summary) {
        runtime.terminal.write_line(&line)?;
    }
    Ok(0)
}
