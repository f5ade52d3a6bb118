// Prescription Portal core
// Main library entry point

pub mod config;
pub mod forms;
pub mod i18n;
pub mod models;
pub mod prescription;
pub mod tracking;
pub mod utils;
pub mod working;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info};

use crate::config::PortalConfig;
use crate::forms::therapy::{collect_threshold_warnings, form_bg_units, warning_thresholds};
use crate::models::devices::DeviceCatalog;
use crate::models::values::FormValues;
use crate::prescription::constants::prescription_schema;
use crate::prescription::{get_form_steps, FormStepOptions, NoopHandlers};

fn format_human(out: fern::FormatCallback, message: &std::fmt::Arguments, record: &log::Record) {
    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    let raw = message.to_string();
    let line = utils::logging::format_human_readable_log(&utils::logging::LogRecord {
        timestamp: &timestamp_local,
        level: record.level(),
        target: record.target(),
        raw_message: &raw,
    });
    out.finish(format_args!("{}", line));
}

/// Initialize logging with dual format (JSON + human-readable) files and optional stdout.
pub fn init_logging(cfg: &PortalConfig) -> Result<PathBuf> {
    let log_dir = utils::path_resolver::resolve_log_folder(cfg.log_dir.as_deref())?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");
    let json_log_file = log_dir.join(format!("portal-{}.log", timestamp));
    let txt_log_file = log_dir.join(format!("portal-{}.txt", timestamp));

    let mut dispatch = fern::Dispatch::new().level(cfg.level_filter());

    if cfg.log_to_stdout {
        dispatch = dispatch.chain(fern::Dispatch::new().format(format_human).chain(std::io::stdout()));
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let raw = message.to_string();
                    let line = utils::logging::format_json_log(&utils::logging::LogRecord {
                        timestamp: &timestamp_utc,
                        level: record.level(),
                        target: record.target(),
                        raw_message: &raw,
                    });
                    out.finish(format_args!("{}", line));
                })
                .chain(fern::log_file(&json_log_file).context("Failed to open JSON log file")?),
        )
        .chain(
            fern::Dispatch::new()
                .format(format_human)
                .chain(fern::log_file(&txt_log_file).context("Failed to open text log file")?),
        );

    dispatch.apply().context("Logger already initialized")?;

    info!("[PHASE: initialization] Logging initialized, log directory: {:?}", log_dir);
    Ok(log_dir)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} from {}", what, path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {} in {}", what, path.display()))
}

fn load_inputs(values_path: &Path, devices_path: Option<&Path>) -> Result<(FormValues, DeviceCatalog)> {
    let values: FormValues = read_json(values_path, "form values")?;
    let devices = match devices_path {
        Some(p) => read_json(p, "device catalog")?,
        None => DeviceCatalog::default(),
    };
    Ok((values, devices))
}

/// Build the wizard steps for a values document and render them as pretty JSON.
pub fn steps_report(cfg: &PortalConfig, values_path: &Path, devices_path: Option<&Path>) -> Result<String> {
    let (values, devices) = load_inputs(values_path, devices_path)?;
    let units = form_bg_units(&values, cfg.bg_units);
    let schema = prescription_schema(units, &values)?;
    let options = FormStepOptions {
        is_prescriber: cfg.is_prescriber,
        default_bg_units: cfg.bg_units,
        ..FormStepOptions::default()
    };

    let steps = get_form_steps(&schema, &devices, &values, &NoopHandlers, &options);
    info!(
        "[PHASE: cli] [STEP: steps] Built {} steps from {}",
        steps.len(),
        values_path.display()
    );
    serde_json::to_string_pretty(&steps).context("Failed to render steps")
}

/// Evaluate every therapy input against its warning thresholds and render the warnings.
pub fn thresholds_report(cfg: &PortalConfig, values_path: &Path, devices_path: Option<&Path>) -> Result<String> {
    let (values, devices) = load_inputs(values_path, devices_path)?;
    let units = form_bg_units(&values, cfg.bg_units);
    let thresholds = warning_thresholds(devices.selected_pump(&values), units, &values);
    let warnings = collect_threshold_warnings(&thresholds, &values);
    info!("[PHASE: cli] [STEP: thresholds] {} warning(s)", warnings.len());
    serde_json::to_string_pretty(&warnings).context("Failed to render warnings")
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Steps { values: PathBuf, devices: Option<PathBuf> },
    Thresholds { values: PathBuf, devices: Option<PathBuf> },
    PrintConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub config: Option<PathBuf>,
}

fn flag_value(args: &[String], flag: &str) -> Result<Option<PathBuf>, String> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(i) => match args.get(i + 1) {
            Some(v) if !v.starts_with("--") => Ok(Some(PathBuf::from(v))),
            _ => Err(format!("{} requires a path", flag)),
        },
    }
}

/// Parse the command line. Usage errors come back as a message.
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let config = flag_value(args, "--config")?;
    let devices = flag_value(args, "--devices")?;

    let command = if let Some(values) = flag_value(args, "--steps")? {
        Command::Steps { values, devices }
    } else if let Some(values) = flag_value(args, "--thresholds")? {
        Command::Thresholds { values, devices }
    } else if args.iter().any(|a| a == "--print-config") {
        Command::PrintConfig
    } else {
        return Err("expected one of --steps, --thresholds or --print-config".to_string());
    };

    Ok(CliArgs { command, config })
}

pub const USAGE: &str = "usage: prescription-portal [--config <file>] \
(--steps <values.json> [--devices <catalog.json>] | --thresholds <values.json> [--devices <catalog.json>] | --print-config)";

/// Run a parsed command and print its output. Returns the process exit code.
pub fn run(cli: &CliArgs) -> i32 {
    let cfg = match PortalConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return 1;
        }
    };

    if let Err(e) = init_logging(&cfg) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    let output = match &cli.command {
        Command::Steps { values, devices } => steps_report(&cfg, values, devices.as_deref()),
        Command::Thresholds { values, devices } => thresholds_report(&cfg, values, devices.as_deref()),
        Command::PrintConfig => cfg.to_toml(),
    };

    match output {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            error!("[PHASE: cli] [STEP: run] {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}
