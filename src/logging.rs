//! Logging
//!
//! Structured logging through `tracing`. Level, format and destination come
//! from the `[logging]` config section and may be overridden by environment
//! variables: `REPOTREE_LOG` (filter directives), `REPOTREE_LOG_FORMAT`,
//! `REPOTREE_LOG_OUTPUT`, `REPOTREE_LOG_FILE` and `REPOTREE_LOG_MODULES`.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Resolve the log file path: explicit path, then `REPOTREE_LOG_FILE`, then
/// the configured file, then the platform state directory.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
    if let Some(p) = cli_file.filter(non_empty) {
        return Ok(p);
    }
    if let Some(p) = std::env::var_os("REPOTREE_LOG_FILE")
        .map(PathBuf::from)
        .filter(non_empty)
    {
        return Ok(p);
    }
    if let Some(p) = config_file.filter(non_empty) {
        return Ok(p);
    }
    default_log_file_path()
}

fn default_log_file_path() -> Result<PathBuf, ApiError> {
    let project_dirs = directories::ProjectDirs::from("", "", "repotree").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform directories for log file".to_string())
    })?;
    // macOS and Windows have no state dir
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir());
    Ok(dir.join("repotree.log"))
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,

    /// trace, debug, info, warn, error, off
    pub level: String,

    /// json or text
    pub format: String,

    /// stdout, stderr, file, file+stderr, both
    pub output: String,

    /// Log file when output includes file; `None` uses the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// ANSI colours for text output on a terminal stream.
    pub color: bool,

    /// Per-module levels, e.g. `repotree::tree = "debug"`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: "text".to_string(),
            output: "file".to_string(),
            file: None,
            color: true,
            modules: BTreeMap::new(),
        }
    }
}

/// Install the global subscriber.
///
/// Returns an error if the configuration is invalid, the log file cannot be
/// opened, or a subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    if !config.enabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(|e| ApiError::ConfigError(format!("Logging already initialised: {}", e)));
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;

    let writer = match (output.file, output.stdout, output.stderr) {
        (true, _, true) => BoxMakeWriter::new(open_log_file(config)?.and(std::io::stderr)),
        (true, _, false) => BoxMakeWriter::new(open_log_file(config)?),
        (false, true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        (false, false, true) => BoxMakeWriter::new(std::io::stderr),
        _ => BoxMakeWriter::new(std::io::stdout),
    };
    let ansi = config.color && !output.file;

    let layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    Registry::default()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| ApiError::ConfigError(format!("Logging already initialised: {}", e)))
}

fn open_log_file(config: &LoggingConfig) -> Result<File, ApiError> {
    let log_file = resolve_log_file_path(None, config.file.clone())?;
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ApiError::ConfigError(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| {
            ApiError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e))
        })
}

/// `REPOTREE_LOG` wins outright; otherwise the configured level plus module
/// directives from config and `REPOTREE_LOG_MODULES`.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env("REPOTREE_LOG") {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, level) in &config.modules {
        filter = filter.add_directive(parse_directive(module, level)?);
    }
    if let Ok(modules) = std::env::var("REPOTREE_LOG_MODULES") {
        for spec in modules.split(',') {
            if let Some((module, level)) = spec.split_once('=') {
                filter = filter.add_directive(parse_directive(module, level)?);
            }
        }
    }
    Ok(filter)
}

fn parse_directive(
    module: &str,
    level: &str,
) -> Result<tracing_subscriber::filter::Directive, ApiError> {
    format!("{}={}", module.trim(), level.trim())
        .parse()
        .map_err(|e| ApiError::ConfigError(format!("Invalid log directive: {}", e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

fn determine_format(config: &LoggingConfig) -> Result<LogFormat, ApiError> {
    let env = std::env::var("REPOTREE_LOG_FORMAT").ok();
    match env.as_deref().unwrap_or(config.format.as_str()) {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(ApiError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn determine_output(config: &LoggingConfig) -> Result<OutputDestinations, ApiError> {
    match std::env::var("REPOTREE_LOG_OUTPUT") {
        Ok(output) => parse_output_destinations(&output),
        Err(_) => parse_output_destinations(&config.output),
    }
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, ApiError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        _ => {
            return Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                output
            )))
        }
    };
    Ok(OutputDestinations {
        stdout,
        stderr,
        file,
    })
}
