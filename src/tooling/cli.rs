//! CLI Tooling
//!
//! Hosts a [`FlatTreeStore`] behind a command line: the terminal plays the
//! rendering widget, printing the flat list as an indented tree.

use crate::config::{ConfigLoader, ProviderKind, RepoTreeConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider;
use crate::tooling::format::{
    format_config_text, format_failures_text, format_node_details, format_stats_text,
    format_tree_text,
};
use crate::tree::{ExpansionReport, FlatNode, FlatTreeStore};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// repotree - browse a legacy repository as a lazily loaded tree
#[derive(Parser, Debug)]
#[command(name = "repotree")]
#[command(about = "Browse a legacy source repository through its directory-listing service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root (where repotree.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces global and workspace files)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Repository name
    #[arg(long)]
    pub repository: Option<String>,

    /// Listing provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Base URL of the listing service (http provider)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Checkout directory (local provider)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Tree document (snapshot provider)
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Log to stderr at debug level
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List the top level of the repository
    Roots {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the tree expanded to a depth
    Tree {
        /// Levels to expand below the roots (default: tree.default_depth)
        #[arg(long)]
        depth: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Expand the ancestors of a path and show the entry
    Reveal {
        path: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Counters over the tree expanded to a depth
    Stats {
        #[arg(long)]
        depth: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show the effective configuration
    Config {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Load configuration and apply command-line overrides.
    pub fn load_config(&self) -> Result<RepoTreeConfig, ApiError> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&self.workspace)?,
        };
        if let Some(repository) = &self.repository {
            config.repository.name = repository.clone();
        }
        if let Some(kind) = self.provider {
            config.provider.kind = kind;
        }
        if let Some(api_url) = &self.api_url {
            config.provider.api_url = api_url.clone();
        }
        if let Some(root) = &self.root {
            config.provider.root = Some(root.clone());
            if self.provider.is_none() {
                config.provider.kind = ProviderKind::Local;
            }
        }
        if let Some(snapshot) = &self.snapshot {
            config.provider.snapshot = Some(snapshot.clone());
            if self.provider.is_none() {
                config.provider.kind = ProviderKind::Snapshot;
            }
        }
        config.validate().map_err(ApiError::ConfigError)?;
        Ok(config)
    }

    /// Logging configuration with command-line flags applied over `base`.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
            config.output = "stderr".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Roots { .. } => "roots",
        Commands::Tree { .. } => "tree",
        Commands::Reveal { .. } => "reveal",
        Commands::Stats { .. } => "stats",
        Commands::Config { .. } => "config",
    }
}

/// A configured store plus the configuration it came from.
pub struct CliContext {
    config: RepoTreeConfig,
    store: FlatTreeStore,
}

impl CliContext {
    /// Build the provider and store selected by `config`.
    pub fn new(config: RepoTreeConfig) -> Result<Self, ApiError> {
        let provider = provider::from_config(&config.provider)?;
        let store = FlatTreeStore::with_guard(
            config.repository.name.clone(),
            provider,
            config.tree.collapse_guard,
        );
        Ok(Self { config, store })
    }

    /// Use an existing store, e.g. one over a test provider.
    pub fn with_store(config: RepoTreeConfig, store: FlatTreeStore) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &RepoTreeConfig {
        &self.config
    }

    pub fn store(&self) -> &FlatTreeStore {
        &self.store
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command).await;
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Roots { format } => {
                self.store.load_roots().await?;
                let nodes = self.store.nodes();
                match format {
                    OutputFormat::Text => Ok(format_tree_text(&nodes, None)),
                    OutputFormat::Json => to_json(&json!({
                        "repository": self.config.repository.name,
                        "nodes": nodes,
                    })),
                }
            }
            Commands::Tree { depth, format } => {
                let depth = depth.unwrap_or(self.config.tree.default_depth);
                let report = self.load_to_depth(depth).await?;
                let nodes = self.store.nodes();
                match format {
                    OutputFormat::Text => {
                        let mut out = format_tree_text(&nodes, None);
                        out.push_str(&format_failures_text(&report.failures));
                        Ok(out)
                    }
                    OutputFormat::Json => to_json(&json!({
                        "repository": self.config.repository.name,
                        "depth": depth,
                        "nodes": nodes,
                        "failures": failures_json(&report),
                    })),
                }
            }
            Commands::Reveal { path, format } => {
                self.store.load_roots().await?;
                let node = self.store.reveal(path).await?;
                match format {
                    OutputFormat::Text => {
                        let mut out = format_tree_text(&self.store.nodes(), Some(node.key));
                        out.push('\n');
                        out.push_str(&format_node_details(&node));
                        Ok(out)
                    }
                    OutputFormat::Json => to_json(&json!({ "node": node })),
                }
            }
            Commands::Stats { depth, format } => {
                let depth = depth.unwrap_or(self.config.tree.default_depth);
                let report = self.load_to_depth(depth).await?;
                let stats = self.store.stats();
                match format {
                    OutputFormat::Text => {
                        let mut out = format_stats_text(&self.config.repository.name, &stats);
                        out.push_str(&format_failures_text(&report.failures));
                        Ok(out)
                    }
                    OutputFormat::Json => to_json(&json!({
                        "repository": self.config.repository.name,
                        "depth": depth,
                        "stats": stats,
                        "progress": stats.analysis_progress(),
                        "failures": failures_json(&report),
                    })),
                }
            }
            Commands::Config { format } => {
                let config = redacted(&self.config);
                match format {
                    OutputFormat::Text => format_config_text(&config),
                    OutputFormat::Json => to_json(&config),
                }
            }
        }
    }

    async fn load_to_depth(&self, depth: usize) -> Result<ExpansionReport, ApiError> {
        self.store.load_roots().await?;
        Ok(self.store.expand_to_depth(depth).await)
    }

    /// Rows currently shown, for callers driving the store directly.
    pub fn nodes(&self) -> Vec<FlatNode> {
        self.store.nodes()
    }
}

fn redacted(config: &RepoTreeConfig) -> RepoTreeConfig {
    let mut config = config.clone();
    if config.provider.api_token.is_some() {
        config.provider.api_token = Some("********".to_string());
    }
    config
}

fn failures_json(report: &ExpansionReport) -> serde_json::Value {
    report
        .failures
        .iter()
        .map(|f| json!({ "path": f.path, "error": f.error.to_string() }))
        .collect()
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ProviderError(format!("Failed to serialize output: {}", e)))
}
