use clap::{Parser, Subcommand, ValueEnum};
use graphweave_core::{MappingRule, ReadMode};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Read mode as a CLI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Strict,
    Permissive,
}

impl From<ModeArg> for ReadMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Strict => ReadMode::Strict,
            ModeArg::Permissive => ReadMode::Permissive,
        }
    }
}

#[derive(Parser)]
#[command(name = "gw")]
#[command(about = "gw - Graphweave CLI - LLM-assisted ingestion of records into a graph store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses the config file value
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/graphweave/config.toml)
    #[arg(short = 'C', long, global = true, env = "GRAPHWEAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract entities and relationships from a file and write them to the graph
    Ingest {
        /// CSV-like or free-text file
        file: PathBuf,

        /// Mapping rule as COLUMN:RELATIONSHIP:TARGET (repeatable)
        #[arg(short = 'r', long = "rule", value_name = "COLUMN:REL:TARGET", value_parser = parse_rule)]
        rules: Vec<MappingRule>,

        /// JSON file holding an array of mapping rules
        #[arg(short = 'm', long, conflicts_with = "rules")]
        mapping: Option<PathBuf>,

        /// Remember the mapping for files with the same columns
        #[arg(long)]
        save: bool,

        /// Name recorded on the document (defaults to the file name)
        #[arg(long)]
        file_name: Option<String>,
    },

    /// Read the graph back out of the store
    Graph {
        /// Override the configured read mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Print per-table counts instead of the graph
        #[arg(long)]
        stats: bool,
    },

    /// Ask the model to propose a mapping for a file's columns
    Propose {
        /// File whose first line holds the column names
        file: PathBuf,

        /// Data rows shown to the model
        #[arg(long, default_value = "5")]
        samples: usize,

        /// Ask the model even when a mapping is remembered for these columns
        #[arg(long)]
        fresh: bool,
    },

    /// Inspect remembered mappings
    #[command(subcommand)]
    Mapping(MappingCommands),

    /// List the learned relationship vocabulary
    Vocab,
}

#[derive(Subcommand)]
pub enum MappingCommands {
    /// List every remembered mapping
    List,
    /// Show the mapping remembered for a file's columns
    Show {
        /// File whose first line holds the column names
        file: PathBuf,
    },
}

/// Parse `COLUMN:RELATIONSHIP:TARGET`.
pub fn parse_rule(raw: &str) -> Result<MappingRule, String> {
    let parts: Vec<&str> = raw.splitn(3, ':').map(str::trim).collect();
    match parts.as_slice() {
        [column, rel, target] if !column.is_empty() && !rel.is_empty() && !target.is_empty() => {
            Ok(MappingRule::new(*column, *rel, *target))
        }
        _ => Err(format!(
            "expected COLUMN:RELATIONSHIP:TARGET, got '{}'",
            raw
        )),
    }
}
