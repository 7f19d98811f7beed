//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    analysis::AnalysisCommands, completions::CompletionsArgs, eval::EvalCommands, init::InitArgs,
    point::PointCommands, record::RecordCommands, reference::RefCommands,
    validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "cca")]
#[command(author, version, about = "Calibration certificate critical analysis")]
#[command(long_about = "Critical analysis of calibration certificates for oil and gas \
measurement instruments. Records are plain YAML files; calibration points are judged \
with the decision rule |Erro| + U <= EMA.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .cca/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new CCA project
    Init(InitArgs),

    /// Critical analysis records
    #[command(subcommand)]
    Record(RecordCommands),

    /// Calibration points of a record
    #[command(subcommand)]
    Point(PointCommands),

    /// Evaluate points without a project
    #[command(subcommand)]
    Eval(EvalCommands),

    /// Conformity analysis of a record (show, JSON export)
    #[command(subcommand)]
    Analysis(AnalysisCommands),

    /// Regulatory reference tables
    #[command(subcommand)]
    Ref(RefCommands),

    /// Validate record files against the schema and the decision rule
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["cca", "record", "list", "-f", "json"]).unwrap();
        assert_eq!(cli.global.format, OutputFormat::Json);
    }
}
