//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use std::io::IsTerminal;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::identity::RecordId;
use crate::core::project::Project;
use crate::core::store::FileStore;
use crate::entities::AnalysisRecord;

/// Project selected by `--project` or found from the current directory
pub fn project(global: &GlobalOpts) -> Result<Project> {
    Ok(Project::locate(global.project.as_deref())?)
}

/// Record store of the current project
pub fn open_store(global: &GlobalOpts) -> Result<(Project, FileStore<AnalysisRecord>)> {
    let project = project(global)?;
    let store = FileStore::open(&project)?;
    Ok((project, store))
}

/// Parse a record id argument ("7", "#7", "CCA-7")
pub fn parse_id(s: &str) -> Result<RecordId> {
    RecordId::parse(s).map_err(|e| miette::miette!("invalid record id '{}': {}", s, e))
}

/// Resolve `Auto` against config, then against a per-command default
pub fn resolve_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    match global.format {
        OutputFormat::Auto => match config.output_format() {
            Some(OutputFormat::Auto) | None => fallback,
            Some(format) => format,
        },
        format => format,
    }
}

/// Print a value as YAML or JSON
pub fn print_serialized<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        _ => print!("{}", serde_yml::to_string(value).into_diagnostic()?),
    }
    Ok(())
}

/// Whether prompts can be shown
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Truncate to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output (RFC 4180)
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Parse `key=value`; the value is read as JSON when it parses, else as a string
pub fn parse_assignment(s: &str) -> Result<(String, serde_json::Value)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| miette::miette!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(miette::miette!("empty key in '{}'", s));
    }
    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
