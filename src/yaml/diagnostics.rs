//! YAML error diagnostics pointing into the record source

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid YAML in {filename}: {message}")]
#[diagnostic(code(cca::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    filename: String,
    message: String,
}

impl YamlSyntaxError {
    /// Create an error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let offset = err
            .location()
            .map(|loc| line_col_to_offset(source, loc.line(), loc.column()))
            .unwrap_or(0);
        let message = err.to_string();

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1).min(source.len().max(1))),
            help: generate_help(&message),
            filename: filename.to_string(),
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Generic YAML error wrapper
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert a 1-based line/column to a byte offset, clamped to the source
pub(crate) fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    if line_start >= source.len() {
        return source.len().saturating_sub(1);
    }

    let rest = &source[line_start..];
    let line_text = rest.split('\n').next().unwrap_or("");
    let col_offset = line_text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line_text.len());

    line_start + col_offset
}

/// Suggest a fix for common mistakes in record files
fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("expected f64") || msg.contains("expected a float") {
        return Some(
            "Numeric fields take plain numbers with a dot as decimal separator (100.05, not \"100,05\")."
                .to_string(),
        );
    }

    if msg.contains("missing field") {
        return Some("Run `cca record template` to see every field of a record.".to_string());
    }

    if msg.contains("unknown variant") {
        return Some("Use one of the values listed in the message (lowercase, snake_case).".to_string());
    }

    if msg.contains("tab") {
        return Some("YAML requires spaces for indentation, not tabs.".to_string());
    }

    if msg.contains("duplicate") {
        return Some("Each key can only appear once in a section.".to_string());
    }

    if msg.contains("mapping values are not allowed") || msg.contains("expected block end") {
        return Some("Check indentation and the space after ':'.".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 14);
    }

    #[test]
    fn test_offset_clamped_past_end() {
        let source = "a: 1\n";
        assert_eq!(line_col_to_offset(source, 9, 1), 4);
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("invalid type: string \"100,05\", expected f64").is_some());
        assert!(generate_help("missing field `point`").is_some());
        assert!(generate_help("unknown variant `gas`").is_some());
        assert!(generate_help("some random error").is_none());
    }
}
