//! JSON Schema validation of record files with source-located diagnostics

use jsonschema::error::ValidationErrorKind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::schema::registry::SchemaRegistry;
use crate::yaml::diagnostics::line_col_to_offset;

/// A record file that does not match its schema
#[derive(Debug, Error, Diagnostic)]
#[error("{filename}: {summary}")]
#[diagnostic(
    code(cca::schema::invalid),
    help("Compare the file with `cca record template`")
)]
pub struct ValidationError {
    filename: String,
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// One schema rule broken by a record file
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{hint}")]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ValidationError {
    fn new(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let summary = match violations.len() {
            1 => "1 schema violation".to_string(),
            n => format!("{} schema violations", n),
        };
        Self {
            filename: filename.to_string(),
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

/// Compiled schemas for every record kind
pub struct Validator {
    compiled: HashMap<String, JsonValidator>,
}

impl Validator {
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();
        for kind in registry.kinds() {
            let Some(source) = registry.get(kind) else {
                continue;
            };
            match serde_json::from_str::<JsonValue>(source)
                .map_err(|e| e.to_string())
                .and_then(|schema| validator_for(&schema).map_err(|e| e.to_string()))
            {
                Ok(validator) => {
                    compiled.insert(kind.to_string(), validator);
                }
                Err(e) => warn!(kind, error = %e, "embedded schema does not compile"),
            }
        }
        Self { compiled }
    }

    /// Whether a schema exists for `kind`
    pub fn knows(&self, kind: &str) -> bool {
        self.compiled.contains_key(kind)
    }

    /// Validate YAML text, reporting every violation
    pub fn validate(
        &self,
        content: &str,
        filename: &str,
        kind: &str,
    ) -> Result<(), ValidationError> {
        let value = yaml_to_json(content, filename)?;
        self.validate_value(&value, content, filename, kind)
    }

    /// Validate an already-parsed document; `content` is used to locate errors
    pub fn validate_value(
        &self,
        value: &JsonValue,
        content: &str,
        filename: &str,
        kind: &str,
    ) -> Result<(), ValidationError> {
        let Some(schema) = self.compiled.get(kind) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = schema
            .iter_errors(value)
            .map(|e| violation_from(content, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(filename, content, violations))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&SchemaRegistry::default())
    }
}

/// Parse YAML text into a JSON value, as a schema violation on failure
pub fn yaml_to_json(content: &str, filename: &str) -> Result<JsonValue, ValidationError> {
    let yaml: serde_yml::Value = serde_yml::from_str(content).map_err(|e| {
        let span = match e.location() {
            Some(loc) => {
                line_span(content, line_col_to_offset(content, loc.line(), loc.column()))
            }
            None => line_span(content, 0),
        };
        let violation = SchemaViolation {
            span,
            message: format!("not valid YAML: {}", e),
            hint: "invalid YAML".to_string(),
            help: Some("Check indentation and that every key ends with ':'".to_string()),
        };
        ValidationError::new(filename, content, vec![violation])
    })?;

    serde_json::to_value(&yaml).map_err(|e| {
        let violation = SchemaViolation {
            span: line_span(content, 0),
            message: format!("cannot be represented as JSON: {}", e),
            hint: "unsupported value".to_string(),
            help: None,
        };
        ValidationError::new(filename, content, vec![violation])
    })
}

fn violation_from(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.as_str().to_string();
    let at = if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("'{}'", path)
    };

    let (message, hint, help) = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let field = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            (
                format!("missing field '{}' at {}", field, at),
                "required field missing".to_string(),
                Some(format!("Add '{}:' to this section", field)),
            )
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => (
            format!("unknown field(s) at {}: {}", at, unexpected.join(", ")),
            "unknown field".to_string(),
            Some("Check the spelling against `cca record template`".to_string()),
        ),
        ValidationErrorKind::Enum { options } => {
            let allowed = enum_options(options);
            (
                format!("invalid value at {}", at),
                "not an allowed value".to_string(),
                Some(format!("Use one of: {}", allowed)),
            )
        }
        ValidationErrorKind::Type { kind } => (
            format!("wrong type at {}: expected {:?}", at, kind),
            "wrong type".to_string(),
            Some("Numbers use '.' as decimal separator and are not quoted".to_string()),
        ),
        ValidationErrorKind::Pattern { .. } => (
            format!("badly formatted value at {}", at),
            "bad format".to_string(),
            Some("Dates are written as YYYY-MM-DD".to_string()),
        ),
        ValidationErrorKind::Minimum { limit } => (
            format!("value at {} is below the minimum of {}", at, limit),
            "too small".to_string(),
            None,
        ),
        ValidationErrorKind::ExclusiveMinimum { limit } => (
            format!("value at {} must be greater than {}", at, limit),
            "too small".to_string(),
            None,
        ),
        ValidationErrorKind::MinLength { .. } => (
            format!("value at {} must not be empty", at),
            "empty".to_string(),
            None,
        ),
        _ => (
            format!("invalid value at {}: {}", at, error),
            "invalid".to_string(),
            None,
        ),
    };

    SchemaViolation {
        span: path_span(content, &path),
        message,
        hint,
        help,
    }
}

fn enum_options(options: &JsonValue) -> String {
    match options.as_array() {
        Some(values) => values
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        None => options.to_string(),
    }
}

/// Span of the rest of the line starting at `offset`
fn line_span(content: &str, offset: usize) -> SourceSpan {
    let offset = offset.min(content.len());
    let len = content[offset..]
        .find('\n')
        .unwrap_or(content.len() - offset)
        .max(1);
    (offset, len).into()
}

/// Locate a JSON pointer (e.g. "/calibration_points/2/uncertainty") in YAML text
///
/// Keys are searched in order, each after the previous match; array indices
/// skip that many `- ` items. Falls back to the deepest segment found.
pub(crate) fn path_span(content: &str, pointer: &str) -> SourceSpan {
    let mut offset = 0;
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        let next = match segment.parse::<usize>() {
            Ok(index) => find_item(content, offset, index),
            Err(_) => find_key(content, offset, segment),
        };
        match next {
            Some(found) => offset = found,
            None => break,
        }
    }
    line_span(content, offset)
}

fn find_key(content: &str, from: usize, key: &str) -> Option<usize> {
    let pattern = format!("{}:", key);
    let mut offset = from;
    for line in content[from..].split_inclusive('\n') {
        let body = line.trim_start().trim_start_matches("- ");
        if body.starts_with(&pattern) {
            return Some(offset + (line.len() - body.len()));
        }
        offset += line.len();
    }
    None
}

fn find_item(content: &str, from: usize, index: usize) -> Option<usize> {
    let mut offset = from;
    let mut seen = 0;
    for line in content[from..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("- ") || trimmed.trim_end() == "-" {
            if seen == index {
                return Some(offset + (line.len() - trimmed.len()));
            }
            seen += 1;
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
id: 3
title: FT-101 certificado 1234/24
status: draft
instrument:
  tag: FT-101
  category: natural_gas
calibration_range:
  min: 0
  max: 100
  unit: kPa
calibration_points:
  - point: P1
    reference_value: 10.0
    measured_value: 10.05
    uncertainty: 0.02
    error_limit: 0.1
author: Ana
created: 2024-01-01T00:00:00Z
updated: 2024-01-01T00:00:00Z
"#;

    #[test]
    fn test_valid_record() {
        let validator = Validator::default();
        assert!(validator.knows("analysis"));
        let result = validator.validate(VALID, "analysis-00003.cca.yaml", "analysis");
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_unknown_kind_passes() {
        let validator = Validator::default();
        assert!(validator.validate("x: 1", "x.yaml", "other").is_ok());
    }

    #[test]
    fn test_all_violations_reported() {
        let validator = Validator::default();
        let yaml = VALID
            .replace("category: natural_gas", "category: water")
            .replace("uncertainty: 0.02", "uncertainty: -0.02")
            .replace("author: Ana\n", "");
        let err = validator
            .validate(&yaml, "bad.cca.yaml", "analysis")
            .unwrap_err();
        assert_eq!(err.violation_count(), 3);
        assert!(err
            .violations()
            .iter()
            .any(|v| v.message().contains("missing field 'author'")));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let validator = Validator::default();
        let yaml = VALID.replace("status: draft", "statuss: draft");
        let err = validator.validate(&yaml, "bad.cca.yaml", "analysis").unwrap_err();
        assert!(err.violations()[0].message().contains("statuss"));
    }

    #[test]
    fn test_yaml_syntax_error() {
        let validator = Validator::default();
        let err = validator
            .validate("title: [unclosed", "bad.cca.yaml", "analysis")
            .unwrap_err();
        assert!(err.violations()[0].message().starts_with("not valid YAML"));
    }

    #[test]
    fn test_path_span_follows_pointer() {
        let yaml = "a:\n  - x: 1\n  - x: 2\n    y: 3\n";
        let span = path_span(yaml, "/a/1/y");
        let offset = span.offset();
        assert!(yaml[offset..].starts_with("y: 3"));

        let span = path_span(yaml, "/a/1");
        assert!(yaml[span.offset()..].starts_with("- x: 2"));
    }
}
