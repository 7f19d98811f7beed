//! YAML parsing helpers with source-located diagnostics

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse a YAML file, turning syntax and shape errors into a labelled diagnostic
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_yaml_str(&content, &filename)
}

/// Parse YAML text that came from `filename`
pub fn parse_yaml_str<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, content, filename).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_yaml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.yaml");
        std::fs::write(&path, "a: 1\nb: 2\n").unwrap();

        let parsed: BTreeMap<String, u32> = parse_yaml_file(&path).unwrap();
        assert_eq!(parsed["b"], 2);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = parse_yaml_str::<BTreeMap<String, u32>>("a: [1, 2\n", "bad.yaml").unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_yaml_file::<BTreeMap<String, u32>>(Path::new("/nonexistent/x.yaml"))
            .unwrap_err();
        assert!(matches!(err, YamlError::Io(_)));
    }
}
