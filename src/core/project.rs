//! Project discovery and structure

use std::path::{Path, PathBuf};
use miette::Diagnostic;
use thiserror::Error;

/// Name of the project marker directory
pub const PROJECT_DIR: &str = ".cca";

/// Directory holding analysis record files
pub const RECORDS_DIR: &str = "records";

/// Represents a CCA project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .cca/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Use `--project` when given, otherwise discover from the current directory
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ProjectError> {
        match explicit {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::create_structure(root)
    }

    /// Initialize even if .cca/ exists; existing records are kept
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_structure(root)
    }

    fn create_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let project = Self { root };

        std::fs::create_dir_all(project.cca_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::create_dir_all(project.records_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# CCA Project Configuration

# Default author for new records (can be overridden by global config)
# author: ""

# Editor to use for `cca record edit` (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Default instrument category for new records (petroleum, natural_gas)
# default_category: petroleum

# Calibration laboratory pre-filled on new records
# laboratory: ""
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .cca configuration directory
    pub fn cca_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Project configuration file
    pub fn config_path(&self) -> PathBuf {
        self.cca_dir().join("config.yaml")
    }

    /// File holding the next record id
    pub fn sequence_path(&self) -> PathBuf {
        self.cca_dir().join("sequence")
    }

    /// Directory holding record files
    pub fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("not a CCA project (searched from {searched_from:?})")]
    #[diagnostic(code(cca::project::not_found), help("Run 'cca init' to create one"))]
    NotFound { searched_from: PathBuf },

    #[error("CCA project already exists at {0:?}")]
    #[diagnostic(code(cca::project::exists), help("Use 'cca init --force' to reinitialize"))]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.cca_dir().is_dir());
        assert!(project.config_path().exists());
        assert!(project.records_dir().is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_init_force_keeps_records() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let record = project.records_dir().join("analysis-00001.cca.yaml");
        std::fs::write(&record, "id: 1").unwrap();

        Project::init_force(tmp.path()).unwrap();
        assert!(record.exists());
    }

    #[test]
    fn test_project_discover_finds_cca_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_cca_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}
