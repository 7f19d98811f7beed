//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::core::Project;
use crate::reference::Category;

/// CCA configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new records
    pub author: Option<String>,

    /// Editor command for `cca record edit`
    pub editor: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Instrument category used when `--category` is not given
    pub default_category: Option<Category>,

    /// Calibration laboratory pre-filled on new records
    pub laboratory: Option<String>,
}

impl Config {
    /// Load configuration from all sources for a known project (or none),
    /// merging in priority order
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/cca/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.cca/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("CCA_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(editor) = std::env::var("CCA_EDITOR") {
            config.editor = Some(editor);
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config file");
                return None;
            }
        };
        let only_comments = contents
            .lines()
            .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'));
        if only_comments {
            return Some(Config::default());
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(parsed) => {
                debug!(path = %path.display(), "loaded config file");
                Some(parsed)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cca")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.default_category.is_some() {
            self.default_category = other.default_category;
        }
        if other.laboratory.is_some() {
            self.laboratory = other.laboratory;
        }
    }

    /// Configured output format, if it names a known one
    pub fn output_format(&self) -> Option<OutputFormat> {
        use clap::ValueEnum;
        self.default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(&self, file_path: &Path) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let parts: Vec<&str> = editor.split_whitespace().collect();

        match parts.split_first() {
            Some((cmd, args)) => std::process::Command::new(cmd)
                .args(args)
                .arg(file_path)
                .status(),
            None => std::process::Command::new("vi").arg(file_path).status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            author: Some("a".to_string()),
            laboratory: Some("Lab A".to_string()),
            ..Default::default()
        };
        base.merge(Config {
            laboratory: Some("Lab B".to_string()),
            default_category: Some(Category::NaturalGas),
            ..Default::default()
        });

        assert_eq!(base.author.as_deref(), Some("a"));
        assert_eq!(base.laboratory.as_deref(), Some("Lab B"));
        assert_eq!(base.default_category, Some(Category::NaturalGas));
    }

    #[test]
    fn test_read_project_config() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        std::fs::write(
            project.config_path(),
            "author: Revisor\ndefault_category: natural_gas\ndefault_format: json\n",
        )
        .unwrap();

        let config = Config::read_file(&project.config_path()).unwrap();
        assert_eq!(config.author.as_deref(), Some("Revisor"));
        assert_eq!(config.default_category, Some(Category::NaturalGas));
        assert_eq!(config.output_format(), Some(OutputFormat::Json));
    }

    #[test]
    fn test_comment_only_config_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let config = Config::read_file(&project.config_path()).unwrap();
        assert!(config.author.is_none());
    }
}
