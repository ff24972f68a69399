//! Run configuration.
//!
//! [`GeneratorConfig`] is built up by option actions while the command line is
//! parsed. [`ToolConfig`] holds optional defaults read from `texttransform.json`.
//! It is loaded after parsing, so a help request never touches it, and its
//! values are placed ahead of the command-line ones.

use crate::error::{Result, TransformError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use templating::EngineOptions;

pub const CONFIG_FILENAME: &str = "texttransform.json";
pub const CONFIG_ENV: &str = "TEXTTRANSFORM_CONFIG";

/// Accumulated per-run settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// References, imports, search paths, directive processors and host parameters.
    pub engine: EngineOptions,
    /// Selects preprocess mode when set.
    pub preprocess_class_name: Option<String>,
    pub debug: bool,
    pub verbose: bool,
}

/// Defaults file contents. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub reference_paths: Vec<PathBuf>,
}

impl ToolConfig {
    /// Loads a defaults file, or returns defaults if it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| TransformError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| TransformError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Finds the defaults file: an explicit path, then `cwd`, then the user config directory.
    pub fn locate(explicit: Option<PathBuf>, cwd: &Path) -> Option<PathBuf> {
        if explicit.is_some() {
            return explicit;
        }
        let local = cwd.join(CONFIG_FILENAME);
        if local.is_file() {
            return Some(local);
        }
        ProjectDirs::from("", "", "texttransform")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
            .filter(|path| path.is_file())
    }

    /// Locates and loads the defaults file for this process.
    pub fn discover(cwd: &Path) -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        if let Some(path) = &explicit {
            if !path.is_file() {
                return Err(TransformError::Config {
                    path: path.clone(),
                    reason: "file not found".to_string(),
                });
            }
        }
        match Self::locate(explicit, cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading defaults file");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Places these defaults ahead of the values options already put in `config`.
    pub fn apply(&self, config: &mut GeneratorConfig) {
        let engine = &mut config.engine;
        engine.references.splice(0..0, self.references.iter().cloned());
        engine.imports.splice(0..0, self.imports.iter().cloned());
        engine
            .include_paths
            .splice(0..0, self.include_paths.iter().cloned());
        engine
            .reference_paths
            .splice(0..0, self.reference_paths.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let config = ToolConfig::load(dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, r#"{ "imports": ["std::fmt"], "include_paths": ["inc"] }"#).unwrap();

        let config = ToolConfig::load(&path).unwrap();
        assert_eq!(config.imports, vec!["std::fmt"]);
        assert_eq!(config.include_paths, vec![PathBuf::from("inc")]);
        assert!(config.references.is_empty());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "{ not json").unwrap();

        let err = ToolConfig::load(&path).unwrap_err();
        assert!(matches!(err, TransformError::Config { .. }));
    }

    #[test]
    fn test_locate_prefers_explicit_then_cwd() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.json");
        assert_eq!(
            ToolConfig::locate(Some(explicit.clone()), dir.path()),
            Some(explicit)
        );

        let local = dir.path().join(CONFIG_FILENAME);
        fs::write(&local, "{}").unwrap();
        assert_eq!(ToolConfig::locate(None, dir.path()), Some(local));
    }

    #[test]
    fn test_apply_puts_defaults_first() {
        let tool = ToolConfig {
            references: vec!["a.dll".into()],
            imports: vec!["x".into(), "y".into()],
            include_paths: vec![PathBuf::from("inc")],
            reference_paths: vec![],
        };
        let mut config = GeneratorConfig::default();
        config.engine.imports.push("from_cli".into());
        tool.apply(&mut config);

        assert_eq!(config.engine.imports, vec!["x", "y", "from_cli"]);
        assert_eq!(config.engine.references, vec!["a.dll"]);
        assert_eq!(config.engine.include_paths, vec![PathBuf::from("inc")]);
    }
}
