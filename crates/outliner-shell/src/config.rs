//! Shell configuration (`~/.config/outliner/shell.ron`).
//!
//! ```ron
//! (
//!     prompt: "outliner> ",
//!     pretty_dump: true,
//!     log_filter: "info",
//! )
//! ```
//!
//! Every field is optional. A missing default file means defaults; a missing
//! file named on the command line is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub prompt: String,
    /// Indent `dump` output.
    pub pretty_dump: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "outliner> ".to_string(),
            pretty_dump: true,
            log_filter: "warn".to_string(),
        }
    }
}

/// Error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("RON parse error in {path}: {source}")]
    Ron {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// Where the config lives when `--config` is not given.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("outliner").join("shell.ron"))
}

impl ShellConfig {
    pub fn from_ron(text: &str, path: &Path) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|source| ConfigError::Ron {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text, path)
    }

    /// Load the explicit path if given, else the default path if it exists,
    /// else defaults. Returns the file actually read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                let config = Self::from_file(&path)?;
                Ok((config, Some(path)))
            }
            _ => Ok((Self::default(), None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = ShellConfig::from_ron("(prompt: \"$ \")", Path::new("x.ron")).unwrap();
        assert_eq!(config.prompt, "$ ");
        assert!(config.pretty_dump);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.ron");
        std::fs::write(&path, "(pretty_dump: false, log_filter: \"debug\")").unwrap();

        let (config, used) = ShellConfig::load(Some(&path)).unwrap();
        assert!(!config.pretty_dump);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(used, Some(path));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ron");
        assert!(matches!(
            ShellConfig::load(Some(&path)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_bad_ron_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.ron");
        std::fs::write(&path, "(prompt: 42").unwrap();
        assert!(matches!(
            ShellConfig::from_file(&path),
            Err(ConfigError::Ron { .. })
        ));
    }
}
