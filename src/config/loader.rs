use crate::config::schema::{EngineConfig, ValidationError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mdpath.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A parse or validation failure in a config file on disk.
    #[error("{}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        source: Box<ConfigError>,
    },

    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml_edit::de::Error),

    #[error("invalid config: {0}")]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    /// The underlying failure, looking through the file it came from.
    pub fn root_cause(&self) -> &ConfigError {
        match self {
            ConfigError::InFile { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml_edit::de::from_str(input)?;
    config.validate()?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|source| ConfigError::InFile {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Like [`load_from_path`], but a missing file yields the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    match load_from_path(path) {
        Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(EngineConfig::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{StoreKind, ValidationIssue};

    #[test]
    fn parses_full_config() {
        let config = load_from_str(
            r#"
[index]
paragraphs = true
block_quotes = true

[store]
kind = "file"
root = "docs"
"#,
        )
        .unwrap();
        assert!(config.index.paragraphs);
        assert!(!config.index.list_items);
        assert!(config.index.block_quotes);
        assert_eq!(config.store.kind, StoreKind::File);
        assert_eq!(config.store.root, Some(PathBuf::from("docs")));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn memory_store_rejects_root() {
        let err = load_from_str("[store]\nkind = \"memory\"\nroot = \"x\"\n").unwrap_err();
        match err {
            ConfigError::Validation(source) => {
                assert!(matches!(source.issues[0], ValidationIssue::InvalidCombo { .. }))
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn empty_root_is_missing_field() {
        let err = load_from_str("[store]\nroot = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("missing field: store.root"));
    }

    #[test]
    fn bad_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdpath.toml");
        fs::write(&path, "[index\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InFile { path: ref p, .. } if p == &path));
        assert!(matches!(err.root_cause(), ConfigError::Toml(_)));
        assert!(err.to_string().starts_with(&path.display().to_string()));
    }

    #[test]
    fn unreadable_path_is_not_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_or_default(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
