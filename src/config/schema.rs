use crate::index::IndexOptions;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Top-level `mdpath.toml`.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub index: IndexOptions,
    #[serde(default)]
    pub store: StoreConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        match self.store.kind {
            StoreKind::File => match &self.store.root {
                Some(root) if root.as_os_str().is_empty() => {
                    issues.push(ValidationIssue::MissingField { field: "store.root" });
                }
                Some(root) if root.is_file() => {
                    issues.push(ValidationIssue::InvalidCombo {
                        message: format!("store.root {} is a file", root.display()),
                    });
                }
                _ => {}
            },
            StoreKind::Memory => {
                if self.store.root.is_some() {
                    issues.push(ValidationIssue::InvalidCombo {
                        message: "store.root is only valid for kind = \"file\"".to_string(),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    /// Root directory of a file store; defaults to the working directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl StoreConfig {
    pub fn root_or_cwd(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField { field: &'static str },
    InvalidCombo { message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => write!(f, "missing field: {field}"),
            ValidationIssue::InvalidCombo { message } => write!(f, "{message}"),
        }
    }
}
