use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

/// Executor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    audit: bool,
    log_arguments: bool,
    max_iterations: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            audit: true,
            log_arguments: false,
            max_iterations: None,
        }
    }
}

impl ExecutorConfig {
    /// Whether runs record an [`AuditLog`](crate::AuditLog).
    #[must_use]
    pub fn audit(&self) -> bool {
        self.audit
    }

    /// Whether resolved step arguments are emitted at debug level.
    #[must_use]
    pub fn log_arguments(&self) -> bool {
        self.log_arguments
    }

    /// Upper bound on run-loop iterations, if any.
    #[must_use]
    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    #[must_use]
    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    #[must_use]
    pub fn with_log_arguments(mut self, log_arguments: bool) -> Self {
        self.log_arguments = log_arguments;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Parse settings from TOML.
    ///
    /// Settings are read from an `[executor]` table, or from
    /// `[package.metadata.sagaflow]` / `[workspace.metadata.sagaflow]` when
    /// the document is a Cargo manifest. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or a setting has
    /// the wrong type.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let document: ConfigDocument = toml::from_str(source)?;

        let settings = document
            .executor
            .or_else(|| {
                document
                    .package
                    .and_then(|p| p.metadata)
                    .and_then(|m| m.sagaflow)
            })
            .or_else(|| {
                document
                    .workspace
                    .and_then(|w| w.metadata)
                    .and_then(|m| m.sagaflow)
            });

        Ok(build_config(settings.as_ref()))
    }

    /// Read settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    executor: Option<ExecutorSettings>,
    package: Option<ManifestSection>,
    workspace: Option<ManifestSection>,
}

#[derive(Debug, Deserialize)]
struct ManifestSection {
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    sagaflow: Option<ExecutorSettings>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct ExecutorSettings {
    audit: Option<bool>,
    log_arguments: Option<bool>,
    max_iterations: Option<usize>,
}

fn build_config(settings: Option<&ExecutorSettings>) -> ExecutorConfig {
    let defaults = ExecutorConfig::default();
    match settings {
        None => defaults,
        Some(s) => ExecutorConfig {
            audit: s.audit.unwrap_or(defaults.audit),
            log_arguments: s.log_arguments.unwrap_or(defaults.log_arguments),
            max_iterations: s.max_iterations.or(defaults.max_iterations),
        },
    }
}
