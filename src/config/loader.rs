//! Configuration and routing graph loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ControlPlaneConfig;
use crate::config::validation::{validate_config, validate_graph, ValidationError};
use crate::dag::Dag;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControlPlaneConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ControlPlaneConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate a routing graph snapshot from a TOML file.
pub fn load_graph(path: &Path) -> Result<Dag, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_graph(&content)
}

/// Parse and validate a routing graph snapshot.
pub fn parse_graph(content: &str) -> Result<Dag, ConfigError> {
    let dag: Dag = toml::from_str(content)?;

    validate_graph(&dag).map_err(ConfigError::Validation)?;

    Ok(dag)
}
