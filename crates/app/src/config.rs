use std::path::{Path, PathBuf};

use course_core::CourseConfig;
use course_core::model::CourseError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] CourseError),
}

/// Loads the course configuration from `path`, or the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<CourseConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(CourseConfig::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&raw)?;
    tracing::info!(path = %path.display(), "course config loaded");
    Ok(config)
}

pub fn parse_config(raw: &str) -> Result<CourseConfig, ConfigError> {
    let config: CourseConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}
