//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::DevConfig;
use crate::config::validation::{validate_config, ValidationError};

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
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DevConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<DevConfig, ConfigError> {
    let config: DevConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the configuration at `path`, or the defaults when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<DevConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(DevConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [watch]
            poll_interval_ms = 250

            [serve]
            assets_dir = "public"
            "#,
        )
        .unwrap();

        assert_eq!(config.watch.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.watch.always.len(), 2);
        assert_eq!(config.serve.assets_dir, Path::new("public"));
        assert_eq!(config.serve.data_dir, Path::new("data"));
        assert_eq!(config.bind.fallback_address, ":3080");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_config("[watch]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v.len() == 1));
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = parse_config("[watch\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bind]\nfallback_delay_ms = 10").unwrap();

        let config = load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.bind.fallback_delay(), Duration::from_millis(10));

        let missing = load_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
