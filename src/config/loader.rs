//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::MonitorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<MonitorConfig, ConfigError> {
    let config: MonitorConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reference_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/sentinel.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.endpoints.len(), 3);
        assert_eq!(config.schedule.max_concurrency, Some(3));
        assert_eq!(config.alerting.threshold, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [[endpoints]]
            name = "endpoint_1"
            url = "https://prod.example.io/endpoint_1/health_check"

            [[endpoints]]
            name = "endpoint_2"
            url = "https://prod.example.io/endpoint_2/health_check"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[1].name, "endpoint_2");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = parse_config("endpoints = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_semantic_errors_are_reported_together() {
        let err = parse_config(
            r#"
            [schedule]
            interval_secs = 0
            "#,
        )
        .unwrap_err();

        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("no endpoints configured"));
        assert!(message.contains("schedule.interval_secs"));
    }
}
