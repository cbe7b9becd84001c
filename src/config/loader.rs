//! Configuration loading from disk.

use std::path::Path;

use thiserror::Error;

use super::schema::ServerConfig;
use super::validation::{validate_config, ValidationError};

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
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: ServerConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_minimal_config() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "[storage]\nroot = \"/tmp/blobs\"\n\n[partitions]\nqueue_partitions = \"a,b\"\n"
        )
        .unwrap();

        let config = load_config(f.path()).unwrap();
        assert_eq!(config.storage.root, "/tmp/blobs");
        assert_eq!(config.partitions.queue_partitions, "a,b");
        // untouched sections keep their defaults
        assert_eq!(config.listener.bind_address, "127.0.0.1:3179");
    }

    #[test]
    fn test_invalid_config_fails_validation() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[partitions]\nqueue_partitions = \"a,a\"\n").unwrap();

        assert!(matches!(
            load_config(f.path()),
            Err(ConfigError::Validation(_))
        ));
    }
}
