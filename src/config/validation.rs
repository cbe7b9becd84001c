//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check partition names against the grammar's validity rule
//! - Validate value ranges (timeouts, limits)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::partition::is_valid_partition_name;

use super::schema::ServerConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("storage root must not be empty")]
    EmptyStorageRoot,

    #[error("listener bind address must not be empty")]
    EmptyBindAddress,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid queue partition name {0:?}")]
    InvalidPartitionName(String),

    #[error("duplicate queue partition name {0:?}")]
    DuplicatePartitionName(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.storage.root.is_empty() {
        errors.push(ValidationError::EmptyStorageRoot);
    }
    if config.listener.bind_address.is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let csv = &config.partitions.queue_partitions;
    if !csv.is_empty() {
        let mut seen = Vec::new();
        for name in csv.split(',') {
            if !is_valid_partition_name(name) {
                errors.push(ValidationError::InvalidPartitionName(name.to_string()));
            } else if seen.contains(&name) {
                errors.push(ValidationError::DuplicatePartitionName(name.to_string()));
            } else {
                seen.push(name);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = ServerConfig::default();
        config.storage.root = String::new();
        config.partitions.queue_partitions = "ok,Bad,ok".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyStorageRoot));
        assert!(errors.contains(&ValidationError::InvalidPartitionName("Bad".to_string())));
        assert!(errors.contains(&ValidationError::DuplicatePartitionName("ok".to_string())));
    }

    #[test]
    fn test_empty_partition_csv_is_valid() {
        let mut config = ServerConfig::default();
        config.partitions.queue_partitions = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
