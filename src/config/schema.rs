//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! blob server. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the blob server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Storage backend settings.
    pub storage: StorageConfig,

    /// Partition layout.
    pub partitions: PartitionsConfig,

    /// Credential settings.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Dev indexer mount.
    pub indexer: IndexerConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3179").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes. Slightly above the blob
    /// upload cap to leave room for multipart framing.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3179".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 33 * 1024 * 1024,
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for the local-disk backend.
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "/tmp/blobroot".to_string(),
        }
    }
}

/// Partition layout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PartitionsConfig {
    /// Comma-separated queue partition names, fed from uploads to the
    /// main partition. Typically one for the indexer and one per
    /// mirror syncer.
    pub queue_partitions: String,
}

impl Default for PartitionsConfig {
    fn default() -> Self {
        Self {
            queue_partitions: "queue-indexer".to_string(),
        }
    }
}

/// Credential configuration. The password itself arrives out of band
/// (environment variable or password file), never in this file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Path to a file whose first line is the access password.
    pub password_file: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log every resolved blob request (method, partition, action).
    pub request_log: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            request_log: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Dev indexer mount configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Mount an in-memory indexer sink at /indexer.
    pub enabled: bool,

    /// Database name a real indexer deployment would use.
    pub database: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            database: "devblobindex".to_string(),
        }
    }
}
