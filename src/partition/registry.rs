//! Partition registry construction and lookup.
//!
//! # Responsibilities
//! - Collect partition definitions during startup
//! - Build queue (mirror) partitions from configuration
//! - Freeze into an immutable registry once the bind address is known
//!
//! # Design Decisions
//! - Two-phase initialization: partitions are declared before the server
//!   knows its base URL, and `finalize` back-fills `urlbase` exactly once
//! - Duplicate names are a configuration error, surfaced before serving
//! - The frozen registry has no interior mutability, so `lookup` is safe
//!   under unbounded concurrency without locks

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::{is_valid_partition_name, Partition};

/// Errors raised while assembling the registry. All of them are fatal
/// configuration errors; none can occur during request handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate partition name {0:?}")]
    Duplicate(String),

    #[error("invalid partition name {0:?}")]
    InvalidName(String),
}

/// Declaration of a non-main partition, before `urlbase` is known.
#[derive(Debug, Clone)]
pub struct PartitionSpec {
    pub name: String,
    pub writable: bool,
    pub readable: bool,
    pub is_queue: bool,
}

/// Mutable collection phase of the registry lifecycle.
///
/// Consumed by [`RegistryBuilder::finalize`]; there is no way to add or
/// change partitions once the server is serving traffic.
pub struct RegistryBuilder {
    extra: Vec<PartitionSpec>,
    mirror_names: Vec<String>,
}

impl RegistryBuilder {
    /// Start a registry containing only the main partition.
    pub fn new() -> Self {
        RegistryBuilder {
            extra: Vec::new(),
            mirror_names: Vec::new(),
        }
    }

    fn name_taken(&self, name: &str) -> bool {
        self.extra.iter().any(|s| s.name == name) || self.mirror_names.iter().any(|n| n == name)
    }

    /// Register a non-main partition by name.
    pub fn register(&mut self, spec: PartitionSpec) -> Result<(), RegistryError> {
        if !is_valid_partition_name(&spec.name) {
            return Err(RegistryError::InvalidName(spec.name));
        }
        if self.name_taken(&spec.name) {
            return Err(RegistryError::Duplicate(spec.name));
        }
        self.extra.push(spec);
        Ok(())
    }

    /// Declare queue partitions from a comma-separated configuration
    /// string. Each becomes a read-only queue mirror of the main
    /// partition; an empty string declares none.
    pub fn build_mirrors(&mut self, csv: &str) -> Result<(), RegistryError> {
        if csv.is_empty() {
            return Ok(());
        }
        for name in csv.split(',') {
            if !is_valid_partition_name(name) {
                return Err(RegistryError::InvalidName(name.to_string()));
            }
            if self.name_taken(name) {
                return Err(RegistryError::Duplicate(name.to_string()));
            }
            self.mirror_names.push(name.to_string());
        }
        Ok(())
    }

    /// Freeze the registry, back-filling `urlbase` now that the listener
    /// address is known. Runs exactly once, between bind and serve.
    pub fn finalize(self, base_url: &str) -> PartitionRegistry {
        let base = base_url.trim_end_matches('/').to_string();

        let mirrors: Vec<Arc<Partition>> = self
            .mirror_names
            .iter()
            .map(|name| {
                Arc::new(Partition {
                    name: name.clone(),
                    writable: false,
                    readable: true,
                    is_queue: true,
                    mirrors: Vec::new(),
                    urlbase: format!("{base}/partition-{name}"),
                })
            })
            .collect();

        let main = Arc::new(Partition {
            name: String::new(),
            writable: true,
            readable: true,
            is_queue: false,
            mirrors: mirrors.clone(),
            urlbase: base.clone(),
        });

        let mut by_name: HashMap<String, Arc<Partition>> = HashMap::new();
        by_name.insert(String::new(), main.clone());
        for m in mirrors {
            by_name.insert(m.name.clone(), m);
        }
        for spec in self.extra {
            by_name.insert(
                spec.name.clone(),
                Arc::new(Partition {
                    urlbase: format!("{base}/partition-{}", spec.name),
                    name: spec.name,
                    writable: spec.writable,
                    readable: spec.readable,
                    is_queue: spec.is_queue,
                    mirrors: Vec::new(),
                }),
            );
        }

        PartitionRegistry { main, by_name }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable name → partition mapping, shared across request tasks.
pub struct PartitionRegistry {
    main: Arc<Partition>,
    by_name: HashMap<String, Arc<Partition>>,
}

impl PartitionRegistry {
    /// Resolve a partition by name. The empty name resolves to the main
    /// partition.
    pub fn lookup(&self, name: &str) -> Option<Arc<Partition>> {
        self.by_name.get(name).cloned()
    }

    pub fn main(&self) -> Arc<Partition> {
        self.main.clone()
    }
}
