//! Partition model subsystem.
//!
//! # Data Flow
//! ```text
//! Config (queue partition CSV)
//!     → RegistryBuilder (register, build_mirrors)
//!     → bind listener (base URL becomes known)
//!     → finalize(base_url) back-fills urlbase
//!     → PartitionRegistry (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Registry is built single-threaded at startup; lookups never lock
//! - finalize consumes the builder, so mutation after serve is a type error
//! - Mirror partitions are registered by name so partition-prefixed
//!   request paths resolve to them

pub mod registry;

pub use registry::{PartitionRegistry, RegistryBuilder, RegistryError};

use std::sync::Arc;

/// A named routing and access-control scope over a storage backend.
///
/// The partition with the empty name is the *main* partition; it is the
/// only one that may carry mirrors.
#[derive(Debug)]
pub struct Partition {
    /// Unique name within a registry. Empty string is the main partition.
    pub name: String,

    /// Whether uploads and legacy puts are accepted.
    pub writable: bool,

    /// Whether blob fetches and enumeration are served.
    pub readable: bool,

    /// Queue partitions are fed from the main partition and drained by
    /// sync consumers.
    pub is_queue: bool,

    /// Queue partitions fed by uploads to this partition. Only ever
    /// non-empty on the main partition.
    pub mirrors: Vec<Arc<Partition>>,

    /// Externally reachable base URL. Empty until the registry is
    /// finalized with the bound listener address.
    pub urlbase: String,
}

impl Partition {
    pub fn is_main(&self) -> bool {
        self.name.is_empty()
    }

    /// A synthetic partition for a mounted backend (write-only in the
    /// reference configuration; callers may flip the flags).
    pub fn synthetic(name: &str, urlbase: String) -> Self {
        Partition {
            name: name.to_string(),
            writable: true,
            readable: false,
            is_queue: false,
            mirrors: Vec::new(),
            urlbase,
        }
    }
}

/// Validity predicate for non-main partition names.
///
/// Names appear between the partition-prefix token and the protocol
/// marker in request paths, so slashes and anything that could be
/// mistaken for either token are rejected.
pub fn is_valid_partition_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        && !name.starts_with("partition-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_partition_names() {
        assert!(is_valid_partition_name("queue-indexer"));
        assert!(is_valid_partition_name("a"));
        assert!(is_valid_partition_name("mirror_2"));
    }

    #[test]
    fn test_invalid_partition_names() {
        assert!(!is_valid_partition_name(""));
        assert!(!is_valid_partition_name("has/slash"));
        assert!(!is_valid_partition_name("Upper"));
        assert!(!is_valid_partition_name("partition-x"));
        assert!(!is_valid_partition_name("sp ace"));
    }

    #[test]
    fn test_main_partition_detection() {
        let p = Partition {
            name: String::new(),
            writable: true,
            readable: true,
            is_queue: false,
            mirrors: Vec::new(),
            urlbase: String::new(),
        };
        assert!(p.is_main());
        assert!(!Partition::synthetic("indexer", String::new()).is_main());
    }
}
