//! Blob protocol path grammar.
//!
//! ```text
//! /camli/<action>                      main partition
//! /partition-<name>/camli/<action>     named partition
//! ```
//!
//! The *first* occurrence of the protocol marker decides the split; a
//! marker-looking substring later in the path (say inside an action
//! argument) must not shift the parse. Pure function, no side effects.

use crate::partition::is_valid_partition_name;

use super::error::RequestError;

/// Protocol marker. Bit-exact on the wire.
pub const CAMLI_PREFIX: &str = "/camli/";

/// Partition prefix token. Bit-exact on the wire.
pub const PARTITION_PREFIX: &str = "/partition-";

/// A parsed blob request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPath {
    /// Empty for the main partition.
    pub partition: String,
    /// Everything after the marker; for plain GETs this is the blob
    /// reference itself.
    pub action: String,
}

/// Parse a raw URL path into `(partition name, action)`.
pub fn parse_blob_path(path: &str) -> Result<BlobPath, RequestError> {
    let idx = path.find(CAMLI_PREFIX).ok_or(RequestError::InvalidPath)?;
    let action = path[idx + CAMLI_PREFIX.len()..].to_string();
    if idx == 0 {
        return Ok(BlobPath {
            partition: String::new(),
            action,
        });
    }
    if !path.starts_with(PARTITION_PREFIX) {
        return Err(RequestError::InvalidPath);
    }
    let partition = &path[PARTITION_PREFIX.len()..idx];
    if !is_valid_partition_name(partition) {
        return Err(RequestError::InvalidPath);
    }
    Ok(BlobPath {
        partition: partition.to_string(),
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(path: &str) -> (String, String) {
        let p = parse_blob_path(path).unwrap();
        (p.partition, p.action)
    }

    #[test]
    fn test_main_partition_paths() {
        assert_eq!(
            parse_ok("/camli/enumerate-blobs"),
            ("".into(), "enumerate-blobs".into())
        );
        assert_eq!(parse_ok("/camli/"), ("".into(), "".into()));
        assert_eq!(
            parse_ok("/camli/sha1-0beec7b5ea3f"),
            ("".into(), "sha1-0beec7b5ea3f".into())
        );
    }

    #[test]
    fn test_named_partition_paths() {
        assert_eq!(
            parse_ok("/partition-foo/camli/stat"),
            ("foo".into(), "stat".into())
        );
        assert_eq!(
            parse_ok("/partition-queue-indexer/camli/upload"),
            ("queue-indexer".into(), "upload".into())
        );
    }

    #[test]
    fn test_marker_absent_fails() {
        for path in ["/nonsense", "/", "", "/camli", "/partition-foo/stat"] {
            assert_eq!(parse_blob_path(path), Err(RequestError::InvalidPath), "{path:?}");
        }
    }

    #[test]
    fn test_bogus_prefix_fails() {
        assert_eq!(
            parse_blob_path("/bogus-foo/camli/stat"),
            Err(RequestError::InvalidPath)
        );
        assert_eq!(
            parse_blob_path("/x/partition-foo/camli/stat"),
            Err(RequestError::InvalidPath)
        );
    }

    #[test]
    fn test_invalid_partition_token_fails() {
        assert_eq!(
            parse_blob_path("/partition-/camli/stat"),
            Err(RequestError::InvalidPath)
        );
        assert_eq!(
            parse_blob_path("/partition-UPPER/camli/stat"),
            Err(RequestError::InvalidPath)
        );
    }

    #[test]
    fn test_first_marker_occurrence_wins() {
        // a second marker-looking substring stays inside the action
        assert_eq!(
            parse_ok("/camli/weird/camli/rest"),
            ("".into(), "weird/camli/rest".into())
        );
        assert_eq!(
            parse_ok("/partition-a/camli/x/camli/y"),
            ("a".into(), "x/camli/y".into())
        );
    }
}
