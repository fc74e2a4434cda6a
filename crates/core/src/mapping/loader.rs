//! Reading the recognition mapping file.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::MappingError;
use super::types::{MalformedEntry, MappingEntry, MetadataMapping, MetadataRecord};

/// Load a mapping file: a JSON object from source path to metadata record.
pub async fn load_mapping(path: &Path) -> Result<MetadataMapping, MappingError> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MappingError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            MappingError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    parse_mapping(&contents)
}

/// Parse mapping JSON, preserving the document's key order.
///
/// Keys starting with `$` (such as `$schema`) are document metadata and are
/// skipped. Entries whose value is not a usable record are collected as
/// malformed instead of failing the whole parse.
pub fn parse_mapping(json: &str) -> Result<MetadataMapping, MappingError> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Object(object) = document else {
        return Err(MappingError::NotAnObject);
    };

    let mut mapping = MetadataMapping::default();

    for (key, value) in object {
        if key.starts_with('$') {
            debug!("Skipping mapping metadata key {}", key);
            continue;
        }

        if !value.is_object() {
            warn!("Skipping malformed mapping entry {}: not an object", key);
            mapping.malformed.push(MalformedEntry {
                key,
                reason: "entry is not a JSON object".to_string(),
            });
            continue;
        }

        match serde_json::from_value::<MetadataRecord>(value) {
            Ok(record) => mapping.entries.push(MappingEntry {
                source: PathBuf::from(key),
                record,
            }),
            Err(e) => {
                warn!("Skipping malformed mapping entry {}: {}", key, e);
                mapping.malformed.push(MalformedEntry {
                    key,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(mapping)
}
