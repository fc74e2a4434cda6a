//! Types for the placer module.

use serde::Serialize;
use std::path::PathBuf;

use crate::config::PlacementMode;
use crate::identity::ContentDigest;

/// One file transfer decided during planning.
///
/// Built once by the collision resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOperation {
    /// Copy or move.
    pub action: PlacementMode,
    /// Source file path, as given in the input mapping.
    pub source: PathBuf,
    /// Absolute destination path, unoccupied at resolution time.
    pub destination: PathBuf,
    /// Destination relative to the destination root.
    pub relative: PathBuf,
    /// Source size in bytes.
    pub size: u64,
    /// Source fingerprint, when one was computed.
    #[serde(skip)]
    pub fingerprint: Option<ContentDigest>,
}

/// Information about a placed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedFile {
    /// Final destination path.
    pub destination: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Digest of the bytes written, if they were hashed while copying.
    pub checksum: Option<ContentDigest>,
}
