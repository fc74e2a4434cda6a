//! Trait definitions for the placer module.

use async_trait::async_trait;
use std::path::Path;

use super::error::PlacerError;
use super::types::{PlacedFile, PlannedOperation};

/// The copy/move capability the plan executor drives.
///
/// Implementations must never overwrite an existing destination.
#[async_trait]
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Performs one planned operation.
    async fn place(&self, operation: &PlannedOperation) -> Result<PlacedFile, PlacerError>;

    /// Validates that files can be placed under `dest_root`.
    async fn validate(&self, dest_root: &Path) -> Result<(), PlacerError>;
}
