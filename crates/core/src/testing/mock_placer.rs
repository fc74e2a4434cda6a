//! Mock placer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::placer::{PlacedFile, PlannedOperation, Placer, PlacerError};

/// A recorded operation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPlacement {
    /// The operation that was submitted.
    pub operation: PlannedOperation,
    /// Whether the placement succeeded.
    pub success: bool,
}

/// Mock implementation of the Placer trait.
///
/// Never touches the file system. Provides controllable behavior for testing:
/// - Track operations for assertions
/// - Fail the next operation, or every operation targeting a destination
/// - Fail root validation
///
/// # Example
///
/// ```rust,ignore
/// use shelver_core::testing::MockPlacer;
///
/// let placer = MockPlacer::new();
/// placer.fail_destination("/library/Art/Alb/Song.mp3").await;
///
/// let outcome = PlanExecutor::new(&placer).execute(&operations, true).await;
///
/// let placements = placer.recorded_placements().await;
/// assert!(!placements[0].success);
/// ```
#[derive(Debug, Default)]
pub struct MockPlacer {
    /// Recorded placements.
    placements: Arc<RwLock<Vec<RecordedPlacement>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<PlacerError>>>,
    /// Destinations that always fail.
    failing_destinations: Arc<RwLock<HashSet<PathBuf>>>,
    /// If set, validation fails.
    invalid_root: Arc<RwLock<bool>>,
}

impl MockPlacer {
    /// Create a new mock placer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded placements.
    pub async fn recorded_placements(&self) -> Vec<RecordedPlacement> {
        self.placements.read().await.clone()
    }

    /// Get the number of placements attempted.
    pub async fn placement_count(&self) -> usize {
        self.placements.read().await.len()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: PlacerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every operation targeting `destination` fail.
    pub async fn fail_destination(&self, destination: impl Into<PathBuf>) {
        self.failing_destinations
            .write()
            .await
            .insert(destination.into());
    }

    /// Make [`Placer::validate`] reject any root.
    pub async fn set_invalid_root(&self, invalid: bool) {
        *self.invalid_root.write().await = invalid;
    }

    async fn take_error(&self, operation: &PlannedOperation) -> Option<PlacerError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Some(err);
        }
        if self
            .failing_destinations
            .read()
            .await
            .contains(&operation.destination)
        {
            return Some(PlacerError::DestinationExists {
                path: operation.destination.clone(),
            });
        }
        None
    }
}

#[async_trait]
impl Placer for MockPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn place(&self, operation: &PlannedOperation) -> Result<PlacedFile, PlacerError> {
        if let Some(err) = self.take_error(operation).await {
            self.placements.write().await.push(RecordedPlacement {
                operation: operation.clone(),
                success: false,
            });
            return Err(err);
        }

        self.placements.write().await.push(RecordedPlacement {
            operation: operation.clone(),
            success: true,
        });

        Ok(PlacedFile {
            destination: operation.destination.clone(),
            size_bytes: operation.size,
            checksum: operation.fingerprint,
        })
    }

    async fn validate(&self, dest_root: &Path) -> Result<(), PlacerError> {
        if *self.invalid_root.read().await {
            return Err(PlacerError::InvalidDestinationRoot {
                path: dest_root.to_path_buf(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlacementMode;

    fn operation(name: &str) -> PlannedOperation {
        PlannedOperation {
            action: PlacementMode::Copy,
            source: PathBuf::from(format!("/in/{name}")),
            destination: PathBuf::from(format!("/out/{name}")),
            relative: PathBuf::from(name),
            size: 10,
            fingerprint: None,
        }
    }

    #[tokio::test]
    async fn test_records_placements() {
        let placer = MockPlacer::new();

        placer.place(&operation("a.mp3")).await.unwrap();
        placer.place(&operation("b.mp3")).await.unwrap();

        let placements = placer.recorded_placements().await;
        assert_eq!(placements.len(), 2);
        assert!(placements[0].success);
        assert_eq!(placements[1].operation.relative, PathBuf::from("b.mp3"));
    }

    #[tokio::test]
    async fn test_error_injection_consumed() {
        let placer = MockPlacer::new();
        placer
            .set_next_error(PlacerError::SourceNotFound {
                path: PathBuf::from("/in/a.mp3"),
            })
            .await;

        assert!(placer.place(&operation("a.mp3")).await.is_err());
        assert!(placer.place(&operation("a.mp3")).await.is_ok());

        let placements = placer.recorded_placements().await;
        assert!(!placements[0].success);
        assert!(placements[1].success);
    }

    #[tokio::test]
    async fn test_failing_destination() {
        let placer = MockPlacer::new();
        placer.fail_destination("/out/b.mp3").await;

        assert!(placer.place(&operation("a.mp3")).await.is_ok());
        assert!(placer.place(&operation("b.mp3")).await.is_err());
        assert_eq!(placer.placement_count().await, 2);
    }

    #[tokio::test]
    async fn test_invalid_root() {
        let placer = MockPlacer::new();
        assert!(placer.validate(Path::new("/out")).await.is_ok());

        placer.set_invalid_root(true).await;
        assert!(placer.validate(Path::new("/out")).await.is_err());
    }
}
