//! File system placer implementation.

use async_trait::async_trait;
use filetime::FileTime;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, warn};
use uuid::Uuid;

use super::config::PlacerConfig;
use super::error::PlacerError;
use super::traits::Placer;
use super::types::{PlacedFile, PlannedOperation};
use crate::config::PlacementMode;
use crate::identity::ContentDigest;

/// Result of trying to hard-link a file onto its destination.
enum LinkOutcome {
    Linked,
    Occupied,
    CrossDevice,
    Unsupported(std::io::Error),
}

/// File system based placer implementation.
///
/// Copies go to a hidden temporary sibling first and are committed with a
/// hard link, which fails instead of replacing an existing destination. A
/// destination is therefore either absent or complete, and never clobbered.
pub struct FsPlacer {
    config: PlacerConfig,
}

impl FsPlacer {
    /// Creates a new file system placer with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self { config }
    }

    /// Creates a placer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlacerConfig::default())
    }

    fn is_cross_device(e: &std::io::Error) -> bool {
        // Cross-filesystem links and renames fail with EXDEV (18 on Linux)
        e.kind() == ErrorKind::CrossesDevices || e.raw_os_error() == Some(18)
    }

    /// Whether anything, including a dangling symlink, occupies `path`.
    async fn is_occupied(path: &Path) -> bool {
        match fs::symlink_metadata(path).await {
            Ok(_) => true,
            Err(e) => e.kind() != ErrorKind::NotFound,
        }
    }

    fn temp_path_for(destination: &Path) -> PathBuf {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        destination.with_file_name(format!(".{}.{}.incoming", name, Uuid::new_v4().simple()))
    }

    async fn try_link(from: &Path, to: &Path) -> LinkOutcome {
        match fs::hard_link(from, to).await {
            Ok(()) => LinkOutcome::Linked,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => LinkOutcome::Occupied,
            Err(e) if Self::is_cross_device(&e) => LinkOutcome::CrossDevice,
            Err(e) => LinkOutcome::Unsupported(e),
        }
    }

    /// Creates parent directories for a path.
    async fn ensure_parent_dir(path: &Path) -> Result<(), PlacerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PlacerError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Copies file content into a new file, optionally hashing it on the way.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        calculate_checksum: bool,
    ) -> Result<(u64, Option<ContentDigest>), PlacerError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        let dest_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .await
            .map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);

        let mut hasher = if calculate_checksum {
            Some(Sha256::new())
        } else {
            None
        };

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            if let Some(ref mut h) = hasher {
                h.update(&buffer[..bytes_read]);
            }

            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
        writer.get_ref().sync_all().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let checksum = hasher.map(|h| ContentDigest::from_bytes(h.finalize().into()));

        Ok((total_bytes, checksum))
    }

    /// Carries permissions and timestamps over from `source`.
    async fn copy_metadata(&self, source: &Path, destination: &Path) -> Result<(), PlacerError> {
        let meta = fs::metadata(source).await?;
        fs::set_permissions(destination, meta.permissions()).await?;

        if self.config.preserve_timestamps {
            let atime = FileTime::from_last_access_time(&meta);
            let mtime = FileTime::from_last_modification_time(&meta);
            filetime::set_file_times(destination, atime, mtime)?;
        }
        Ok(())
    }

    /// Writes a complete, verified copy of the source at `temp`.
    async fn write_temp_copy(
        &self,
        operation: &PlannedOperation,
        temp: &Path,
    ) -> Result<(u64, Option<ContentDigest>), PlacerError> {
        let verify = self.config.verify_checksums && operation.fingerprint.is_some();
        let (size, checksum) = self.copy_file(&operation.source, temp, verify).await?;

        if let (Some(expected), Some(actual)) = (operation.fingerprint, checksum) {
            if expected != actual {
                return Err(PlacerError::ChecksumMismatch {
                    path: operation.destination.clone(),
                    expected: expected.to_hex(),
                    actual: actual.to_hex(),
                });
            }
        }

        self.copy_metadata(&operation.source, temp).await?;
        Ok((size, checksum))
    }

    /// Moves a finished temporary file onto the destination without replacing it.
    async fn commit_temp(temp: &Path, destination: &Path) -> Result<(), PlacerError> {
        match Self::try_link(temp, destination).await {
            LinkOutcome::Linked => {
                if let Err(e) = fs::remove_file(temp).await {
                    warn!("Failed to remove temporary file {}: {}", temp.display(), e);
                }
                Ok(())
            }
            LinkOutcome::Occupied => Err(PlacerError::DestinationExists {
                path: destination.to_path_buf(),
            }),
            LinkOutcome::CrossDevice | LinkOutcome::Unsupported(_) => {
                // No hard links on this filesystem: check, then rename
                if Self::is_occupied(destination).await {
                    return Err(PlacerError::DestinationExists {
                        path: destination.to_path_buf(),
                    });
                }
                fs::rename(temp, destination).await.map_err(|e| {
                    PlacerError::move_failed(temp.to_path_buf(), destination.to_path_buf(), e)
                })
            }
        }
    }

    /// Copy through a temporary sibling, then commit.
    async fn copy_via_temp(&self, operation: &PlannedOperation) -> Result<PlacedFile, PlacerError> {
        let temp = Self::temp_path_for(&operation.destination);

        let copied = match self.write_temp_copy(operation, &temp).await {
            Ok(copied) => copied,
            Err(e) => {
                let _ = fs::remove_file(&temp).await;
                return Err(e);
            }
        };

        if let Err(e) = Self::commit_temp(&temp, &operation.destination).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e);
        }

        let (size_bytes, checksum) = copied;
        Ok(PlacedFile {
            destination: operation.destination.clone(),
            size_bytes,
            checksum,
        })
    }

    /// Copy, then delete the source. Used when a rename cannot cross volumes.
    async fn copy_then_delete(
        &self,
        operation: &PlannedOperation,
    ) -> Result<PlacedFile, PlacerError> {
        debug!(
            "Cross-device move of {}, falling back to copy",
            operation.source.display()
        );
        let placed = self.copy_via_temp(operation).await?;
        fs::remove_file(&operation.source)
            .await
            .map_err(|e| PlacerError::CleanupFailed {
                path: operation.source.clone(),
                source: e,
            })?;
        Ok(placed)
    }

    async fn move_file(&self, operation: &PlannedOperation) -> Result<PlacedFile, PlacerError> {
        let source = &operation.source;
        let destination = &operation.destination;

        match Self::try_link(source, destination).await {
            LinkOutcome::Linked => {
                fs::remove_file(source)
                    .await
                    .map_err(|e| PlacerError::CleanupFailed {
                        path: source.clone(),
                        source: e,
                    })?;
            }
            LinkOutcome::Occupied => {
                return Err(PlacerError::DestinationExists {
                    path: destination.clone(),
                });
            }
            LinkOutcome::CrossDevice => return self.copy_then_delete(operation).await,
            LinkOutcome::Unsupported(e) => {
                debug!("Hard link unavailable for {}: {}", source.display(), e);
                if Self::is_occupied(destination).await {
                    return Err(PlacerError::DestinationExists {
                        path: destination.clone(),
                    });
                }
                match fs::rename(source, destination).await {
                    Ok(()) => {}
                    Err(e) if Self::is_cross_device(&e) => {
                        return self.copy_then_delete(operation).await
                    }
                    Err(e) => {
                        return Err(PlacerError::move_failed(
                            source.clone(),
                            destination.clone(),
                            e,
                        ))
                    }
                }
            }
        }

        let meta = fs::metadata(destination).await?;
        Ok(PlacedFile {
            destination: destination.clone(),
            size_bytes: meta.len(),
            checksum: None,
        })
    }
}

#[async_trait]
impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "fs"
    }

    async fn place(&self, operation: &PlannedOperation) -> Result<PlacedFile, PlacerError> {
        if fs::metadata(&operation.source).await.is_err() {
            return Err(PlacerError::SourceNotFound {
                path: operation.source.clone(),
            });
        }

        if Self::is_occupied(&operation.destination).await {
            return Err(PlacerError::DestinationExists {
                path: operation.destination.clone(),
            });
        }

        Self::ensure_parent_dir(&operation.destination).await?;

        match operation.action {
            PlacementMode::Copy => self.copy_via_temp(operation).await,
            PlacementMode::Move => self.move_file(operation).await,
        }
    }

    async fn validate(&self, dest_root: &Path) -> Result<(), PlacerError> {
        match fs::metadata(dest_root).await {
            Ok(meta) if !meta.is_dir() => Err(PlacerError::InvalidDestinationRoot {
                path: dest_root.to_path_buf(),
            }),
            // A missing root is created with the first placement
            _ => Ok(()),
        }
    }
}
