//! Configuration for the placer module.

use serde::{Deserialize, Serialize};

use crate::config::OrganizerConfig;

/// Configuration for the file system placer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether to hash copied bytes and compare against the source fingerprint.
    #[serde(default)]
    pub verify_checksums: bool,

    /// Whether copies keep the source's modification and access times.
    #[serde(default = "default_true")]
    pub preserve_timestamps: bool,
}

fn default_buffer_size() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_true() -> bool {
    true
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            verify_checksums: false,
            preserve_timestamps: true,
        }
    }
}

impl PlacerConfig {
    /// Enables checksum verification.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

impl From<&OrganizerConfig> for PlacerConfig {
    fn from(config: &OrganizerConfig) -> Self {
        Self::default()
            .with_buffer_size(config.buffer_size)
            .with_checksum_verification(config.verify_copies)
    }
}
