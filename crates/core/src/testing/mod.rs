//! Testing utilities and mock implementations.
//!
//! [`MockPlacer`] stands in for the file system placer so executor and
//! organizer behavior can be asserted without touching a destination tree.
//! The [`fixtures`] module builds source trees and mapping files on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use shelver_core::testing::{fixtures, MockPlacer};
//!
//! let temp = tempfile::TempDir::new()?;
//! let source = fixtures::source_file(temp.path(), "in/a.mp3", b"bytes");
//! let mapping = fixtures::write_mapping(temp.path(), &[(source, fixtures::record("A", "B", "C"))]);
//!
//! let organizer = Organizer::with_placer(config, MockPlacer::new());
//! ```

mod mock_placer;

pub use mock_placer::{MockPlacer, RecordedPlacement};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::mapping::MetadataRecord;

    /// Record with only the three core fields set.
    pub fn record(author: &str, album: &str, song: &str) -> MetadataRecord {
        MetadataRecord::new(author, album, song)
    }

    /// Writes `content` to `root/relative`, creating parent directories.
    pub fn source_file(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture directory");
        }
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Writes a mapping file for `entries` under `root` and returns its path.
    /// Key order in the file follows `entries`.
    pub fn write_mapping(root: &Path, entries: &[(PathBuf, MetadataRecord)]) -> PathBuf {
        let mut object = serde_json::Map::new();
        for (source, record) in entries {
            let value = serde_json::to_value(record).expect("serialize fixture record");
            object.insert(source.to_string_lossy().into_owned(), value);
        }
        let path = root.join("mapping.json");
        let json = serde_json::to_string_pretty(&serde_json::Value::Object(object))
            .expect("serialize fixture mapping");
        std::fs::write(&path, json).expect("write fixture mapping");
        path
    }
}
