//! Grouping sources by their case-insensitive rendered destination.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::mapping::MappingEntry;
use crate::pattern::{render, Pattern, RenderedPath};

/// One present source with its rendered destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Position of the entry in the input mapping.
    pub position: usize,
    pub source: PathBuf,
    pub size: u64,
    pub rendered: RenderedPath,
    /// Lower-cased source extension including the dot, or empty.
    pub extension: String,
    /// Whether the record lacks a recognizable author or song.
    pub unrecognized: bool,
}

impl Candidate {
    /// Case-insensitive destination key.
    pub fn key(&self) -> String {
        self.rendered.key(&self.extension)
    }

    pub fn relative_path(&self) -> PathBuf {
        self.rendered.relative_path(&self.extension)
    }
}

/// All present sources sharing one destination key, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementGroup {
    pub key: String,
    pub members: Vec<Candidate>,
}

impl PlacementGroup {
    /// The first member; its rendered path is the group's base path.
    pub fn base(&self) -> &Candidate {
        &self.members[0]
    }

    /// More than one source wants this destination.
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }
}

/// A mapping entry whose source could not be statted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingSource {
    pub source: PathBuf,
    pub reason: String,
}

/// Output of grouping: groups in first-appearance order plus missing sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    pub groups: Vec<PlacementGroup>,
    pub missing: Vec<MissingSource>,
}

impl Grouping {
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.groups.iter().flat_map(|g| g.members.iter())
    }
}

/// Lower-cased extension of `path` with its leading dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Stats each source, renders its destination and groups by key.
///
/// Sources that cannot be statted, or are not regular files, are reported
/// as missing and take no further part in the run.
pub async fn group_sources(
    entries: &[MappingEntry],
    pattern: &Pattern,
    drop_unknown: bool,
) -> Grouping {
    let mut grouping = Grouping::default();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for (position, entry) in entries.iter().enumerate() {
        let size = match fs::metadata(&entry.source).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => {
                warn!("Source is not a regular file: {}", entry.source.display());
                grouping.missing.push(MissingSource {
                    source: entry.source.clone(),
                    reason: "not a regular file".to_string(),
                });
                continue;
            }
            Err(e) => {
                warn!("Missing source {}: {}", entry.source.display(), e);
                grouping.missing.push(MissingSource {
                    source: entry.source.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let candidate = Candidate {
            position,
            source: entry.source.clone(),
            size,
            rendered: render(&entry.record, pattern, drop_unknown),
            extension: extension_of(&entry.source),
            unrecognized: entry.record.is_unknown(),
        };
        let key = candidate.key();
        debug!("{} -> {}", entry.source.display(), key);

        match index_by_key.get(&key) {
            Some(&index) => grouping.groups[index].members.push(candidate),
            None => {
                index_by_key.insert(key.clone(), grouping.groups.len());
                grouping.groups.push(PlacementGroup {
                    key,
                    members: vec![candidate],
                });
            }
        }
    }

    grouping
}
