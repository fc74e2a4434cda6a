//! The structured run report.
//!
//! Written on every run, dry-run or not. Field order, group order and entry
//! order are fixed, so with a fixed timestamp two dry runs over the same
//! input and file system state serialize to identical bytes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::config::{PlacementMode, UnknownPolicy};
use crate::executor::{ExecutionOutcome, FailedOperation};
use crate::mapping::{MalformedEntry, MetadataMapping};
use crate::resolver::{
    EntryStatus, Grouping, MissingSource, Resolution, ResolvedGroup, UnplaceableSource,
};

/// Errors that can occur while writing the report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write report to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Aggregate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    /// Every path entry in the input, usable or not.
    pub total_entries: usize,
    pub malformed_entries: usize,
    /// Present entries without a recognizable author or song.
    pub unrecognized_entries: usize,
    pub unique_destinations: usize,
    pub missing_sources: usize,
    pub already_in_place: usize,
    pub fingerprint_unavailable: usize,
    /// Present sources whose destination could not be inspected.
    pub unplaceable_sources: usize,
    pub duplicate_groups: usize,
    pub distinct_duplicates_kept: usize,
    pub identical_duplicates_skipped: usize,
    pub planned_copies: usize,
    pub planned_moves: usize,
    pub copies_performed: usize,
    pub moves_performed: usize,
    pub operations_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub src: PathBuf,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub size: u64,
}

/// One destination key that more than one present source rendered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportGroup {
    pub dest_key: String,
    pub entries: Vec<ReportEntry>,
}

impl From<&ResolvedGroup> for ReportGroup {
    fn from(group: &ResolvedGroup) -> Self {
        Self {
            dest_key: group.key.clone(),
            entries: group
                .entries
                .iter()
                .map(|e| ReportEntry {
                    src: e.source.clone(),
                    status: e.status,
                    dest: e.destination.clone(),
                    sha256: e.fingerprint.map(|d| d.to_hex()),
                    size: e.size,
                })
                .collect(),
        }
    }
}

/// Run parameters echoed at the top of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub generated_at: DateTime<Utc>,
    pub pattern: String,
    pub dest_root: PathBuf,
    pub apply: bool,
    pub mode: PlacementMode,
    pub unknowns: UnknownPolicy,
    pub duplicate_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub pattern: String,
    /// Absolute destination root.
    pub dest_root: PathBuf,
    pub apply: bool,
    pub mode: PlacementMode,
    pub unknowns: UnknownPolicy,
    pub duplicate_token: String,
    pub stats: ReportStats,
    pub groups: Vec<ReportGroup>,
    pub missing_sources: Vec<MissingSource>,
    pub unplaceable_sources: Vec<UnplaceableSource>,
    pub malformed_entries: Vec<MalformedEntry>,
    pub failures: Vec<FailedOperation>,
}

impl Report {
    /// Assembles the report for one run.
    pub fn assemble(
        header: ReportHeader,
        mapping: &MetadataMapping,
        grouping: &Grouping,
        resolution: &Resolution,
        outcome: &ExecutionOutcome,
    ) -> Self {
        let planned_of = |mode: PlacementMode| {
            resolution
                .operations
                .iter()
                .filter(|op| op.action == mode)
                .count()
        };

        let stats = ReportStats {
            total_entries: mapping.total_entries(),
            malformed_entries: mapping.malformed.len(),
            unrecognized_entries: grouping.candidates().filter(|c| c.unrecognized).count(),
            unique_destinations: grouping.groups.len(),
            missing_sources: grouping.missing.len(),
            already_in_place: resolution.stats.already_in_place,
            fingerprint_unavailable: resolution.stats.fingerprint_unavailable,
            unplaceable_sources: resolution.stats.unplaceable,
            duplicate_groups: resolution.stats.duplicate_groups,
            distinct_duplicates_kept: resolution.stats.distinct_duplicates_kept,
            identical_duplicates_skipped: resolution.stats.identical_duplicates_skipped,
            planned_copies: planned_of(PlacementMode::Copy),
            planned_moves: planned_of(PlacementMode::Move),
            copies_performed: outcome.copies_performed,
            moves_performed: outcome.moves_performed,
            operations_failed: outcome.failures.len(),
        };

        Self {
            generated_at: header.generated_at,
            pattern: header.pattern,
            dest_root: header.dest_root,
            apply: header.apply,
            mode: header.mode,
            unknowns: header.unknowns,
            duplicate_token: header.duplicate_token,
            stats,
            groups: resolution
                .groups
                .iter()
                .filter(|g| g.is_duplicate())
                .map(ReportGroup::from)
                .collect(),
            missing_sources: grouping.missing.clone(),
            unplaceable_sources: resolution.unplaceable.clone(),
            malformed_entries: mapping.malformed.clone(),
            failures: outcome.failures.clone(),
        }
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, ReportError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Writes `report` to `path` through a temporary sibling and a rename, so
/// readers never observe a partial report.
pub async fn write_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let json = report.to_json()?;
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).await.map_err(write_err)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.json".to_string());
    let temp = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    if let Err(e) = fs::write(&temp, json.as_bytes()).await {
        let _ = fs::remove_file(&temp).await;
        return Err(write_err(e));
    }
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(write_err(e));
    }

    info!("Report written to {}", path.display());
    Ok(())
}
