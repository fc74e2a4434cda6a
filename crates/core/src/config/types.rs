use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration file layout.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub organizer: OrganizerConfig,
}

/// Everything one organizer run needs to know.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganizerConfig {
    /// Root of the destination tree.
    #[serde(default = "default_dest_root")]
    pub dest_root: PathBuf,
    /// Destination pattern, e.g. `%A/%L/%S`.
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Perform the operations instead of only reporting them.
    #[serde(default)]
    pub apply: bool,
    /// Copy or move sources into place.
    #[serde(default)]
    pub mode: PlacementMode,
    /// What to do with metadata values that are unknown.
    #[serde(default)]
    pub unknowns: UnknownPolicy,
    /// Literal inserted between the base stem and the source basename
    /// when a second distinct content shares a destination.
    #[serde(default = "default_duplicate_token")]
    pub duplicate_token: String,
    /// Where the structured report is written.
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
    /// Maximum number of files hashed concurrently.
    #[serde(default = "default_fingerprint_concurrency")]
    pub fingerprint_concurrency: usize,
    /// Read buffer size for hashing and copying, in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Re-hash copied bytes and compare them to the source fingerprint.
    #[serde(default)]
    pub verify_copies: bool,
}

/// How a planned operation transfers the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    #[default]
    Copy,
    Move,
}

impl PlacementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }
}

impl std::fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handling of unknown metadata values while rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Blank unknown values and remove components that end up empty.
    #[default]
    Drop,
    /// Render unknown values literally (`Unknown Album`, `Unknown`).
    Keep,
}

impl UnknownPolicy {
    pub fn drops(&self) -> bool {
        matches!(self, Self::Drop)
    }
}

fn default_dest_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_pattern() -> String {
    "%A/%L/%S".to_string()
}

fn default_duplicate_token() -> String {
    "_duplicate_".to_string()
}

fn default_report_path() -> PathBuf {
    PathBuf::from("shelver-report.json")
}

fn default_fingerprint_concurrency() -> usize {
    4
}

fn default_buffer_size() -> usize {
    1024 * 1024 // 1 MiB
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            dest_root: default_dest_root(),
            pattern: default_pattern(),
            apply: false,
            mode: PlacementMode::Copy,
            unknowns: UnknownPolicy::Drop,
            duplicate_token: default_duplicate_token(),
            report_path: default_report_path(),
            fingerprint_concurrency: default_fingerprint_concurrency(),
            buffer_size: default_buffer_size(),
            verify_copies: false,
        }
    }
}

impl OrganizerConfig {
    pub fn with_dest_root(mut self, dest_root: impl Into<PathBuf>) -> Self {
        self.dest_root = dest_root.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_apply(mut self, apply: bool) -> Self {
        self.apply = apply;
        self
    }

    pub fn with_mode(mut self, mode: PlacementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_unknowns(mut self, unknowns: UnknownPolicy) -> Self {
        self.unknowns = unknowns;
        self
    }

    pub fn with_duplicate_token(mut self, token: impl Into<String>) -> Self {
        self.duplicate_token = token.into();
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    pub fn with_fingerprint_concurrency(mut self, concurrency: usize) -> Self {
        self.fingerprint_concurrency = concurrency;
        self
    }

    pub fn with_verify_copies(mut self, enabled: bool) -> Self {
        self.verify_copies = enabled;
        self
    }
}
