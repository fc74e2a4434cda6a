//! Collision resolution: turning destination groups into concrete placements.
//!
//! Within a group, members are visited in input order. A member whose
//! fingerprint matches an earlier member's is skipped. The first distinct
//! member claims the group's base path; later distinct members get the
//! duplicate token plus their own source file stem appended to the base
//! stem. Whatever name is chosen, a `_<n>` suffix is added until it is
//! neither taken on disk nor already claimed earlier in the run. A name
//! whose occupancy cannot be determined (a file standing where a directory
//! is needed, an unsearchable parent) makes the member unplaceable.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use super::group::{Candidate, PlacementGroup};
use crate::config::PlacementMode;
use crate::identity::{ContentDigest, Fingerprint};
use crate::pattern::sanitize;
use crate::placer::PlannedOperation;

/// What the run decided for one group member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    /// A copy or move was planned.
    Planned,
    /// Same content as an earlier member of its group.
    SkippedIdentical,
    /// The source already sits at the destination it would be given.
    AlreadyInPlace,
    /// No destination could be checked for this source.
    Unplaceable,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::SkippedIdentical => "skipped-identical",
            Self::AlreadyInPlace => "already-in-place",
            Self::Unplaceable => "unplaceable",
        }
    }
}

/// The decision for one present source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub source: PathBuf,
    pub status: EntryStatus,
    /// Absolute destination; absent for skipped members.
    pub destination: Option<PathBuf>,
    pub relative: Option<PathBuf>,
    pub size: u64,
    pub fingerprint: Option<ContentDigest>,
}

/// A present source that could not be given a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnplaceableSource {
    pub source: PathBuf,
    /// The candidate destination that could not be inspected.
    pub destination: PathBuf,
    pub reason: String,
}

/// All decisions for one destination key, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    pub key: String,
    pub entries: Vec<ResolvedEntry>,
}

impl ResolvedGroup {
    pub fn is_duplicate(&self) -> bool {
        self.entries.len() > 1
    }
}

/// Counters produced while resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub duplicate_groups: usize,
    pub distinct_duplicates_kept: usize,
    pub identical_duplicates_skipped: usize,
    pub already_in_place: usize,
    pub fingerprint_unavailable: usize,
    pub unplaceable: usize,
}

/// The full placement plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub groups: Vec<ResolvedGroup>,
    /// Planned operations in input order of their groups.
    pub operations: Vec<PlannedOperation>,
    /// Sources whose destination could not be inspected, in input order.
    pub unplaceable: Vec<UnplaceableSource>,
    pub stats: ResolutionStats,
}

enum Claim {
    InPlace { destination: PathBuf, relative: PathBuf },
    Free { destination: PathBuf, relative: PathBuf },
}

/// A candidate name whose occupancy check failed.
struct Blocked {
    destination: PathBuf,
    error: io::Error,
}

/// Assigns final destinations under one destination root.
///
/// Remembers every relative path claimed during the run, compared
/// case-insensitively, so two sources are never given the same destination.
#[derive(Debug)]
pub struct CollisionResolver {
    dest_root: PathBuf,
    duplicate_token: String,
    mode: PlacementMode,
    claimed: HashSet<String>,
}

impl CollisionResolver {
    /// Fails only when `dest_root` cannot be made absolute.
    pub fn new(
        dest_root: &Path,
        duplicate_token: impl Into<String>,
        mode: PlacementMode,
    ) -> io::Result<Self> {
        Ok(Self {
            dest_root: absolute_path(dest_root)?,
            duplicate_token: duplicate_token.into(),
            mode,
            claimed: HashSet::new(),
        })
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Resolves every group.
    ///
    /// `fingerprints` is keyed by [`Candidate::position`]. Members of
    /// duplicate groups without an entry, or with an unavailable one, are
    /// treated as unique.
    pub async fn resolve(
        mut self,
        groups: &[PlacementGroup],
        fingerprints: &HashMap<usize, Fingerprint>,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        resolution.stats.fingerprint_unavailable = fingerprints
            .values()
            .filter(|fp| fp.digest().is_none())
            .count();

        for group in groups {
            let resolved = self.resolve_group(group, fingerprints, &mut resolution).await;
            resolution.groups.push(resolved);
        }

        info!(
            "Resolved {} groups into {} operations ({} already in place, {} identical skipped, {} unplaceable)",
            resolution.groups.len(),
            resolution.operations.len(),
            resolution.stats.already_in_place,
            resolution.stats.identical_duplicates_skipped,
            resolution.stats.unplaceable
        );
        resolution
    }

    async fn resolve_group(
        &mut self,
        group: &PlacementGroup,
        fingerprints: &HashMap<usize, Fingerprint>,
        resolution: &mut Resolution,
    ) -> ResolvedGroup {
        let base = group.base();
        let mut seen: HashSet<ContentDigest> = HashSet::new();
        let mut distinct = 0usize;
        let mut entries = Vec::with_capacity(group.members.len());

        if group.is_duplicate() {
            resolution.stats.duplicate_groups += 1;
        }

        for member in &group.members {
            let fingerprint = fingerprints
                .get(&member.position)
                .and_then(|fp| fp.digest())
                .copied();

            if let Some(digest) = fingerprint {
                if !seen.insert(digest) {
                    debug!(
                        "Skipping {}: identical to an earlier source for {}",
                        member.source.display(),
                        group.key
                    );
                    resolution.stats.identical_duplicates_skipped += 1;
                    entries.push(ResolvedEntry {
                        source: member.source.clone(),
                        status: EntryStatus::SkippedIdentical,
                        destination: None,
                        relative: None,
                        size: member.size,
                        fingerprint,
                    });
                    continue;
                }
            }

            distinct += 1;
            let stem = if distinct == 1 {
                base.rendered.stem().to_string()
            } else {
                self.qualified_stem(base, member)
            };

            let entry = match self
                .claim(base.rendered.directories(), &stem, &member.extension, &member.source)
                .await
            {
                Err(Blocked { destination, error }) => {
                    warn!(
                        "Cannot place {}: failed to inspect {}: {}",
                        member.source.display(),
                        destination.display(),
                        error
                    );
                    resolution.stats.unplaceable += 1;
                    resolution.unplaceable.push(UnplaceableSource {
                        source: member.source.clone(),
                        destination,
                        reason: error.to_string(),
                    });
                    entries.push(ResolvedEntry {
                        source: member.source.clone(),
                        status: EntryStatus::Unplaceable,
                        destination: None,
                        relative: None,
                        size: member.size,
                        fingerprint,
                    });
                    continue;
                }
                Ok(Claim::InPlace {
                    destination,
                    relative,
                }) => {
                    debug!("Already in place: {}", destination.display());
                    resolution.stats.already_in_place += 1;
                    ResolvedEntry {
                        source: member.source.clone(),
                        status: EntryStatus::AlreadyInPlace,
                        destination: Some(destination),
                        relative: Some(relative),
                        size: member.size,
                        fingerprint,
                    }
                }
                Ok(Claim::Free {
                    destination,
                    relative,
                }) => {
                    debug!(
                        "Planned {} {} -> {}",
                        self.mode,
                        member.source.display(),
                        destination.display()
                    );
                    resolution.operations.push(PlannedOperation {
                        action: self.mode,
                        source: member.source.clone(),
                        destination: destination.clone(),
                        relative: relative.clone(),
                        size: member.size,
                        fingerprint,
                    });
                    ResolvedEntry {
                        source: member.source.clone(),
                        status: EntryStatus::Planned,
                        destination: Some(destination),
                        relative: Some(relative),
                        size: member.size,
                        fingerprint,
                    }
                }
            };
            if distinct > 1 {
                resolution.stats.distinct_duplicates_kept += 1;
            }
            entries.push(entry);
        }

        ResolvedGroup {
            key: group.key.clone(),
            entries,
        }
    }

    /// `<base stem><token><sanitized source stem>`.
    fn qualified_stem(&self, base: &Candidate, member: &Candidate) -> String {
        let source_stem = member
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!(
            "{}{}{}",
            base.rendered.stem(),
            self.duplicate_token,
            sanitize(&source_stem)
        )
    }

    async fn claim(
        &mut self,
        directories: &[String],
        stem: &str,
        extension: &str,
        source: &Path,
    ) -> Result<Claim, Blocked> {
        let source_abs = absolute_path(source).unwrap_or_else(|_| normalize_lexically(source));
        let mut n = 1usize;

        loop {
            let file_name = if n == 1 {
                format!("{stem}{extension}")
            } else {
                format!("{stem}_{n}{extension}")
            };
            let mut relative: PathBuf = directories.iter().collect();
            relative.push(&file_name);
            let destination = self.dest_root.join(&relative);
            let key = claim_key(directories, &file_name);

            if destination == source_abs {
                self.claimed.insert(key);
                return Ok(Claim::InPlace {
                    destination,
                    relative,
                });
            }

            if !self.claimed.contains(&key) {
                match is_occupied(&destination).await {
                    Ok(true) => {}
                    Ok(false) => {
                        self.claimed.insert(key);
                        return Ok(Claim::Free {
                            destination,
                            relative,
                        });
                    }
                    Err(error) => return Err(Blocked { destination, error }),
                }
            }

            n += 1;
        }
    }
}

fn claim_key(directories: &[String], file_name: &str) -> String {
    let mut key = String::new();
    for dir in directories {
        key.push_str(dir);
        key.push('/');
    }
    key.push_str(file_name);
    key.to_lowercase()
}

/// Anything at `path`, including a dangling symlink, counts as occupied.
///
/// Errors other than `NotFound` are returned: they repeat for every sibling
/// name, so no suffix would ever get past them.
async fn is_occupied(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Absolute form of `path` with `.` and `..` components folded away.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    Ok(normalize_lexically(&std::path::absolute(path)?))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MetadataRecord;
    use crate::pattern::{render, Pattern};
    use crate::resolver::group::extension_of;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        next_position: usize,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
                next_position: 0,
            }
        }

        fn dest(&self) -> PathBuf {
            self.temp.path().join("library")
        }

        fn source(&mut self, name: &str, content: &[u8], song: &str) -> Candidate {
            let path = self.temp.path().join("in").join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            let position = self.next_position;
            self.next_position += 1;
            Candidate {
                position,
                size: content.len() as u64,
                rendered: render(
                    &MetadataRecord::new("Art", "Alb", song),
                    &Pattern::default(),
                    true,
                ),
                extension: extension_of(&path),
                unrecognized: false,
                source: path,
            }
        }

        fn occupy(&self, relative: &str) {
            let path = self.dest().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"existing").unwrap();
        }
    }

    fn group(members: Vec<Candidate>) -> PlacementGroup {
        PlacementGroup {
            key: members[0].key(),
            members,
        }
    }

    fn fingerprints(members: &[&Candidate]) -> HashMap<usize, Fingerprint> {
        members
            .iter()
            .map(|c| {
                let bytes = std::fs::read(&c.source).unwrap();
                (c.position, Fingerprint::Available(ContentDigest::of(&bytes)))
            })
            .collect()
    }

    fn resolver(fixture: &Fixture) -> CollisionResolver {
        CollisionResolver::new(&fixture.dest(), "_duplicate_", PlacementMode::Copy).unwrap()
    }

    #[tokio::test]
    async fn test_single_source_gets_base_path() {
        let mut fx = Fixture::new();
        let a = fx.source("a.mp3", b"one", "Song");
        let groups = vec![group(vec![a])];

        let resolution = resolver(&fx).resolve(&groups, &HashMap::new()).await;

        assert_eq!(resolution.operations.len(), 1);
        let op = &resolution.operations[0];
        assert_eq!(op.relative, PathBuf::from("Art/Alb/Song.mp3"));
        assert_eq!(op.destination, fx.dest().join("Art/Alb/Song.mp3"));
        assert_eq!(op.action, PlacementMode::Copy);
        assert_eq!(resolution.stats.duplicate_groups, 0);
    }

    #[tokio::test]
    async fn test_identical_duplicate_skipped() {
        let mut fx = Fixture::new();
        let a = fx.source("a.mp3", b"same", "Song");
        let b = fx.source("b.mp3", b"same", "Song");
        let fps = fingerprints(&[&a, &b]);
        let groups = vec![group(vec![a, b])];

        let resolution = resolver(&fx).resolve(&groups, &fps).await;

        assert_eq!(resolution.operations.len(), 1);
        let entries = &resolution.groups[0].entries;
        assert_eq!(entries[0].status, EntryStatus::Planned);
        assert_eq!(entries[1].status, EntryStatus::SkippedIdentical);
        assert!(entries[1].destination.is_none());
        assert_eq!(resolution.stats.duplicate_groups, 1);
        assert_eq!(resolution.stats.identical_duplicates_skipped, 1);
        assert_eq!(resolution.stats.distinct_duplicates_kept, 0);
    }

    #[tokio::test]
    async fn test_distinct_duplicate_gets_token_and_source_stem() {
        let mut fx = Fixture::new();
        let a = fx.source("a.mp3", b"first", "Song");
        let b = fx.source("take two.mp3", b"second", "Song");
        let fps = fingerprints(&[&a, &b]);
        let groups = vec![group(vec![a, b])];

        let resolution = resolver(&fx).resolve(&groups, &fps).await;

        assert_eq!(resolution.operations.len(), 2);
        assert_eq!(
            resolution.operations[1].relative,
            PathBuf::from("Art/Alb/Song_duplicate_take two.mp3")
        );
        assert_eq!(resolution.stats.distinct_duplicates_kept, 1);
    }

    #[tokio::test]
    async fn test_occupied_names_escalate_suffix() {
        let mut fx = Fixture::new();
        fx.occupy("Art/Alb/Song.mp3");
        fx.occupy("Art/Alb/Song_2.mp3");
        fx.occupy("Art/Alb/Song_duplicate_b.mp3");
        let a = fx.source("a.mp3", b"first", "Song");
        let b = fx.source("b.mp3", b"second", "Song");
        let fps = fingerprints(&[&a, &b]);
        let groups = vec![group(vec![a, b])];

        let resolution = resolver(&fx).resolve(&groups, &fps).await;

        let relatives: Vec<_> = resolution.operations.iter().map(|op| op.relative.clone()).collect();
        assert_eq!(
            relatives,
            vec![
                PathBuf::from("Art/Alb/Song_3.mp3"),
                PathBuf::from("Art/Alb/Song_duplicate_b_2.mp3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_occupancy_is_case_insensitive_within_run() {
        let mut fx = Fixture::new();
        let a = fx.source("a.mp3", b"first", "Song_duplicate_b");
        let b = fx.source("b.mp3", b"second", "Song");
        let c = fx.source("c.mp3", b"third", "Song");
        let fps = fingerprints(&[&b, &c]);
        // Rename the second member so its qualified name collides with `a`.
        let c = Candidate {
            source: fx.temp.path().join("in").join("B.mp3"),
            ..c
        };
        std::fs::write(&c.source, b"third").unwrap();
        let groups = vec![group(vec![a]), group(vec![b, c])];

        let resolution = resolver(&fx).resolve(&groups, &fps).await;

        let relatives: Vec<_> = resolution.operations.iter().map(|op| op.relative.clone()).collect();
        assert_eq!(
            relatives,
            vec![
                PathBuf::from("Art/Alb/Song_duplicate_b.mp3"),
                PathBuf::from("Art/Alb/Song.mp3"),
                PathBuf::from("Art/Alb/Song_duplicate_B_2.mp3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_unavailable_fingerprint_treated_as_unique() {
        let mut fx = Fixture::new();
        let a = fx.source("a.mp3", b"same", "Song");
        let b = fx.source("b.mp3", b"same", "Song");
        let mut fps = fingerprints(&[&a]);
        fps.insert(
            b.position,
            Fingerprint::Unavailable {
                reason: "permission denied".to_string(),
            },
        );
        let groups = vec![group(vec![a, b])];

        let resolution = resolver(&fx).resolve(&groups, &fps).await;

        assert_eq!(resolution.operations.len(), 2);
        assert_eq!(resolution.stats.fingerprint_unavailable, 1);
        assert_eq!(resolution.stats.identical_duplicates_skipped, 0);
    }

    #[tokio::test]
    async fn test_source_already_at_destination() {
        let mut fx = Fixture::new();
        fx.occupy("Art/Alb/Song.mp3");
        let mut a = fx.source("a.mp3", b"existing", "Song");
        a.source = fx.dest().join("Art/./Alb/Song.mp3");

        let resolution = resolver(&fx).resolve(&[group(vec![a])], &HashMap::new()).await;

        assert!(resolution.operations.is_empty());
        assert_eq!(resolution.stats.already_in_place, 1);
        let entry = &resolution.groups[0].entries[0];
        assert_eq!(entry.status, EntryStatus::AlreadyInPlace);
        assert_eq!(entry.destination, Some(fx.dest().join("Art/Alb/Song.mp3")));
    }

    #[tokio::test]
    async fn test_move_mode_plans_moves() {
        let mut fx = Fixture::new();
        let a = fx.source("a.mp3", b"one", "Song");
        let resolver =
            CollisionResolver::new(&fx.dest(), "_duplicate_", PlacementMode::Move).unwrap();

        let resolution = resolver.resolve(&[group(vec![a])], &HashMap::new()).await;

        assert_eq!(resolution.operations[0].action, PlacementMode::Move);
    }

    #[tokio::test]
    async fn test_file_where_directory_needed_is_unplaceable() {
        let mut fx = Fixture::new();
        std::fs::create_dir_all(fx.dest()).unwrap();
        std::fs::write(fx.dest().join("Art"), b"stray").unwrap();
        let a = fx.source("a.mp3", b"one", "Song");
        let b = fx.source("b.mp3", b"two", "Other");
        let groups = vec![group(vec![a]), group(vec![b])];

        let resolution = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            resolver(&fx).resolve(&groups, &HashMap::new()),
        )
        .await
        .expect("resolve finishes");

        assert!(resolution.operations.is_empty());
        assert_eq!(resolution.stats.unplaceable, 2);
        assert_eq!(resolution.groups.len(), 2);
        let entry = &resolution.groups[0].entries[0];
        assert_eq!(entry.status, EntryStatus::Unplaceable);
        assert!(entry.destination.is_none());
        let blocked = &resolution.unplaceable[0];
        assert_eq!(blocked.source, fx.temp.path().join("in/a.mp3"));
        assert_eq!(blocked.destination, fx.dest().join("Art/Alb/Song.mp3"));
        assert!(!blocked.reason.is_empty());
    }

    #[tokio::test]
    async fn test_unplaceable_member_does_not_stop_other_groups() {
        let mut fx = Fixture::new();
        std::fs::create_dir_all(fx.dest()).unwrap();
        std::fs::write(fx.dest().join("Art"), b"stray").unwrap();
        let a = fx.source("a.mp3", b"one", "Song");
        let mut b = fx.source("b.mp3", b"two", "Song");
        b.rendered = render(
            &MetadataRecord::new("Band", "Alb", "Song"),
            &Pattern::default(),
            true,
        );
        let groups = vec![group(vec![a]), group(vec![b])];

        let resolution = resolver(&fx).resolve(&groups, &HashMap::new()).await;

        assert_eq!(resolution.stats.unplaceable, 1);
        assert_eq!(resolution.operations.len(), 1);
        assert_eq!(
            resolution.operations[0].relative,
            PathBuf::from("Band/Alb/Song.mp3")
        );
        assert_eq!(resolution.groups[1].entries[0].status, EntryStatus::Planned);
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d.mp3")),
            PathBuf::from("/a/c/d.mp3")
        );
        assert_eq!(normalize_lexically(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_lexically(Path::new("../a")), PathBuf::from("../a"));
    }

    #[test]
    fn test_entry_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&EntryStatus::SkippedIdentical).unwrap(),
            "\"skipped-identical\""
        );
        assert_eq!(
            serde_json::to_string(&EntryStatus::AlreadyInPlace).unwrap(),
            "\"already-in-place\""
        );
        assert_eq!(
            serde_json::to_string(&EntryStatus::Unplaceable).unwrap(),
            "\"unplaceable\""
        );
    }
}
