//! Destination resolution.
//!
//! Planning happens in two passes. [`group_sources`] renders every present
//! source and groups them by case-insensitive destination. The
//! [`CollisionResolver`] then walks the groups in first-appearance order and
//! decides, per member, whether to skip it as an identical copy or which
//! unoccupied path it gets.
//!
//! Only members of groups with more than one present source need a
//! fingerprint; [`fingerprint_targets`] lists them.

mod collision;
mod group;

pub use collision::{
    absolute_path, CollisionResolver, EntryStatus, Resolution, ResolutionStats, ResolvedEntry,
    ResolvedGroup, UnplaceableSource,
};
pub use group::{extension_of, group_sources, Candidate, Grouping, MissingSource, PlacementGroup};

/// Members that need fingerprinting: every member of every duplicate group,
/// as `(position, source)` in input order of their groups.
pub fn fingerprint_targets(groups: &[PlacementGroup]) -> Vec<(usize, std::path::PathBuf)> {
    groups
        .iter()
        .filter(|g| g.is_duplicate())
        .flat_map(|g| g.members.iter())
        .map(|c| (c.position, c.source.clone()))
        .collect()
}
