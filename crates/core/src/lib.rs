pub mod config;
pub mod executor;
pub mod identity;
pub mod mapping;
pub mod organizer;
pub mod pattern;
pub mod placer;
pub mod report;
pub mod resolver;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, OrganizerConfig,
    PlacementMode, UnknownPolicy,
};
pub use executor::{ExecutionOutcome, FailedOperation, PlanExecutor};
pub use identity::{ContentDigest, ContentIdentityResolver, Fingerprint};
pub use mapping::{load_mapping, parse_mapping, MappingError, MetadataMapping, MetadataRecord};
pub use organizer::{Organizer, OrganizerError, Plan};
pub use pattern::{render, sanitize, Pattern, RenderedPath};
pub use placer::{FsPlacer, Placer, PlacerConfig, PlacerError, PlannedOperation};
pub use report::{write_report, Report, ReportError, ReportGroup, ReportStats};
pub use resolver::{CollisionResolver, EntryStatus, MissingSource, UnplaceableSource};
