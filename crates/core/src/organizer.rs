//! The organizer: one run from metadata mapping to report.
//!
//! ```text
//! mapping ─▶ group_sources ─▶ fingerprint duplicates ─▶ CollisionResolver
//!                                                            │
//!                          report ◀─ PlanExecutor(Placer) ◀──┘
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::{validate_config, ConfigError, OrganizerConfig};
use crate::executor::{ExecutionOutcome, PlanExecutor};
use crate::identity::ContentIdentityResolver;
use crate::mapping::{load_mapping, MappingError, MetadataMapping};
use crate::pattern::Pattern;
use crate::placer::{FsPlacer, PlacerConfig, PlacerError, Placer, PlannedOperation};
use crate::report::{write_report, Report, ReportError, ReportHeader};
use crate::resolver::{
    fingerprint_targets, group_sources, CollisionResolver, Grouping, Resolution,
};

/// Failures that abort a run. Per-source problems never end up here.
#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load metadata mapping: {0}")]
    Mapping(#[from] MappingError),

    #[error("Destination root unusable: {0}")]
    Placer(#[from] PlacerError),

    #[error("Failed to resolve destination root {path}")]
    DestinationRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Everything decided before any file is touched.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Absolute destination root.
    pub dest_root: PathBuf,
    pub grouping: Grouping,
    pub resolution: Resolution,
}

impl Plan {
    pub fn operations(&self) -> &[PlannedOperation] {
        &self.resolution.operations
    }
}

/// Runs the whole pipeline with one configuration and one placer.
pub struct Organizer<P: Placer = FsPlacer> {
    config: OrganizerConfig,
    placer: P,
}

impl Organizer<FsPlacer> {
    /// Organizer backed by the file system placer.
    pub fn new(config: OrganizerConfig) -> Self {
        let placer = FsPlacer::new(PlacerConfig::from(&config));
        Self { config, placer }
    }
}

impl<P: Placer> Organizer<P> {
    pub fn with_placer(config: OrganizerConfig, placer: P) -> Self {
        Self { config, placer }
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    pub fn placer(&self) -> &P {
        &self.placer
    }

    /// Groups, fingerprints and resolves without touching the destination.
    pub async fn plan(&self, mapping: &MetadataMapping) -> Result<Plan, OrganizerError> {
        validate_config(&self.config)?;
        let pattern = Pattern::parse(&self.config.pattern);

        let grouping = group_sources(
            &mapping.entries,
            &pattern,
            self.config.unknowns.drops(),
        )
        .await;
        info!(
            "{} present sources in {} destination groups, {} missing",
            grouping.candidates().count(),
            grouping.groups.len(),
            grouping.missing.len()
        );

        // Verified copies need a fingerprint for every source.
        let targets = if self.config.verify_copies {
            grouping
                .candidates()
                .map(|c| (c.position, c.source.clone()))
                .collect()
        } else {
            fingerprint_targets(&grouping.groups)
        };
        let identity =
            ContentIdentityResolver::new(self.config.buffer_size, self.config.fingerprint_concurrency);
        let (positions, paths): (Vec<usize>, Vec<PathBuf>) = targets.into_iter().unzip();
        info!("Fingerprinting {} sources", paths.len());
        let fingerprints: HashMap<_, _> = positions
            .into_iter()
            .zip(identity.fingerprint_all(paths).await)
            .collect();

        let resolver = CollisionResolver::new(
            &self.config.dest_root,
            self.config.duplicate_token.clone(),
            self.config.mode,
        )
        .map_err(|source| OrganizerError::DestinationRoot {
            path: self.config.dest_root.clone(),
            source,
        })?;
        let dest_root = resolver.dest_root().to_path_buf();
        let resolution = resolver.resolve(&grouping.groups, &fingerprints).await;

        Ok(Plan {
            dest_root,
            grouping,
            resolution,
        })
    }

    /// Plans, then executes when `apply` is set, and assembles the report.
    pub async fn run(
        &self,
        mapping: &MetadataMapping,
        generated_at: DateTime<Utc>,
    ) -> Result<Report, OrganizerError> {
        let plan = self.plan(mapping).await?;
        if self.config.apply {
            self.placer.validate(&plan.dest_root).await?;
        }

        let outcome: ExecutionOutcome = PlanExecutor::new(&self.placer)
            .execute(plan.operations(), self.config.apply)
            .await;

        let header = ReportHeader {
            generated_at,
            pattern: self.config.pattern.clone(),
            dest_root: plan.dest_root.clone(),
            apply: self.config.apply,
            mode: self.config.mode,
            unknowns: self.config.unknowns,
            duplicate_token: self.config.duplicate_token.clone(),
        };
        Ok(Report::assemble(
            header,
            mapping,
            &plan.grouping,
            &plan.resolution,
            &outcome,
        ))
    }

    /// Loads the mapping at `input`, runs, and writes the report to the
    /// configured report path.
    pub async fn organize(
        &self,
        input: &Path,
        generated_at: DateTime<Utc>,
    ) -> Result<Report, OrganizerError> {
        let mapping = load_mapping(input).await?;
        info!(
            "Loaded {} entries ({} malformed) from {}",
            mapping.entries.len(),
            mapping.malformed.len(),
            input.display()
        );

        let report = self.run(&mapping, generated_at).await?;
        write_report(&report, &self.config.report_path).await?;
        Ok(report)
    }
}
