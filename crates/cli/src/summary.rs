//! Human-readable run summary printed to stdout.

use std::fmt;

use shelver_core::{EntryStatus, Report};

/// Missing sources listed before the rest are elided.
const MISSING_LISTING_LIMIT: usize = 50;

pub struct Summary<'a> {
    report: &'a Report,
}

impl<'a> Summary<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self { report }
    }

    fn write_counts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        let s = &r.stats;
        let run = if r.apply { "apply" } else { "dry run" };

        writeln!(f, "Summary ({run}, {}):", r.mode)?;
        writeln!(f, "  Pattern:                      {}", r.pattern)?;
        writeln!(f, "  Destination root:             {}", r.dest_root.display())?;
        writeln!(f, "  Entries in mapping:           {}", s.total_entries)?;
        if s.malformed_entries > 0 {
            writeln!(f, "  Malformed entries:            {}", s.malformed_entries)?;
        }
        writeln!(f, "  Unrecognized entries:         {}", s.unrecognized_entries)?;
        writeln!(f, "  Unique destinations:          {}", s.unique_destinations)?;
        writeln!(f, "  Missing sources:              {}", s.missing_sources)?;
        writeln!(f, "  Already in place:             {}", s.already_in_place)?;
        writeln!(f, "  Duplicate groups:             {}", s.duplicate_groups)?;
        writeln!(f, "  Distinct duplicates kept:     {}", s.distinct_duplicates_kept)?;
        writeln!(f, "  Identical duplicates skipped: {}", s.identical_duplicates_skipped)?;
        if s.unplaceable_sources > 0 {
            writeln!(f, "  Unplaceable sources:          {}", s.unplaceable_sources)?;
        }
        if s.fingerprint_unavailable > 0 {
            writeln!(f, "  Fingerprints unavailable:     {}", s.fingerprint_unavailable)?;
        }
        writeln!(f, "  Planned copies:               {}", s.planned_copies)?;
        writeln!(f, "  Planned moves:                {}", s.planned_moves)?;
        if r.apply {
            writeln!(f, "  Copies performed:             {}", s.copies_performed)?;
            writeln!(f, "  Moves performed:              {}", s.moves_performed)?;
            writeln!(f, "  Operations failed:            {}", s.operations_failed)?;
        }
        Ok(())
    }

    fn write_duplicates(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.groups.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "Duplicate destinations:")?;
        for group in &self.report.groups {
            writeln!(f, "  {}", group.dest_key)?;
            for entry in &group.entries {
                match (&entry.dest, entry.status) {
                    (Some(dest), EntryStatus::Planned | EntryStatus::AlreadyInPlace) => writeln!(
                        f,
                        "    [{}] {} -> {}",
                        entry.status.as_str(),
                        entry.src.display(),
                        dest.display()
                    )?,
                    _ => writeln!(f, "    [{}] {}", entry.status.as_str(), entry.src.display())?,
                }
            }
        }
        Ok(())
    }

    fn write_missing(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing = &self.report.missing_sources;
        if missing.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "Missing sources:")?;
        for source in missing.iter().take(MISSING_LISTING_LIMIT) {
            writeln!(f, "  {} ({})", source.source.display(), source.reason)?;
        }
        if missing.len() > MISSING_LISTING_LIMIT {
            writeln!(f, "  ... and {} more", missing.len() - MISSING_LISTING_LIMIT)?;
        }
        Ok(())
    }

    fn write_unplaceable(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unplaceable = &self.report.unplaceable_sources;
        if unplaceable.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "Unplaceable sources:")?;
        for source in unplaceable {
            writeln!(
                f,
                "  {} -> {}: {}",
                source.source.display(),
                source.destination.display(),
                source.reason
            )?;
        }
        Ok(())
    }

    fn write_failures(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failures = &self.report.failures;
        if failures.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "Failed operations:")?;
        for failure in failures {
            writeln!(
                f,
                "  {} {} -> {}: {}",
                failure.action,
                failure.source.display(),
                failure.destination.display(),
                failure.error
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_counts(f)?;
        self.write_duplicates(f)?;
        self.write_missing(f)?;
        self.write_unplaceable(f)?;
        self.write_failures(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shelver_core::report::{ReportEntry, ReportGroup, ReportStats};
    use shelver_core::{MissingSource, PlacementMode, UnknownPolicy, UnplaceableSource};
    use std::path::PathBuf;

    fn report() -> Report {
        Report {
            generated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            pattern: "%A/%L/%S".to_string(),
            dest_root: PathBuf::from("/library"),
            apply: false,
            mode: PlacementMode::Copy,
            unknowns: UnknownPolicy::Drop,
            duplicate_token: "_duplicate_".to_string(),
            stats: ReportStats {
                total_entries: 3,
                duplicate_groups: 1,
                identical_duplicates_skipped: 1,
                planned_copies: 1,
                ..Default::default()
            },
            groups: vec![ReportGroup {
                dest_key: "c/s/t.mp3".to_string(),
                entries: vec![
                    ReportEntry {
                        src: PathBuf::from("/in/1.mp3"),
                        status: EntryStatus::Planned,
                        dest: Some(PathBuf::from("/library/C/S/T.mp3")),
                        sha256: None,
                        size: 1,
                    },
                    ReportEntry {
                        src: PathBuf::from("/in/2.mp3"),
                        status: EntryStatus::SkippedIdentical,
                        dest: None,
                        sha256: None,
                        size: 1,
                    },
                ],
            }],
            missing_sources: Vec::new(),
            unplaceable_sources: Vec::new(),
            malformed_entries: Vec::new(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_summary_lists_counts_and_duplicates() {
        let text = Summary::new(&report()).to_string();

        assert!(text.starts_with("Summary (dry run, copy):"));
        assert!(text.contains("Entries in mapping:           3"));
        assert!(text.contains("Identical duplicates skipped: 1"));
        assert!(text.contains("[planned] /in/1.mp3 -> /library/C/S/T.mp3"));
        assert!(text.contains("[skipped-identical] /in/2.mp3"));
        assert!(!text.contains("Copies performed"));
        assert!(!text.contains("Missing sources:\n"));
    }

    #[test]
    fn test_missing_listing_is_capped() {
        let mut report = report();
        report.missing_sources = (0..53)
            .map(|i| MissingSource {
                source: PathBuf::from(format!("/in/gone{i}.mp3")),
                reason: "No such file or directory".to_string(),
            })
            .collect();

        let text = Summary::new(&report).to_string();

        assert!(text.contains("/in/gone49.mp3"));
        assert!(!text.contains("/in/gone50.mp3"));
        assert!(text.contains("  ... and 3 more"));
    }

    #[test]
    fn test_unplaceable_sources_listed() {
        let mut report = report();
        report.stats.unplaceable_sources = 1;
        report.unplaceable_sources.push(UnplaceableSource {
            source: PathBuf::from("/in/3.mp3"),
            destination: PathBuf::from("/library/Art/Alb/Song.mp3"),
            reason: "Not a directory (os error 20)".to_string(),
        });

        let text = Summary::new(&report).to_string();

        assert!(text.contains("Unplaceable sources:          1"));
        assert!(text.contains(
            "  /in/3.mp3 -> /library/Art/Alb/Song.mp3: Not a directory (os error 20)"
        ));
    }

    #[test]
    fn test_apply_shows_performed_counts() {
        let mut report = report();
        report.apply = true;
        report.stats.copies_performed = 1;

        let text = Summary::new(&report).to_string();
        assert!(text.contains("Copies performed:             1"));
        assert!(text.contains("Operations failed:            0"));
    }
}
