//! Rendering a tokenized pattern against one metadata record.

use std::collections::HashMap;
use std::path::PathBuf;

use super::sanitize::{is_unknown_marker, sanitize, UNKNOWN};
use super::token::{Component, Pattern, Placeholder, Segment};
use crate::mapping::{CoreField, MetadataRecord};

/// Punctuation left dangling at a component edge once an unknown value is blanked.
const BLANK_RESIDUE: &[char] = &[' ', '-', '_', '.', '(', ')', ',', ';', ':'];

/// A placeholder's substituted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Sanitized text for the placeholder.
    pub text: String,
    /// Unknown value suppressed under the drop policy; renders as nothing.
    pub blanked: bool,
    /// A core field the record explicitly flags as known. Its text is never
    /// second-guessed by the unknown heuristic.
    pub flag_known: bool,
}

/// Placeholder values for one record.
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    values: HashMap<Placeholder, Substitution>,
}

impl SubstitutionTable {
    pub fn build(record: &MetadataRecord, drop_unknown: bool) -> Self {
        let explicit = record.explicit.unwrap_or(false);
        let mut values = HashMap::with_capacity(Placeholder::ALL.len());

        values.insert(
            Placeholder::Artist,
            core_value(record, CoreField::Author, drop_unknown),
        );
        values.insert(
            Placeholder::Album,
            core_value(record, CoreField::Album, drop_unknown),
        );
        values.insert(
            Placeholder::Song,
            core_value(record, CoreField::Song, drop_unknown),
        );
        values.insert(
            Placeholder::Year,
            optional_value(record.release_year.as_deref(), drop_unknown),
        );
        values.insert(
            Placeholder::Genre,
            optional_value(record.genre_primary.as_deref(), drop_unknown),
        );
        values.insert(
            Placeholder::Label,
            optional_value(record.label.as_deref(), drop_unknown),
        );
        values.insert(
            Placeholder::Isrc,
            optional_value(record.isrc.as_deref(), drop_unknown),
        );
        values.insert(
            Placeholder::ExplicitWord,
            fixed_value(if explicit { "Explicit" } else { "Clean" }),
        );
        values.insert(
            Placeholder::ExplicitFlag,
            fixed_value(if explicit { "true" } else { "false" }),
        );
        values.insert(
            Placeholder::ArtistId,
            optional_value(record.artist_adamid.as_deref(), drop_unknown),
        );
        values.insert(
            Placeholder::TrackId,
            optional_value(record.applemusic_track_id.as_deref(), drop_unknown),
        );
        values.insert(
            Placeholder::AlbumId,
            optional_value(record.applemusic_album_id.as_deref(), drop_unknown),
        );

        Self { values }
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&Substitution> {
        self.values.get(&placeholder)
    }
}

fn core_value(record: &MetadataRecord, field: CoreField, drop_unknown: bool) -> Substitution {
    let text = record.core_text(field);
    let flag = record.unknown_flag(field);
    // The label stands in only for absent text or an explicit unknown flag;
    // anything else keeps the record's own wording.
    let shown = match (text, flag) {
        (Some(text), None | Some(false)) => text,
        _ => field.unknown_label(),
    };
    Substitution {
        text: sanitize(shown),
        blanked: drop_unknown && record.is_field_unknown(field),
        flag_known: text.is_some() && flag == Some(false),
    }
}

fn optional_value(value: Option<&str>, drop_unknown: bool) -> Substitution {
    let text = sanitize(value.filter(|v| !v.trim().is_empty()).unwrap_or(UNKNOWN));
    let blanked = drop_unknown && is_unknown_marker(&text);
    Substitution {
        text,
        blanked,
        flag_known: false,
    }
}

fn fixed_value(text: &str) -> Substitution {
    Substitution {
        text: text.to_string(),
        blanked: false,
        flag_known: false,
    }
}

/// A rendered destination, still without the source's extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPath {
    components: Vec<String>,
    is_fallback: bool,
}

impl RenderedPath {
    /// Every component, directories first and the file stem last. Never empty.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn directories(&self) -> &[String] {
        &self.components[..self.components.len() - 1]
    }

    pub fn stem(&self) -> &str {
        &self.components[self.components.len() - 1]
    }

    /// Whether the pattern rendered to nothing and the core fields were used instead.
    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    /// Relative destination with `extension` (including its dot) appended to the stem.
    pub fn relative_path(&self, extension: &str) -> PathBuf {
        let mut path: PathBuf = self.directories().iter().collect();
        path.push(format!("{}{}", self.stem(), extension));
        path
    }

    /// Case-insensitive identity of the rendered destination, `/`-separated.
    pub fn key(&self, extension: &str) -> String {
        format!("{}{}", self.components.join("/"), extension).to_lowercase()
    }
}

/// Render `pattern` for `record`.
///
/// Never fails: when every component is removed the non-unknown subset of
/// artist, album and song is used, and failing that a single `Unknown`.
pub fn render(record: &MetadataRecord, pattern: &Pattern, drop_unknown: bool) -> RenderedPath {
    let table = SubstitutionTable::build(record, drop_unknown);

    let components: Vec<String> = pattern
        .components()
        .iter()
        .filter_map(|component| render_component(component, &table, drop_unknown))
        .collect();

    if !components.is_empty() {
        return RenderedPath {
            components,
            is_fallback: false,
        };
    }

    let mut fallback: Vec<String> = [Placeholder::Artist, Placeholder::Album, Placeholder::Song]
        .into_iter()
        .filter_map(|p| table.get(p))
        .filter(|sub| !sub.blanked)
        .map(|sub| sub.text.clone())
        .collect();
    if fallback.is_empty() {
        fallback.push(UNKNOWN.to_string());
    }

    RenderedPath {
        components: fallback,
        is_fallback: true,
    }
}

fn render_component(
    component: &Component,
    table: &SubstitutionTable,
    drop_unknown: bool,
) -> Option<String> {
    let mut raw = String::new();
    let mut blank_offsets = Vec::new();
    let mut flag_known = false;

    for segment in component.segments() {
        match segment {
            Segment::Literal(text) => raw.push_str(text),
            Segment::Placeholder(placeholder) => match table.get(*placeholder) {
                Some(sub) if sub.blanked => blank_offsets.push(raw.len()),
                Some(sub) => {
                    flag_known |= sub.flag_known;
                    raw.push_str(&sub.text);
                }
                None => raw.push_str(&placeholder.to_string()),
            },
        }
    }

    if !drop_unknown {
        return Some(sanitize(&raw));
    }

    let trimmed = trim_blank_residue(&raw, &blank_offsets);
    if trimmed.trim().is_empty() {
        return None;
    }

    let safe = sanitize(trimmed);
    if !flag_known && is_unknown_marker(&safe) {
        None
    } else {
        Some(safe)
    }
}

/// Trims edge punctuation, but only at an edge a blanked value touched.
///
/// `%A - %S (%G)` with an unknown genre leaves `Art - Song ()`, which becomes
/// `Art - Song`; `%G %A (Live)` keeps its closing parenthesis.
fn trim_blank_residue<'a>(raw: &'a str, blank_offsets: &[usize]) -> &'a str {
    if blank_offsets.is_empty() {
        return raw;
    }

    let lead_end = raw.len() - raw.trim_start_matches(BLANK_RESIDUE).len();
    let trail_start = raw.trim_end_matches(BLANK_RESIDUE).len();

    let start = if blank_offsets.iter().any(|&o| o <= lead_end) {
        lead_end
    } else {
        0
    };
    let end = if blank_offsets.iter().any(|&o| o >= trail_start) {
        trail_start
    } else {
        raw.len()
    };

    if start >= end {
        ""
    } else {
        &raw[start..end]
    }
}
