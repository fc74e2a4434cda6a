//! Types for the input metadata mapping.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::pattern::is_unknown_marker;

/// Recognition metadata for one source file.
///
/// Only `author`, `album` and `song` drive the default pattern; the rest
/// are optional enrichment fields. Identifier-like fields accept JSON
/// strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MetadataRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub song: Option<String>,

    /// Structured unknown flags; when present they override text heuristics.
    #[serde(default)]
    pub author_unknown: Option<bool>,
    #[serde(default)]
    pub album_unknown: Option<bool>,
    #[serde(default)]
    pub song_unknown: Option<bool>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub release_year: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub genre_primary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub isrc: Option<String>,
    #[serde(default)]
    pub explicit: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub artist_adamid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub applemusic_track_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub applemusic_album_id: Option<String>,
}

/// The three fields that make up a recognition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreField {
    Author,
    Album,
    Song,
}

impl CoreField {
    /// Text substituted for the field when it is unknown and kept.
    pub fn unknown_label(self) -> &'static str {
        match self {
            Self::Author => "Unknown Artist",
            Self::Album => "Unknown Album",
            Self::Song => "Unknown Song",
        }
    }
}

impl MetadataRecord {
    /// Convenience constructor for the three core fields.
    pub fn new(author: &str, album: &str, song: &str) -> Self {
        Self {
            author: Some(author.to_string()),
            album: Some(album.to_string()),
            song: Some(song.to_string()),
            ..Default::default()
        }
    }

    /// Text of a core field, with blank strings treated as absent.
    pub fn core_text(&self, field: CoreField) -> Option<&str> {
        let value = match field {
            CoreField::Author => &self.author,
            CoreField::Album => &self.album,
            CoreField::Song => &self.song,
        };
        value.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// The structured `*_unknown` flag for `field`, when the record carries one.
    pub fn unknown_flag(&self, field: CoreField) -> Option<bool> {
        match field {
            CoreField::Author => self.author_unknown,
            CoreField::Album => self.album_unknown,
            CoreField::Song => self.song_unknown,
        }
    }

    /// Whether a core field is unknown.
    ///
    /// Absent text is always unknown. Otherwise the structured flag decides
    /// when present, and [`is_unknown_marker`] is the fallback.
    pub fn is_field_unknown(&self, field: CoreField) -> bool {
        match (self.core_text(field), self.unknown_flag(field)) {
            (None, _) => true,
            (Some(_), Some(flag)) => flag,
            (Some(text), None) => is_unknown_marker(text),
        }
    }

    /// A record without a recognizable author or song is still processable,
    /// but counts as unrecognized.
    pub fn is_unknown(&self) -> bool {
        self.is_field_unknown(CoreField::Author) || self.is_field_unknown(CoreField::Song)
    }
}

/// One `(source path, record)` pair, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub source: PathBuf,
    pub record: MetadataRecord,
}

/// An entry that was present in the input but could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedEntry {
    pub key: String,
    pub reason: String,
}

/// The whole input mapping as an explicitly ordered sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMapping {
    pub entries: Vec<MappingEntry>,
    pub malformed: Vec<MalformedEntry>,
}

impl MetadataMapping {
    pub fn from_entries(entries: impl IntoIterator<Item = (PathBuf, MetadataRecord)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(source, record)| MappingEntry { source, record })
                .collect(),
            malformed: Vec::new(),
        }
    }

    /// Every path entry that appeared in the input, usable or not.
    pub fn total_entries(&self) -> usize {
        self.entries.len() + self.malformed.len()
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal_record() {
        let record: MetadataRecord =
            serde_json::from_value(json!({"author": "Art", "album": "Alb", "song": "Song"}))
                .unwrap();
        assert_eq!(record, MetadataRecord::new("Art", "Alb", "Song"));
        assert!(!record.is_unknown());
    }

    #[test]
    fn test_deserialize_numeric_fields() {
        let record: MetadataRecord = serde_json::from_value(json!({
            "author": "Art",
            "song": "Song",
            "release_year": 1999,
            "artist_adamid": 12345,
            "applemusic_track_id": "987",
            "explicit": true
        }))
        .unwrap();
        assert_eq!(record.release_year.as_deref(), Some("1999"));
        assert_eq!(record.artist_adamid.as_deref(), Some("12345"));
        assert_eq!(record.applemusic_track_id.as_deref(), Some("987"));
        assert_eq!(record.explicit, Some(true));
        assert!(record.album.is_none());
    }

    #[test]
    fn test_deserialize_rejects_nested_values() {
        let result: Result<MetadataRecord, _> =
            serde_json::from_value(json!({"author": ["a", "b"]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_overrides_heuristic() {
        let mut record = MetadataRecord::new("Art", "Unknown Pleasures", "Song");
        // Heuristic alone would call this album unknown
        assert!(record.is_field_unknown(CoreField::Album));

        record.album_unknown = Some(false);
        assert!(!record.is_field_unknown(CoreField::Album));

        record.album = Some("Real Album".to_string());
        record.album_unknown = Some(true);
        assert!(record.is_field_unknown(CoreField::Album));
    }

    #[test]
    fn test_blank_text_is_unknown() {
        let mut record = MetadataRecord::new("  ", "Alb", "Song");
        record.author_unknown = Some(false);
        assert!(record.is_field_unknown(CoreField::Author));
        assert!(record.is_unknown());
    }

    #[test]
    fn test_total_entries_counts_malformed() {
        let mut mapping = MetadataMapping::from_entries(vec![(
            PathBuf::from("/a.mp3"),
            MetadataRecord::default(),
        )]);
        mapping.malformed.push(MalformedEntry {
            key: "/b.mp3".to_string(),
            reason: "not an object".to_string(),
        });
        assert_eq!(mapping.total_entries(), 2);
    }
}
