//! Pattern tokenizer.
//!
//! A pattern such as `%A/%Y - %L/%S` is split on `/` into components and
//! each component into literal and placeholder segments, once, up front.
//! Rendering then substitutes segment by segment, so a value that happens
//! to contain `%S` is never expanded a second time.

use std::fmt;

/// The closed set of placeholders a pattern may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `%A`
    Artist,
    /// `%L`
    Album,
    /// `%S`
    Song,
    /// `%Y`
    Year,
    /// `%G`
    Genre,
    /// `%B`
    Label,
    /// `%I`
    Isrc,
    /// `%E`, `Explicit` or `Clean`
    ExplicitWord,
    /// `%e`, `true` or `false`
    ExplicitFlag,
    /// `%a`
    ArtistId,
    /// `%T`
    TrackId,
    /// `%U`
    AlbumId,
}

impl Placeholder {
    pub const ALL: [Placeholder; 12] = [
        Self::Artist,
        Self::Album,
        Self::Song,
        Self::Year,
        Self::Genre,
        Self::Label,
        Self::Isrc,
        Self::ExplicitWord,
        Self::ExplicitFlag,
        Self::ArtistId,
        Self::TrackId,
        Self::AlbumId,
    ];

    /// Looks up the placeholder for the character following `%`.
    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    pub fn code(self) -> char {
        match self {
            Self::Artist => 'A',
            Self::Album => 'L',
            Self::Song => 'S',
            Self::Year => 'Y',
            Self::Genre => 'G',
            Self::Label => 'B',
            Self::Isrc => 'I',
            Self::ExplicitWord => 'E',
            Self::ExplicitFlag => 'e',
            Self::ArtistId => 'a',
            Self::TrackId => 'T',
            Self::AlbumId => 'U',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Song => "song",
            Self::Year => "release year",
            Self::Genre => "genre",
            Self::Label => "label",
            Self::Isrc => "ISRC",
            Self::ExplicitWord => "Explicit|Clean",
            Self::ExplicitFlag => "true|false",
            Self::ArtistId => "artist id",
            Self::TrackId => "track id",
            Self::AlbumId => "album id",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.code())
    }
}

/// One piece of a pattern component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// One `/`-separated part of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    segments: Vec<Segment>,
}

impl Component {
    fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            match chars.peek().copied().and_then(Placeholder::from_code) {
                Some(placeholder) => {
                    chars.next();
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(placeholder));
                }
                // Unrecognized codes stay literal text
                None => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether any placeholder appears in this component.
    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
    }
}

/// A tokenized destination pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    components: Vec<Component>,
}

impl Pattern {
    /// Tokenizes a pattern. Empty, `.` and `..` components are ignored.
    pub fn parse(source: &str) -> Self {
        let components = source
            .split('/')
            .filter(|part| !matches!(*part, "" | "." | ".."))
            .map(Component::parse)
            .collect();

        Self {
            source: source.to_string(),
            components,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::parse("%A/%L/%S")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.to_string())
    }

    fn ph(p: Placeholder) -> Segment {
        Segment::Placeholder(p)
    }

    #[test]
    fn test_default_pattern() {
        let pattern = Pattern::default();
        assert_eq!(pattern.components().len(), 3);
        assert_eq!(pattern.components()[0].segments(), &[ph(Placeholder::Artist)]);
        assert_eq!(pattern.components()[1].segments(), &[ph(Placeholder::Album)]);
        assert_eq!(pattern.components()[2].segments(), &[ph(Placeholder::Song)]);
    }

    #[test]
    fn test_mixed_literals_and_placeholders() {
        let pattern = Pattern::parse("%G/%A - %S (%E)");
        let comps = pattern.components();
        assert_eq!(comps.len(), 2);
        assert_eq!(
            comps[1].segments(),
            &[
                ph(Placeholder::Artist),
                lit(" - "),
                ph(Placeholder::Song),
                lit(" ("),
                ph(Placeholder::ExplicitWord),
                lit(")"),
            ]
        );
    }

    #[test]
    fn test_case_sensitive_codes() {
        let pattern = Pattern::parse("%a-%A-%e-%E");
        assert_eq!(
            pattern.components()[0].segments(),
            &[
                ph(Placeholder::ArtistId),
                lit("-"),
                ph(Placeholder::Artist),
                lit("-"),
                ph(Placeholder::ExplicitFlag),
                lit("-"),
                ph(Placeholder::ExplicitWord),
            ]
        );
    }

    #[test]
    fn test_unrecognized_codes_stay_literal() {
        let pattern = Pattern::parse("%X %S 100%");
        assert_eq!(
            pattern.components()[0].segments(),
            &[lit("%X "), ph(Placeholder::Song), lit(" 100%")]
        );
    }

    #[test]
    fn test_skips_dot_and_empty_components() {
        let pattern = Pattern::parse("./%A//../%S/");
        assert_eq!(pattern.components().len(), 2);
        assert_eq!(pattern.as_str(), "./%A//../%S/");
    }

    #[test]
    fn test_every_code_roundtrips() {
        for p in Placeholder::ALL {
            assert_eq!(Placeholder::from_code(p.code()), Some(p));
        }
        assert_eq!(Placeholder::from_code('Z'), None);
    }

    #[test]
    fn test_has_placeholders() {
        let pattern = Pattern::parse("Music/%A");
        assert!(!pattern.components()[0].has_placeholders());
        assert!(pattern.components()[1].has_placeholders());
    }
}
