//! Destination patterns.
//!
//! Placeholders:
//!
//! | Code | Value |
//! |------|-------|
//! | `%A` | artist |
//! | `%L` | album |
//! | `%S` | song |
//! | `%Y` | release year |
//! | `%G` | primary genre |
//! | `%B` | label |
//! | `%I` | ISRC |
//! | `%E` | `Explicit` or `Clean` |
//! | `%e` | `true` or `false` |
//! | `%a` | artist id |
//! | `%T` | track id |
//! | `%U` | album id |
//!
//! `/` separates directories; the last component is the file stem and gets
//! the source's lower-cased extension appended by the caller.
//!
//! # Example
//!
//! ```
//! use shelver_core::mapping::MetadataRecord;
//! use shelver_core::pattern::{render, Pattern};
//!
//! let record = MetadataRecord::new("Art", "Alb", "Song");
//! let rendered = render(&record, &Pattern::parse("%A/%Y - %L/%S"), true);
//! assert_eq!(rendered.components(), &["Art", "Alb", "Song"]);
//! ```

mod render;
mod sanitize;
mod token;

pub use render::{render, RenderedPath, Substitution, SubstitutionTable};
pub use sanitize::{is_unknown_marker, sanitize, UNKNOWN};
pub use token::{Component, Pattern, Placeholder, Segment};
