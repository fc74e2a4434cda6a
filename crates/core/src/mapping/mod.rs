//! Input mapping: recognized metadata keyed by source file path.
//!
//! The mapping is a JSON object written by the recognition step. Its key
//! order is significant: grouping and collision resolution follow it, so
//! it is loaded into an ordered list of entries rather than a hash map.

mod error;
mod loader;
mod types;

pub use error::MappingError;
pub use loader::{load_mapping, parse_mapping};
pub use types::{CoreField, MalformedEntry, MappingEntry, MetadataMapping, MetadataRecord};
