//! Overpass API query construction and response parsing

mod parser;
mod query;
mod raw_types;

pub use parser::{UNNAMED_STREET, parse_overpass_response};
pub use query::build_street_query;
pub use raw_types::{OverpassCoord, OverpassElement, OverpassResponse, OverpassTags};
