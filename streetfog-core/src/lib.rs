//! Street graph and confidence-scored exploration engine.
//!
//! Turns road geometry fetched from an Overpass-style geodata service into a
//! graph of street segments and intersections, tracks which of them a walker
//! has actually explored from noisy GPS samples, and answers spatial queries
//! (nearest streets, walking loops) against that graph.

pub mod algo;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod session;

pub use error::Error;
pub use model::{
    BoundingBox, ExplorationState, GpsSample, Intersection, NodeKey, StreetGraph, StreetPoint,
    StreetSegment, StreetType,
};

/// Source way identifier (OSM way id)
pub type WayId = i64;
/// Index of a street segment in the graph arena
pub type SegmentIndex = petgraph::graph::EdgeIndex;
/// Index of an intersection in the graph arena
pub type IntersectionIndex = petgraph::graph::NodeIndex;
/// Duration in milliseconds
pub type Millis = u64;

/// Decimal places used to round way endpoints into intersection keys (~1.1 m)
pub const DEFAULT_NODE_PRECISION: u32 = 5;
