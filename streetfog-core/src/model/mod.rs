//! Data model for street exploration
//!
//! Contains coordinate types and the street graph with its per-entity
//! exploration state.

pub mod point;
pub mod streets;

pub use point::{BoundingBox, GpsSample, StreetPoint};
pub use streets::{
    CoverageStats, ExplorationState, GraphSnapshot, Intersection, NodeKey, StreetGraph,
    StreetSegment, StreetType,
};
