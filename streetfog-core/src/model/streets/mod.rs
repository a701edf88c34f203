//! Street network model

pub mod components;
pub mod network;
mod snapshot;
mod to_geojson;

pub use components::{ExplorationState, Intersection, NodeKey, StreetSegment, StreetType};
pub use network::{CoverageStats, IndexedPoint, IndexedSegment, StreetGraph};
pub use snapshot::GraphSnapshot;
