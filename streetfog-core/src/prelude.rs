pub use crate::DEFAULT_NODE_PRECISION;

// Re-export key components
pub use crate::algo::exploration::{ExplorationTracker, TrackerConfig, TrackingSummary};
pub use crate::algo::geometry::{
    CardinalDirection, bearing, closest_point_on_polyline, distance, polyline_length,
};
pub use crate::algo::nearest::{
    ExploredFilter, NearbyIntersection, NearbySegment, nearest_intersections, nearest_segments,
};
pub use crate::loading::{
    CacheKey, ConnectivityStatus, FetchConfig, FetchError, GraphBuildConfig, GraphFetch,
    OverpassTransport, ReqwestTransport, StreetDataClient, Way, build_street_graph,
};
pub use crate::model::{
    BoundingBox, CoverageStats, ExplorationState, GpsSample, GraphSnapshot, Intersection, NodeKey,
    StreetGraph, StreetPoint, StreetSegment, StreetType,
};
pub use crate::routing::loops::{
    LoopConfig, LoopError, LoopLeg, LoopRoute, LoopWaypoint, find_loop,
};
pub use crate::session::{ExplorationSession, GraphLoad};

// Core identifier types
pub use crate::IntersectionIndex;
pub use crate::Millis;
pub use crate::SegmentIndex;
pub use crate::WayId;
pub use crate::error::Error;
