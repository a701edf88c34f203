//! K-nearest segment and intersection queries

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use super::geometry::{CardinalDirection, bearing, closest_point_on_polyline, distance};
use crate::{ExplorationState, Intersection, StreetGraph, StreetPoint, StreetSegment};

/// Restricts query results by exploration state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExploredFilter {
    #[default]
    All,
    Explored,
    Unexplored,
}

impl ExploredFilter {
    pub fn accepts(self, state: &ExplorationState) -> bool {
        match self {
            Self::All => true,
            Self::Explored => state.is_explored,
            Self::Unexplored => !state.is_explored,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NearbySegment<'a> {
    pub index: EdgeIndex,
    pub segment: &'a StreetSegment,
    /// Closest location on the segment geometry
    pub closest_point: StreetPoint,
    pub distance: f64,
    /// Bearing from the query point to `closest_point`
    pub bearing: f64,
    pub direction: CardinalDirection,
}

#[derive(Debug, Clone)]
pub struct NearbyIntersection<'a> {
    pub index: NodeIndex,
    pub intersection: &'a Intersection,
    pub distance: f64,
    pub bearing: f64,
    pub direction: CardinalDirection,
}

/// Up to `k` segments nearest to `point`, ascending by distance.
/// Ties keep graph order.
pub fn nearest_segments(
    graph: &StreetGraph,
    point: StreetPoint,
    k: usize,
    filter: ExploredFilter,
) -> Vec<NearbySegment<'_>> {
    let mut results: Vec<NearbySegment<'_>> = graph
        .segments()
        .filter(|(_, segment)| filter.accepts(&segment.exploration))
        .filter_map(|(index, segment)| {
            let projection = closest_point_on_polyline(point, &segment.points);
            let closest_point = projection.point?;
            let heading = bearing(point, closest_point);
            Some(NearbySegment {
                index,
                segment,
                closest_point,
                distance: projection.distance,
                bearing: heading,
                direction: CardinalDirection::from_bearing(heading),
            })
        })
        .collect();

    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    results.truncate(k);
    results
}

/// Up to `k` intersections nearest to `point`, ascending by distance
pub fn nearest_intersections(
    graph: &StreetGraph,
    point: StreetPoint,
    k: usize,
    filter: ExploredFilter,
) -> Vec<NearbyIntersection<'_>> {
    let mut results: Vec<NearbyIntersection<'_>> = graph
        .intersections()
        .filter(|(_, intersection)| filter.accepts(&intersection.exploration))
        .map(|(index, intersection)| {
            let heading = bearing(point, intersection.location);
            NearbyIntersection {
                index,
                intersection,
                distance: distance(point, intersection.location),
                bearing: heading,
                direction: CardinalDirection::from_bearing(heading),
            }
        })
        .collect();

    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    results.truncate(k);
    results
}
