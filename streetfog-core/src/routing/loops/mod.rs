//! Bounded-distance walking loops that start and end at the same
//! intersection.

mod search;
mod to_geojson;

pub use search::find_loop;

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Intersection, StreetGraph, StreetSegment};

/// Search limits for [`find_loop`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Maximum number of branch extensions before giving up
    pub max_expansions: usize,
    /// The nearest street must lie within this many meters of the start
    pub max_start_distance: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_expansions: 10_000,
            max_start_distance: 250.0,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoopError {
    #[error("No loop: the street network dead-ends")]
    DeadEnd,
    #[error("No loop fits within {max_distance:.0} m")]
    OverBudget { max_distance: f64 },
    #[error("Loop search stopped after {expansions} expansions")]
    SearchLimit { expansions: usize },
}

impl LoopError {
    /// Stable machine-readable tag
    pub fn tag(&self) -> &'static str {
        match self {
            Self::DeadEnd => "dead_end",
            Self::OverBudget { .. } => "over_budget",
            Self::SearchLimit { .. } => "search_limit",
        }
    }
}

/// Arrival at `intersection` over `segment`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopWaypoint {
    pub intersection: NodeIndex,
    pub segment: EdgeIndex,
    /// Cumulative meters walked on arrival
    pub distance_from_start: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopRoute {
    pub start: NodeIndex,
    /// The last waypoint arrives back at `start`
    pub waypoints: Vec<LoopWaypoint>,
    pub total_distance: f64,
}

impl LoopRoute {
    /// Intersections in walking order, starting and ending at `start`
    pub fn intersections(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::once(self.start).chain(self.waypoints.iter().map(|w| w.intersection))
    }

    /// Waypoints resolved against the graph they were found in
    pub fn legs<'a>(&'a self, graph: &'a StreetGraph) -> impl Iterator<Item = LoopLeg<'a>> + 'a {
        self.waypoints.iter().filter_map(|waypoint| {
            Some(LoopLeg {
                intersection: graph.intersection(waypoint.intersection)?,
                segment: graph.segment(waypoint.segment)?,
                distance_from_start: waypoint.distance_from_start,
            })
        })
    }
}

/// A [`LoopWaypoint`] with its intersection and segment looked up
#[derive(Debug, Clone, Copy)]
pub struct LoopLeg<'a> {
    pub intersection: &'a Intersection,
    pub segment: &'a StreetSegment,
    pub distance_from_start: f64,
}
