//! Street network components - intersections, segments and exploration state

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use itertools::Either;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::algo::geometry::bearing;
use crate::{Millis, SegmentIndex, StreetPoint, WayId};

/// Identity of an intersection: its coordinate rounded to a fixed number of
/// decimal places. Way endpoints that round to the same key are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    lat: i64,
    lon: i64,
    precision: u32,
}

impl NodeKey {
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_point(point: StreetPoint, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        Self {
            lat: (point.latitude * scale).round() as i64,
            lon: (point.longitude * scale).round() as i64,
            precision,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}

impl fmt::Display for NodeKey {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10f64.powi(self.precision as i32);
        let digits = self.precision as usize;
        write!(
            f,
            "{:.*},{:.*}",
            digits,
            self.lat as f64 / scale,
            digits,
            self.lon as f64 / scale
        )
    }
}

/// Road class from the source `highway` tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetType {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Unclassified,
    Residential,
    LivingStreet,
    Service,
    Pedestrian,
    Footway,
    Path,
    Cycleway,
    Steps,
    Track,
    Other(String),
}

impl StreetType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "motorway" | "motorway_link" => Self::Motorway,
            "trunk" | "trunk_link" => Self::Trunk,
            "primary" | "primary_link" => Self::Primary,
            "secondary" | "secondary_link" => Self::Secondary,
            "tertiary" | "tertiary_link" => Self::Tertiary,
            "unclassified" => Self::Unclassified,
            "residential" => Self::Residential,
            "living_street" => Self::LivingStreet,
            "service" => Self::Service,
            "pedestrian" => Self::Pedestrian,
            "footway" => Self::Footway,
            "path" => Self::Path,
            "cycleway" => Self::Cycleway,
            "steps" => Self::Steps,
            "track" => Self::Track,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::Motorway => "motorway",
            Self::Trunk => "trunk",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::Unclassified => "unclassified",
            Self::Residential => "residential",
            Self::LivingStreet => "living_street",
            Self::Service => "service",
            Self::Pedestrian => "pedestrian",
            Self::Footway => "footway",
            Self::Path => "path",
            Self::Cycleway => "cycleway",
            Self::Steps => "steps",
            Self::Track => "track",
            Self::Other(tag) => tag,
        }
    }
}

/// Per-entity exploration bookkeeping, zero-valued until the first GPS
/// sample comes within tracking range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorationState {
    /// Smoothed confidence in `[0, 1]` that the entity was walked
    pub confidence_score: f64,
    /// Number of samples observed within tracking range
    pub visit_count: u32,
    /// Accumulated time spent within tracking range
    pub total_time_nearby: Millis,
    /// Running mean of sample distances in meters
    pub average_distance: f64,
    pub last_visited: Option<DateTime<Utc>>,
    /// Set once, never cleared by tracking
    pub is_explored: bool,
    pub explored_at: Option<DateTime<Utc>>,
}

/// Street graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub key: NodeKey,
    /// Representative coordinate (first way endpoint seen for the key)
    pub location: StreetPoint,
    /// Names of every segment touching this intersection
    pub street_names: BTreeSet<String>,
    /// Touching segments in insertion order
    pub connected_segments: Vec<SegmentIndex>,
    pub exploration: ExplorationState,
}

impl Intersection {
    pub fn new(key: NodeKey, location: StreetPoint) -> Self {
        Self {
            key,
            location,
            street_names: BTreeSet::new(),
            connected_segments: Vec::new(),
            exploration: ExplorationState::default(),
        }
    }

    pub fn degree(&self) -> usize {
        self.connected_segments.len()
    }
}

/// Street graph edge: one source way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetSegment {
    pub way_id: WayId,
    pub name: String,
    pub street_type: Option<StreetType>,
    /// Way geometry, at least two points
    pub points: Vec<StreetPoint>,
    pub start_node: NodeIndex,
    pub end_node: NodeIndex,
    pub length_meters: f64,
    pub exploration: ExplorationState,
}

impl StreetSegment {
    /// Endpoint opposite to `node`. For a closed way both ends are `node`.
    pub fn other_end(&self, node: NodeIndex) -> NodeIndex {
        if node == self.start_node {
            self.end_node
        } else {
            self.start_node
        }
    }

    /// Compass heading when leaving `node` along this segment
    pub fn departure_bearing(&self, node: NodeIndex) -> f64 {
        let last = self.points.len() - 1;
        if node == self.start_node {
            bearing(self.points[0], self.points[1])
        } else {
            bearing(self.points[last], self.points[last - 1])
        }
    }

    /// Compass heading when arriving at `node` along this segment
    pub fn arrival_bearing(&self, node: NodeIndex) -> f64 {
        let last = self.points.len() - 1;
        if node == self.end_node {
            bearing(self.points[last - 1], self.points[last])
        } else {
            bearing(self.points[1], self.points[0])
        }
    }

    /// Geometry oriented so that it starts at `from`
    pub fn points_from(&self, from: NodeIndex) -> impl Iterator<Item = StreetPoint> + '_ {
        if from == self.start_node {
            Either::Left(self.points.iter().copied())
        } else {
            Either::Right(self.points.iter().rev().copied())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> StreetSegment {
        StreetSegment {
            way_id: 7,
            name: "Test Street".to_string(),
            street_type: Some(StreetType::Residential),
            points: vec![
                StreetPoint::new(0.0, 0.0),
                StreetPoint::new(0.0, 0.001),
                StreetPoint::new(0.001, 0.001),
            ],
            start_node: NodeIndex::new(0),
            end_node: NodeIndex::new(1),
            length_meters: 0.0,
            exploration: ExplorationState::default(),
        }
    }

    #[test]
    fn test_node_key_merges_nearby_points() {
        let a = NodeKey::from_point(StreetPoint::new(52.520_001, 13.404_999), 5);
        let b = NodeKey::from_point(StreetPoint::new(52.519_998, 13.405_002), 5);
        let c = NodeKey::from_point(StreetPoint::new(52.520_1, 13.405), 5);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "52.52000,13.40500");
    }

    #[test]
    fn test_street_type_tags() {
        assert_eq!(StreetType::from_tag("residential"), StreetType::Residential);
        assert_eq!(StreetType::from_tag("primary_link"), StreetType::Primary);
        assert_eq!(
            StreetType::from_tag("bridleway"),
            StreetType::Other("bridleway".to_string())
        );
        assert_eq!(StreetType::LivingStreet.as_tag(), "living_street");
    }

    #[test]
    fn test_segment_orientation() {
        let segment = segment();
        let start = NodeIndex::new(0);
        let end = NodeIndex::new(1);

        assert_eq!(segment.other_end(start), end);
        assert_eq!(segment.other_end(end), start);

        // Leaves the start heading east, arrives at the end heading north
        assert!((segment.departure_bearing(start) - 90.0).abs() < 1.0);
        assert!(segment.arrival_bearing(end).abs() < 1.0);
        // Leaves the end heading south
        assert!((segment.departure_bearing(end) - 180.0).abs() < 1.0);

        let reversed: Vec<_> = segment.points_from(end).collect();
        assert_eq!(reversed.first(), segment.points.last());
        assert_eq!(reversed.len(), 3);
    }
}
