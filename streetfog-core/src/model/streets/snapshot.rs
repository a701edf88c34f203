//! Flat serde document for host-side persistence

use petgraph::graph::UnGraph;
use serde::{Deserialize, Serialize};

use super::components::{Intersection, StreetSegment};
use super::network::StreetGraph;
use crate::Error;
use crate::loading::GraphBuildConfig;

/// Serializable form of a [`StreetGraph`], exploration state included.
///
/// Intersections and segments are stored in index order, so the indices
/// referenced by `start_node`, `end_node` and `connected_segments` stay valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub precision: u32,
    pub intersections: Vec<Intersection>,
    pub segments: Vec<StreetSegment>,
}

impl StreetGraph {
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            precision: self.precision(),
            intersections: self.graph.node_weights().cloned().collect(),
            segments: self.graph.edge_weights().cloned().collect(),
        }
    }

    /// Rebuilds a graph from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an out-of-range precision and
    /// [`Error::InvalidData`] if segments and intersections do not reference
    /// each other consistently.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, Error> {
        let GraphSnapshot {
            precision,
            intersections,
            segments,
        } = snapshot;
        GraphBuildConfig {
            node_precision: precision,
        }
        .validate()?;
        let node_count = intersections.len();
        let edge_count = segments.len();

        for segment in &segments {
            if segment.start_node.index() >= node_count || segment.end_node.index() >= node_count
            {
                return Err(Error::InvalidData(format!(
                    "Segment for way {} references a missing intersection",
                    segment.way_id
                )));
            }
            if segment.points.len() < 2 {
                return Err(Error::InvalidData(format!(
                    "Segment for way {} has fewer than two points",
                    segment.way_id
                )));
            }
        }

        // Every listed segment must touch the intersection listing it
        for (index, node) in intersections.iter().enumerate() {
            for edge in &node.connected_segments {
                let Some(segment) = segments.get(edge.index()) else {
                    return Err(Error::InvalidData(format!(
                        "Intersection {} references missing segment {}",
                        node.key,
                        edge.index()
                    )));
                };
                if segment.start_node.index() != index && segment.end_node.index() != index {
                    return Err(Error::InvalidData(format!(
                        "Intersection {} lists way {} which does not touch it",
                        node.key, segment.way_id
                    )));
                }
            }
        }

        // and every segment must be listed on both of its endpoints
        for (index, segment) in segments.iter().enumerate() {
            let listed = [segment.start_node, segment.end_node].iter().all(|node| {
                intersections[node.index()]
                    .connected_segments
                    .iter()
                    .any(|edge| edge.index() == index)
            });
            if !listed {
                return Err(Error::InvalidData(format!(
                    "Way {} is missing from its endpoint intersections",
                    segment.way_id
                )));
            }
        }

        let mut graph: UnGraph<Intersection, StreetSegment> =
            UnGraph::with_capacity(node_count, edge_count);
        for node in intersections {
            graph.add_node(node);
        }
        for segment in segments {
            graph.add_edge(segment.start_node, segment.end_node, segment);
        }

        Ok(Self::from_arena(graph, precision))
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }
}
