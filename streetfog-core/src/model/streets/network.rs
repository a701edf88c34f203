//! Street graph: arena of intersections and segments plus spatial indices

use hashbrown::HashMap;
use itertools::Itertools;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use rstar::{AABB, RTree, RTreeObject};

use super::components::{Intersection, NodeKey, StreetSegment};
use crate::{BoundingBox, DEFAULT_NODE_PRECISION, WayId};

/// Intersection location indexed for box queries
#[derive(Debug, Clone, Copy)]
pub struct IndexedPoint {
    pub index: NodeIndex,
    coords: [f64; 2],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords)
    }
}

/// Segment bounding envelope indexed for box queries
#[derive(Debug, Clone, Copy)]
pub struct IndexedSegment {
    pub index: EdgeIndex,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Explored vs. total counts for a graph
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoverageStats {
    pub explored_segments: usize,
    pub total_segments: usize,
    pub explored_intersections: usize,
    pub total_intersections: usize,
    pub explored_length_meters: f64,
    pub total_length_meters: f64,
}

impl CoverageStats {
    /// Share of street length explored, `0.0` for an empty graph
    pub fn explored_ratio(&self) -> f64 {
        if self.total_length_meters > 0.0 {
            self.explored_length_meters / self.total_length_meters
        } else {
            0.0
        }
    }
}

/// Street graph with dense integer indices.
///
/// Intersections are nodes and segments are edges of an undirected petgraph
/// arena, so `NodeIndex`/`EdgeIndex` double as intersection/segment ids.
/// Key and way-id lookups and two R-trees are kept alongside.
#[derive(Debug, Clone)]
pub struct StreetGraph {
    pub(crate) graph: UnGraph<Intersection, StreetSegment>,
    node_lookup: HashMap<NodeKey, NodeIndex>,
    way_lookup: HashMap<WayId, EdgeIndex>,
    segment_tree: RTree<IndexedSegment>,
    intersection_tree: RTree<IndexedPoint>,
    precision: u32,
}

impl Default for StreetGraph {
    fn default() -> Self {
        Self::empty()
    }
}

impl StreetGraph {
    pub fn empty() -> Self {
        Self::from_arena(UnGraph::default(), DEFAULT_NODE_PRECISION)
    }

    /// Wraps a fully built arena and derives lookups and spatial indices
    pub(crate) fn from_arena(graph: UnGraph<Intersection, StreetSegment>, precision: u32) -> Self {
        let node_lookup = graph
            .node_indices()
            .map(|index| (graph[index].key, index))
            .collect();
        let way_lookup = graph
            .edge_indices()
            .map(|index| (graph[index].way_id, index))
            .collect();

        let intersection_tree = RTree::bulk_load(
            graph
                .node_indices()
                .map(|index| IndexedPoint {
                    index,
                    coords: graph[index].location.as_lon_lat(),
                })
                .collect(),
        );
        let segment_tree = RTree::bulk_load(
            graph
                .edge_indices()
                .map(|index| {
                    let coords: Vec<[f64; 2]> = graph[index]
                        .points
                        .iter()
                        .map(|point| point.as_lon_lat())
                        .collect();
                    IndexedSegment {
                        index,
                        envelope: AABB::from_points(&coords),
                    }
                })
                .collect(),
        );

        Self {
            graph,
            node_lookup,
            way_lookup,
            segment_tree,
            intersection_tree,
            precision,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn intersection_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0 && self.graph.edge_count() == 0
    }

    /// Decimal places used to derive intersection keys
    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn segment(&self, index: EdgeIndex) -> Option<&StreetSegment> {
        self.graph.edge_weight(index)
    }

    pub fn intersection(&self, index: NodeIndex) -> Option<&Intersection> {
        self.graph.node_weight(index)
    }

    pub(crate) fn segment_mut(&mut self, index: EdgeIndex) -> Option<&mut StreetSegment> {
        self.graph.edge_weight_mut(index)
    }

    pub(crate) fn intersection_mut(&mut self, index: NodeIndex) -> Option<&mut Intersection> {
        self.graph.node_weight_mut(index)
    }

    pub fn segments(&self) -> impl Iterator<Item = (EdgeIndex, &StreetSegment)> {
        self.graph
            .edge_indices()
            .map(move |index| (index, &self.graph[index]))
    }

    pub fn intersections(&self) -> impl Iterator<Item = (NodeIndex, &Intersection)> {
        self.graph
            .node_indices()
            .map(move |index| (index, &self.graph[index]))
    }

    pub fn segment_by_way(&self, way_id: WayId) -> Option<EdgeIndex> {
        self.way_lookup.get(&way_id).copied()
    }

    pub fn intersection_by_key(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.node_lookup.get(key).copied()
    }

    /// Segments whose envelope intersects `bbox`, each reported once
    pub fn segments_within(&self, bbox: BoundingBox) -> impl Iterator<Item = EdgeIndex> + '_ {
        bbox.envelopes()
            .flat_map(move |envelope| {
                self.segment_tree
                    .locate_in_envelope_intersecting(&envelope)
                    .map(|item| item.index)
            })
            .unique()
    }

    /// Intersections located inside `bbox`
    pub fn intersections_within(
        &self,
        bbox: BoundingBox,
    ) -> impl Iterator<Item = NodeIndex> + '_ {
        bbox.envelopes().flat_map(move |envelope| {
            self.intersection_tree
                .locate_in_envelope(&envelope)
                .map(|item| item.index)
        })
    }

    pub fn coverage(&self) -> CoverageStats {
        let mut stats = CoverageStats {
            total_segments: self.segment_count(),
            total_intersections: self.intersection_count(),
            ..CoverageStats::default()
        };

        for segment in self.graph.edge_weights() {
            stats.total_length_meters += segment.length_meters;
            if segment.exploration.is_explored {
                stats.explored_segments += 1;
                stats.explored_length_meters += segment.length_meters;
            }
        }
        stats.explored_intersections = self
            .graph
            .node_weights()
            .filter(|node| node.exploration.is_explored)
            .count();

        stats
    }

    /// Copies exploration state from `previous` onto entities with the same
    /// way id or intersection key. Returns how many entities were carried over.
    pub fn adopt_exploration(&mut self, previous: &StreetGraph) -> usize {
        let mut adopted = 0;

        for segment in self.graph.edge_weights_mut() {
            if let Some(old) = previous.segment_by_way(segment.way_id) {
                segment.exploration = previous.graph[old].exploration.clone();
                adopted += 1;
            }
        }
        for node in self.graph.node_weights_mut() {
            if let Some(old) = previous.intersection_by_key(&node.key) {
                node.exploration = previous.graph[old].exploration.clone();
                adopted += 1;
            }
        }

        adopted
    }

    /// Zeroes the exploration state of every entity
    pub fn reset_exploration(&mut self) {
        for segment in self.graph.edge_weights_mut() {
            segment.exploration = Default::default();
        }
        for node in self.graph.node_weights_mut() {
            node.exploration = Default::default();
        }
    }
}
