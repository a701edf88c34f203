use hashbrown::{HashMap, HashSet};
use log::{debug, info, warn};
use petgraph::graph::{NodeIndex, UnGraph};

use super::config::GraphBuildConfig;
use crate::algo::geometry::polyline_length;
use crate::{
    Error, Intersection, NodeKey, StreetGraph, StreetPoint, StreetSegment, StreetType, WayId,
};

/// A parsed road: one named polyline from the source data
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: WayId,
    pub name: String,
    pub street_type: Option<StreetType>,
    pub points: Vec<StreetPoint>,
}

/// Builds a street graph from ways.
///
/// Way endpoints whose coordinates round to the same [`NodeKey`] become one
/// intersection; every way becomes one segment between its two endpoint
/// intersections. Output is deterministic for a given input order.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `node_precision` is outside `1..=9`
pub fn build_street_graph(
    ways: &[Way],
    config: &GraphBuildConfig,
) -> Result<StreetGraph, Error> {
    config.validate()?;
    let precision = config.node_precision;
    let mut graph: UnGraph<Intersection, StreetSegment> =
        UnGraph::with_capacity(ways.len() + 1, ways.len());
    let mut node_lookup: HashMap<NodeKey, NodeIndex> = HashMap::with_capacity(ways.len() + 1);
    let mut seen_ways: HashSet<WayId> = HashSet::with_capacity(ways.len());
    let mut accepted: Vec<(&Way, NodeIndex, NodeIndex)> = Vec::with_capacity(ways.len());

    // Intern endpoints into intersections
    for way in ways {
        let (Some(&first), Some(&last)) = (way.points.first(), way.points.last()) else {
            debug!("Dropping way {} without geometry", way.id);
            continue;
        };
        if way.points.len() < 2 {
            debug!("Dropping way {} with a single point", way.id);
            continue;
        }
        if !seen_ways.insert(way.id) {
            warn!("Duplicate way {} ignored", way.id);
            continue;
        }

        let mut endpoint = |point: StreetPoint| {
            let key = NodeKey::from_point(point, precision);
            let node = *node_lookup
                .entry(key)
                .or_insert_with(|| graph.add_node(Intersection::new(key, point)));
            graph[node].street_names.insert(way.name.clone());
            node
        };
        let start = endpoint(first);
        let end = endpoint(last);
        accepted.push((way, start, end));
    }

    // One segment per way, registered on both endpoints
    for (way, start, end) in accepted {
        let segment = StreetSegment {
            way_id: way.id,
            name: way.name.clone(),
            street_type: way.street_type.clone(),
            points: way.points.clone(),
            start_node: start,
            end_node: end,
            length_meters: polyline_length(&way.points),
            exploration: Default::default(),
        };
        let edge = graph.add_edge(start, end, segment);

        graph[start].connected_segments.push(edge);
        if end != start {
            graph[end].connected_segments.push(edge);
        }
    }

    info!(
        "Built street graph: {} segments, {} intersections",
        graph.edge_count(),
        graph.node_count()
    );

    Ok(StreetGraph::from_arena(graph, precision))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way(id: WayId, name: &str, points: &[(f64, f64)]) -> Way {
        Way {
            id,
            name: name.to_string(),
            street_type: Some(StreetType::Residential),
            points: points
                .iter()
                .map(|&(lat, lon)| StreetPoint::new(lat, lon))
                .collect(),
        }
    }

    #[test]
    fn test_shared_endpoints_become_one_intersection() {
        let ways = vec![
            way(1, "Main Street", &[(0.0, 0.0), (0.0, 0.001)]),
            // Starts within rounding tolerance of the end of way 1
            way(2, "Main Street", &[(0.000_001, 0.001_002), (0.0, 0.002)]),
            way(3, "Side Street", &[(0.0, 0.001), (0.001, 0.001)]),
        ];
        let graph = build_street_graph(&ways, &GraphBuildConfig::default()).unwrap();

        assert_eq!(graph.segment_count(), 3);
        assert_eq!(graph.intersection_count(), 4);

        let shared_key = NodeKey::from_point(StreetPoint::new(0.0, 0.001), 5);
        let shared = graph.intersection_by_key(&shared_key).unwrap();
        let node = graph.intersection(shared).unwrap();
        assert_eq!(node.degree(), 3);
        assert_eq!(
            node.street_names.iter().collect::<Vec<_>>(),
            vec!["Main Street", "Side Street"]
        );
    }

    #[test]
    fn test_references_are_consistent() {
        let ways = vec![
            way(10, "A", &[(0.0, 0.0), (0.0, 0.001)]),
            way(11, "B", &[(0.0, 0.001), (0.001, 0.001), (0.001, 0.002)]),
            way(12, "C", &[(0.001, 0.002), (0.0, 0.0)]),
        ];
        let graph = build_street_graph(&ways, &GraphBuildConfig::default()).unwrap();

        for (index, segment) in graph.segments() {
            let start = graph.intersection(segment.start_node).unwrap();
            let end = graph.intersection(segment.end_node).unwrap();
            assert!(start.connected_segments.contains(&index));
            assert!(end.connected_segments.contains(&index));
            assert!(segment.length_meters > 0.0);
        }
        for (_, intersection) in graph.intersections() {
            for &edge in &intersection.connected_segments {
                assert!(graph.segment(edge).is_some());
            }
        }
    }

    #[test]
    fn test_drops_short_and_duplicate_ways() {
        let ways = vec![
            way(1, "A", &[(0.0, 0.0), (0.0, 0.001)]),
            way(1, "A again", &[(0.0, 0.0), (0.001, 0.0)]),
            way(2, "Stub", &[(0.5, 0.5)]),
            way(3, "Empty", &[]),
        ];
        let graph = build_street_graph(&ways, &GraphBuildConfig::default()).unwrap();

        assert_eq!(graph.segment_count(), 1);
        assert_eq!(graph.intersection_count(), 2);
        assert_eq!(graph.segment_by_way(1).map(|e| graph.segment(e).unwrap().name.as_str()), Some("A"));
    }

    #[test]
    fn test_closed_way_registered_once() {
        let ways = vec![way(
            5,
            "Loop Road",
            &[(0.0, 0.0), (0.0, 0.001), (0.001, 0.001), (0.0, 0.0)],
        )];
        let graph = build_street_graph(&ways, &GraphBuildConfig::default()).unwrap();

        assert_eq!(graph.intersection_count(), 1);
        let (_, node) = graph.intersections().next().unwrap();
        assert_eq!(node.degree(), 1);
    }

    #[test]
    fn test_rejects_out_of_range_precision() {
        let ways = vec![
            way(1, "A", &[(0.0, 0.0), (0.0, 0.001)]),
            way(2, "B", &[(0.0, 0.001), (0.001, 0.001)]),
        ];
        for node_precision in [0, 10, 19] {
            let result = build_street_graph(&ways, &GraphBuildConfig { node_precision });
            assert!(
                matches!(result, Err(Error::InvalidConfig(_))),
                "precision {node_precision} accepted"
            );
        }

        let graph = build_street_graph(&ways, &GraphBuildConfig { node_precision: 9 }).unwrap();
        assert_eq!(graph.intersection_count(), 3);
    }
}
