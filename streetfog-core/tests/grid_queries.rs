//! Graph building and nearest-entity queries on the grid fixture

mod common;

use common::*;
use streetfog_core::prelude::*;

#[test]
fn test_grid_topology() {
    let graph = grid_graph();

    assert_eq!(graph.segment_count(), 12);
    assert_eq!(graph.intersection_count(), 9);

    let degrees: Vec<usize> = [(0, 0), (0, 2), (2, 0), (2, 2)]
        .iter()
        .map(|&(r, c)| {
            let key = NodeKey::from_point(node(r, c), graph.precision());
            graph
                .intersection(graph.intersection_by_key(&key).unwrap())
                .unwrap()
                .degree()
        })
        .collect();
    assert_eq!(degrees, vec![2, 2, 2, 2]);

    let center_key = NodeKey::from_point(center(), graph.precision());
    let center_node = graph
        .intersection(graph.intersection_by_key(&center_key).unwrap())
        .unwrap();
    assert_eq!(center_node.degree(), 4);
    assert_eq!(center_node.street_names.len(), 2);
}

#[test]
fn test_every_reference_resolves() {
    let graph = grid_graph();

    for (index, segment) in graph.segments() {
        for end in [segment.start_node, segment.end_node] {
            let intersection = graph.intersection(end).unwrap();
            assert!(intersection.connected_segments.contains(&index));
        }
    }
    for (_, intersection) in graph.intersections() {
        for &edge in &intersection.connected_segments {
            assert!(graph.segment(edge).is_some());
        }
    }
}

#[test]
fn test_nearest_segments_sorted() {
    let graph = grid_graph();
    let query = StreetPoint::new(LAT0 + 0.0012, LON0 + 0.0009);

    let results = nearest_segments(&graph, query, 12, ExploredFilter::All);
    assert_eq!(results.len(), 12);
    assert!(
        results
            .windows(2)
            .all(|pair| pair[0].distance <= pair[1].distance)
    );

    let top3 = nearest_segments(&graph, query, 3, ExploredFilter::All);
    assert_eq!(top3.len(), 3);
    assert_eq!(top3[0].index, results[0].index);
}

#[test]
fn test_nearest_segment_reports_direction() {
    let graph = grid_graph();
    // 20 m south of the middle of the top-left horizontal block (way 5)
    let target = midpoint(&graph, 5);
    let query = StreetPoint::new(target.latitude - 0.00018, target.longitude);

    let nearest = &nearest_segments(&graph, query, 1, ExploredFilter::All)[0];
    assert_eq!(nearest.segment.way_id, 5);
    assert_eq!(nearest.direction, CardinalDirection::N);
    assert!((nearest.distance - 20.0).abs() < 1.0, "got {}", nearest.distance);
}

#[test]
fn test_filter_after_marking_explored() {
    let mut graph = grid_graph();
    let tracker = ExplorationTracker::default();

    for way_id in [3, 10] {
        let edge = graph.segment_by_way(way_id).unwrap();
        assert!(tracker.mark_segment_explored(&mut graph, edge, at(0)));
    }
    let query = center();

    let unexplored = nearest_segments(&graph, query, 100, ExploredFilter::Unexplored);
    assert_eq!(unexplored.len(), graph.segment_count() - 2);

    let explored = nearest_segments(&graph, query, 100, ExploredFilter::Explored);
    let mut ids: Vec<WayId> = explored.iter().map(|s| s.segment.way_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![3, 10]);
}

#[test]
fn test_nearest_intersections_from_center() {
    let graph = grid_graph();

    let results = nearest_intersections(&graph, center(), 5, ExploredFilter::All);
    assert_eq!(results.len(), 5);
    assert!(results[0].distance < 1e-6);
    assert_eq!(
        results[0].intersection.key,
        NodeKey::from_point(center(), graph.precision())
    );
    // East-west neighbours are closer than north-south ones at this latitude
    assert!((results[1].distance - results[2].distance).abs() < 1e-6);
    assert!(results[2].distance < results[3].distance);
}

#[test]
fn test_geojson_export() {
    let graph = grid_graph();

    let collection = graph.to_geojson().unwrap();
    assert_eq!(collection.features.len(), 12);

    let feature = &collection.features[0];
    let properties = feature.properties.as_ref().unwrap();
    assert_eq!(properties["way_id"], 1);
    assert_eq!(properties["street_type"], "residential");
    assert_eq!(properties["is_explored"], false);
}
