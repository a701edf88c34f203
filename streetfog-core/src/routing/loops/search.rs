use fixedbitset::FixedBitSet;
use log::debug;
use petgraph::graph::{EdgeIndex, NodeIndex};

use super::{LoopConfig, LoopError, LoopRoute, LoopWaypoint};
use crate::algo::geometry::distance;
use crate::algo::nearest::{ExploredFilter, nearest_segments};
use crate::{StreetGraph, StreetPoint};

/// Partial loop ending at `node`
struct Frame {
    node: NodeIndex,
    /// Segment used to reach `node`, `None` for the start
    via: Option<EdgeIndex>,
    distance: f64,
    /// Outgoing segments, most preferred first
    candidates: Vec<EdgeIndex>,
    cursor: usize,
}

/// Finds a walking loop of at most `max_distance` meters that starts and
/// ends at the intersection nearest to `start`.
///
/// Depth-first search over simple cycles: no segment is walked twice and no
/// intermediate intersection is revisited. At each intersection a segment
/// that closes the loop is tried first, then turns are preferred over going
/// straight (right before left). Branches that would exceed the budget are
/// cut.
pub fn find_loop(
    graph: &StreetGraph,
    start: StreetPoint,
    max_distance: f64,
    config: &LoopConfig,
) -> Result<LoopRoute, LoopError> {
    if graph.segment_count() == 0 {
        return Err(LoopError::DeadEnd);
    }

    let Some(nearest) = nearest_segments(graph, start, 1, ExploredFilter::All)
        .into_iter()
        .next()
    else {
        return Err(LoopError::DeadEnd);
    };
    if nearest.distance > config.max_start_distance {
        debug!(
            "Nearest street is {:.0} m away, beyond {:.0} m",
            nearest.distance, config.max_start_distance
        );
        return Err(LoopError::DeadEnd);
    }
    if max_distance.is_nan() || max_distance <= 0.0 {
        return Err(LoopError::OverBudget { max_distance });
    }

    let segment = nearest.segment;
    let start_node = nearer_endpoint(graph, start, segment.start_node, segment.end_node);

    let mut used_segments = FixedBitSet::with_capacity(graph.segment_count());
    let mut visited = FixedBitSet::with_capacity(graph.intersection_count());
    visited.insert(start_node.index());

    let mut stack = vec![Frame {
        node: start_node,
        via: None,
        distance: 0.0,
        candidates: ranked_candidates(graph, start_node, None, start_node),
        cursor: 0,
    }];
    let mut budget_hit = false;
    let mut expansions = 0;

    while let Some(frame) = stack.last_mut() {
        let Some(&edge) = frame.candidates.get(frame.cursor) else {
            // Exhausted: backtrack
            if let Some(done) = stack.pop() {
                if let Some(via) = done.via {
                    used_segments.set(via.index(), false);
                }
                if done.node != start_node {
                    visited.set(done.node.index(), false);
                }
            }
            continue;
        };
        frame.cursor += 1;

        if used_segments.contains(edge.index()) {
            continue;
        }
        let Some(segment) = graph.segment(edge) else {
            continue;
        };
        if segment.length_meters <= 0.0 {
            continue;
        }

        let next = segment.other_end(frame.node);
        let next_distance = frame.distance + segment.length_meters;
        if next_distance > max_distance {
            budget_hit = true;
            continue;
        }

        if next == start_node {
            let mut waypoints: Vec<LoopWaypoint> = stack
                .iter()
                .filter_map(|f| {
                    f.via.map(|via| LoopWaypoint {
                        intersection: f.node,
                        segment: via,
                        distance_from_start: f.distance,
                    })
                })
                .collect();
            waypoints.push(LoopWaypoint {
                intersection: start_node,
                segment: edge,
                distance_from_start: next_distance,
            });

            debug!(
                "Found loop of {:.0} m with {} waypoints after {} expansions",
                next_distance,
                waypoints.len(),
                expansions
            );
            return Ok(LoopRoute {
                start: start_node,
                waypoints,
                total_distance: next_distance,
            });
        }

        if visited.contains(next.index()) {
            continue;
        }

        expansions += 1;
        if expansions > config.max_expansions {
            return Err(LoopError::SearchLimit {
                expansions: config.max_expansions,
            });
        }

        used_segments.insert(edge.index());
        visited.insert(next.index());
        let candidates = ranked_candidates(graph, next, Some(edge), start_node);
        stack.push(Frame {
            node: next,
            via: Some(edge),
            distance: next_distance,
            candidates,
            cursor: 0,
        });
    }

    if budget_hit {
        Err(LoopError::OverBudget { max_distance })
    } else {
        Err(LoopError::DeadEnd)
    }
}

fn nearer_endpoint(graph: &StreetGraph, point: StreetPoint, a: NodeIndex, b: NodeIndex) -> NodeIndex {
    let distance_to = |node: NodeIndex| {
        graph
            .intersection(node)
            .map_or(f64::INFINITY, |n| distance(point, n.location))
    };
    if distance_to(b) < distance_to(a) { b } else { a }
}

/// Signed turn angle in `(-180, 180]`; positive turns right
fn turn_angle(arrival: f64, departure: f64) -> f64 {
    let turn = (departure - arrival).rem_euclid(360.0);
    if turn > 180.0 { turn - 360.0 } else { turn }
}

/// Outgoing segments of `node` except `via`, ordered by preference:
/// closing the loop first, then turns closest to 90 degrees, right turns
/// winning ties. At the start (no `via`) graph order is kept.
fn ranked_candidates(
    graph: &StreetGraph,
    node: NodeIndex,
    via: Option<EdgeIndex>,
    start_node: NodeIndex,
) -> Vec<EdgeIndex> {
    let Some(intersection) = graph.intersection(node) else {
        return Vec::new();
    };
    let arrival = via
        .and_then(|edge| graph.segment(edge))
        .map(|segment| segment.arrival_bearing(node));

    let mut ranked: Vec<(bool, f64, bool, EdgeIndex)> = intersection
        .connected_segments
        .iter()
        .filter(|&&edge| Some(edge) != via)
        .filter_map(|&edge| {
            let segment = graph.segment(edge)?;
            let closes = node != start_node && segment.other_end(node) == start_node;
            let (straightness, left) = match arrival {
                Some(arrival) => {
                    let turn = turn_angle(arrival, segment.departure_bearing(node));
                    ((90.0 - turn.abs()).abs(), turn < 0.0)
                }
                None => (0.0, false),
            };
            Some((!closes, straightness, left, edge))
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });
    ranked.into_iter().map(|(_, _, _, edge)| edge).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_angle_sign() {
        assert!((turn_angle(0.0, 90.0) - 90.0).abs() < 1e-9);
        assert!((turn_angle(0.0, 270.0) + 90.0).abs() < 1e-9);
        assert!((turn_angle(270.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((turn_angle(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((turn_angle(90.0, 270.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_graph_is_dead_end() {
        let result = find_loop(
            &StreetGraph::empty(),
            StreetPoint::new(0.0, 0.0),
            1_000.0,
            &LoopConfig::default(),
        );
        assert_eq!(result, Err(LoopError::DeadEnd));
    }
}
