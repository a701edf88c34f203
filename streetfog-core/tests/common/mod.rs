//! Shared fixtures: a 3x3 street grid near Berlin Mitte.
//!
//! Rows run west to east, columns south to north. Grid spacing is 0.001°
//! (~111 m north-south, ~68 m east-west). Ways 1..=6 are the horizontal
//! blocks (two per row), ways 7..=12 the vertical blocks (two per column).

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use streetfog_core::prelude::*;

pub const LAT0: f64 = 52.52;
pub const LON0: f64 = 13.40;
pub const SPACING: f64 = 0.001;

pub fn node(row: usize, col: usize) -> StreetPoint {
    StreetPoint::new(LAT0 + row as f64 * SPACING, LON0 + col as f64 * SPACING)
}

pub fn center() -> StreetPoint {
    node(1, 1)
}

pub fn grid_ways() -> Vec<Way> {
    let mut ways = Vec::with_capacity(12);
    let mut id = 1;

    for row in 0..3 {
        for col in 0..2 {
            ways.push(Way {
                id,
                name: format!("Row {row}"),
                street_type: Some(StreetType::Residential),
                points: vec![node(row, col), node(row, col + 1)],
            });
            id += 1;
        }
    }
    for col in 0..3 {
        for row in 0..2 {
            ways.push(Way {
                id,
                name: format!("Column {col}"),
                street_type: Some(StreetType::Footway),
                points: vec![node(row, col), node(row + 1, col)],
            });
            id += 1;
        }
    }

    ways
}

pub fn grid_graph() -> StreetGraph {
    build_street_graph(&grid_ways(), &GraphBuildConfig::default()).unwrap()
}

/// The grid as an Overpass `out geom` response body
pub fn grid_overpass_body() -> Vec<u8> {
    let elements: Vec<serde_json::Value> = grid_ways()
        .iter()
        .map(|way| {
            json!({
                "type": "way",
                "id": way.id,
                "tags": {
                    "highway": way.street_type.as_ref().map(|t| t.as_tag()),
                    "name": way.name,
                },
                "geometry": way.points.iter()
                    .map(|p| json!({"lat": p.latitude, "lon": p.longitude}))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    serde_json::to_vec(&json!({ "version": 0.6, "elements": elements }))
        .expect("fixture serializes")
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

/// Midpoint of the segment carrying `way_id`
pub fn midpoint(graph: &StreetGraph, way_id: WayId) -> StreetPoint {
    let segment = graph
        .segment(graph.segment_by_way(way_id).unwrap())
        .unwrap();
    let a = segment.points[0];
    let b = segment.points[segment.points.len() - 1];
    StreetPoint::new(
        (a.latitude + b.latitude) / 2.0,
        (a.longitude + b.longitude) / 2.0,
    )
}
