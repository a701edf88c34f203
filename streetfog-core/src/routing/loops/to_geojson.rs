use geo::{Coord, LineString};
use geojson::{Feature, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::LoopRoute;
use crate::{Error, StreetGraph, StreetPoint};

impl LoopRoute {
    /// The loop as a single `GeoJSON` `LineString` following the walked
    /// segment geometry from the start intersection back to it.
    pub fn to_geojson(&self, graph: &StreetGraph) -> Result<Feature, Error> {
        let mut points: Vec<StreetPoint> = Vec::new();
        let mut from = self.start;

        for waypoint in &self.waypoints {
            let segment = graph.segment(waypoint.segment).ok_or_else(|| {
                Error::InvalidData(format!(
                    "loop references missing segment {}",
                    waypoint.segment.index()
                ))
            })?;
            for point in segment.points_from(from) {
                if points.last() != Some(&point) {
                    points.push(point);
                }
            }
            from = waypoint.intersection;
        }

        let coords: Vec<Coord<f64>> = points.into_iter().map(Coord::from).collect();
        let geometry = Geometry::new(GeoJsonValue::from(&LineString::new(coords)));
        let street_names: Vec<&str> = self
            .waypoints
            .iter()
            .filter_map(|w| graph.segment(w.segment))
            .map(|segment| segment.name.as_str())
            .collect();

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "total_distance": self.total_distance,
                "waypoint_count": self.waypoints.len(),
                "start": graph.intersection(self.start).map(|i| i.key.to_string()),
                "streets": street_names,
            }
        });

        Feature::from_json_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
    }

    pub fn to_geojson_string(&self, graph: &StreetGraph) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson(graph)?)
            .map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}
