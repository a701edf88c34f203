use geo::{Coord, LineString};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::components::StreetSegment;
use super::network::StreetGraph;
use crate::Error;

impl StreetGraph {
    /// Converts every segment to a `GeoJSON` `LineString` feature carrying its
    /// exploration state, for fog-of-war renderers.
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let features = self
            .graph
            .edge_weights()
            .map(segment_feature)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

fn segment_feature(segment: &StreetSegment) -> Result<Feature, Error> {
    let coords: Vec<Coord<f64>> = segment.points.iter().map(|&point| point.into()).collect();
    let geometry = Geometry::new(GeoJsonValue::from(&LineString::new(coords)));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "way_id": segment.way_id,
            "name": segment.name,
            "street_type": segment.street_type.as_ref().map(|t| t.as_tag()),
            "length_meters": segment.length_meters,
            "is_explored": segment.exploration.is_explored,
            "confidence_score": segment.exploration.confidence_score,
        }
    });

    Feature::from_json_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}
