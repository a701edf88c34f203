use serde::{Deserialize, Serialize};

/// Top-level Overpass JSON response (`[out:json]`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// A single element; only ways with `out geom` geometry are used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    #[serde(default)]
    pub tags: OverpassTags,
    /// Overpass emits `null` for members cut off by the query area
    #[serde(default)]
    pub geometry: Vec<Option<OverpassCoord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverpassTags {
    pub highway: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverpassCoord {
    pub lat: f64,
    pub lon: f64,
}
