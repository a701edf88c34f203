use log::debug;

use super::raw_types::{OverpassElement, OverpassResponse};
use crate::loading::FetchError;
use crate::loading::Way;
use crate::{StreetPoint, StreetType};

/// Name given to ways without a `name` tag
pub const UNNAMED_STREET: &str = "Unnamed Street";

/// Parses an Overpass JSON body into ways.
///
/// Non-way elements and ways with fewer than two usable geometry points are
/// skipped. A body that is not valid Overpass JSON is a fatal
/// [`FetchError::Malformed`].
pub fn parse_overpass_response(body: &[u8]) -> Result<Vec<Way>, FetchError> {
    let response: OverpassResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError::Malformed(format!("invalid Overpass JSON: {e}")))?;

    let total = response.elements.len();
    let ways: Vec<Way> = response
        .elements
        .into_iter()
        .filter_map(element_to_way)
        .collect();

    debug!("Parsed {} ways from {} Overpass elements", ways.len(), total);
    Ok(ways)
}

fn element_to_way(element: OverpassElement) -> Option<Way> {
    if element.kind != "way" {
        return None;
    }

    let points: Vec<StreetPoint> = element
        .geometry
        .into_iter()
        .flatten()
        .filter(|coord| coord.lat.is_finite() && coord.lon.is_finite())
        .map(|coord| StreetPoint::new(coord.lat, coord.lon))
        .collect();
    if points.len() < 2 {
        return None;
    }

    Some(Way {
        id: element.id,
        name: element
            .tags
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNNAMED_STREET.to_string()),
        street_type: element.tags.highway.as_deref().map(StreetType::from_tag),
        points,
    })
}
