use crate::StreetPoint;

/// Overpass QL for all ways whose `highway` tag is one of `road_classes`
/// within `radius_meters` of `center`, with inline geometry.
pub fn build_street_query(
    center: StreetPoint,
    radius_meters: f64,
    road_classes: &[String],
    timeout_secs: u32,
) -> String {
    let classes = road_classes.join("|");
    format!(
        "[out:json][timeout:{timeout_secs}];way[\"highway\"~\"^({classes})$\"](around:{radius:.0},{lat:.6},{lon:.6});out geom;",
        radius = radius_meters.max(0.0),
        lat = center.latitude,
        lon = center.longitude,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_shape() {
        let classes = vec!["residential".to_string(), "footway".to_string()];
        let query = build_street_query(StreetPoint::new(52.52, 13.405), 500.0, &classes, 25);

        assert_eq!(
            query,
            "[out:json][timeout:25];way[\"highway\"~\"^(residential|footway)$\"](around:500,52.520000,13.405000);out geom;"
        );
    }

    #[test]
    fn test_negative_radius_clamped() {
        let classes = vec!["path".to_string()];
        let query = build_street_query(StreetPoint::new(0.0, 0.0), -10.0, &classes, 25);
        assert!(query.contains("(around:0,"));
    }
}
