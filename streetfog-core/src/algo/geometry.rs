//! Geodesy on a spherical earth: distance, bearing and polyline projection

use std::fmt;

use geo::{Bearing, Distance, Haversine, Point};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::StreetPoint;
use crate::model::point::wrap_longitude;

/// Great-circle distance in meters (haversine, mean earth radius ~6371 km)
pub fn distance(a: StreetPoint, b: StreetPoint) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Initial compass bearing in `[0, 360)`, North = 0, East = 90
pub fn bearing(from: StreetPoint, to: StreetPoint) -> f64 {
    let degrees = Haversine
        .bearing(Point::from(from), Point::from(to))
        .rem_euclid(360.0);
    // rem_euclid can round a tiny negative up to exactly 360
    if degrees >= 360.0 { 0.0 } else { degrees }
}

/// Sum of great-circle distances between consecutive points
pub fn polyline_length(points: &[StreetPoint]) -> f64 {
    points
        .iter()
        .tuple_windows()
        .map(|(&a, &b)| distance(a, b))
        .sum()
}

/// Closest location on a polyline to a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineProjection {
    /// `None` only for an empty polyline
    pub point: Option<StreetPoint>,
    /// Meters, `f64::INFINITY` for an empty polyline
    pub distance: f64,
}

/// Projects `query` onto every consecutive pair of `points` and keeps the
/// nearest result.
pub fn closest_point_on_polyline(query: StreetPoint, points: &[StreetPoint]) -> PolylineProjection {
    match points {
        [] => PolylineProjection {
            point: None,
            distance: f64::INFINITY,
        },
        [single] => PolylineProjection {
            point: Some(*single),
            distance: distance(query, *single),
        },
        _ => points
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| {
                let projected = project_onto_segment(query, a, b);
                PolylineProjection {
                    point: Some(projected),
                    distance: distance(query, projected),
                }
            })
            .min_by(|x, y| x.distance.total_cmp(&y.distance))
            .unwrap_or(PolylineProjection {
                point: None,
                distance: f64::INFINITY,
            }),
    }
}

/// Clamped projection of `query` onto the segment `a`-`b` in a local
/// equirectangular frame centered on the query. Longitude differences are
/// taken the short way round, so segments across the antimeridian project
/// correctly.
fn project_onto_segment(query: StreetPoint, a: StreetPoint, b: StreetPoint) -> StreetPoint {
    let lon_scale = query.latitude.to_radians().cos();
    let lon_span = wrap_longitude(b.longitude - a.longitude);

    let ax = wrap_longitude(a.longitude - query.longitude) * lon_scale;
    let ay = a.latitude - query.latitude;
    let dx = lon_span * lon_scale;
    let dy = b.latitude - a.latitude;

    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return a;
    }

    let t = (-(ax * dx + ay * dy) / length_sq).clamp(0.0, 1.0);
    StreetPoint::new(
        a.latitude + t * (b.latitude - a.latitude),
        wrap_longitude(a.longitude + t * lon_span),
    )
}

/// Eight-point compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardinalDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CardinalDirection {
    const OCTANTS: [CardinalDirection; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Nearest octant; a bearing exactly between two octants maps to the
    /// clockwise one.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_bearing(bearing: f64) -> Self {
        let normalized = bearing.rem_euclid(360.0);
        let octant = ((normalized + 22.5) / 45.0).floor() as usize % 8;
        Self::OCTANTS[octant]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
