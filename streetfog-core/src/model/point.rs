//! Coordinates, GPS samples and bounding boxes

use std::iter;

use chrono::{DateTime, Utc};
use geo::{Coord, Point};
use itertools::Either;
use rstar::AABB;
use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude used by the flat-earth box approximation
const KM_PER_DEGREE: f64 = 111.0;

/// A bare WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreetPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl StreetPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `[lon, lat]` pair used as the R-tree coordinate
    pub(crate) fn as_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl From<StreetPoint> for Point<f64> {
    fn from(point: StreetPoint) -> Self {
        Point::new(point.longitude, point.latitude)
    }
}

impl From<Point<f64>> for StreetPoint {
    fn from(point: Point<f64>) -> Self {
        StreetPoint::new(point.y(), point.x())
    }
}

impl From<StreetPoint> for Coord<f64> {
    fn from(point: StreetPoint) -> Self {
        Coord {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

/// GPS fix with an optional 1σ accuracy radius in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    pub point: StreetPoint,
    pub timestamp: DateTime<Utc>,
    pub accuracy: Option<f64>,
}

impl GpsSample {
    pub fn new(point: StreetPoint, timestamp: DateTime<Utc>) -> Self {
        Self {
            point,
            timestamp,
            accuracy: None,
        }
    }

    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

/// Normalizes a longitude (or longitude difference) into `[-180, 180)`
pub(crate) fn wrap_longitude(degrees: f64) -> f64 {
    if (-180.0..180.0).contains(&degrees) {
        degrees
    } else {
        (degrees + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Axis-aligned box in degrees.
///
/// A box crossing the antimeridian has `west > east`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Box covering `radius_meters` around `center`.
    ///
    /// Uses `radius_km / 111` degrees of latitude and divides the longitude
    /// span by `cos(latitude)`. Both overestimate the true span slightly, so
    /// the box is a safe prefilter for exact distance checks.
    pub fn around(center: StreetPoint, radius_meters: f64) -> Self {
        let radius_km = radius_meters.max(0.0) / 1000.0;
        let lat_delta = radius_km / KM_PER_DEGREE;
        // Clamp near the poles where the longitude span diverges
        let cos_lat = center.latitude.to_radians().cos().abs().max(1e-6);
        let lon_delta = radius_km / (KM_PER_DEGREE * cos_lat);

        let (west, east) = if lon_delta >= 180.0 {
            (-180.0, 180.0)
        } else {
            (
                wrap_longitude(center.longitude - lon_delta),
                wrap_longitude(center.longitude + lon_delta),
            )
        };

        Self {
            south: center.latitude - lat_delta,
            west,
            north: center.latitude + lat_delta,
            east,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, point: StreetPoint) -> bool {
        let lon = point.longitude;
        let within_lon = if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            (self.west..=self.east).contains(&lon)
        };
        (self.south..=self.north).contains(&point.latitude) && within_lon
    }

    /// R-tree envelopes covering the box: two halves when it crosses the
    /// antimeridian, one otherwise.
    pub(crate) fn envelopes(self) -> impl Iterator<Item = AABB<[f64; 2]>> {
        if self.crosses_antimeridian() {
            Either::Right(
                [
                    AABB::from_corners([self.west, self.south], [180.0, self.north]),
                    AABB::from_corners([-180.0, self.south], [self.east, self.north]),
                ]
                .into_iter(),
            )
        } else {
            Either::Left(iter::once(AABB::from_corners(
                [self.west, self.south],
                [self.east, self.north],
            )))
        }
    }
}
