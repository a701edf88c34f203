use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pymethods};

use streetfog_core::prelude::*;

/// A street near a query point
#[gen_stub_pyclass]
#[pyclass(name = "NearbySegment")]
#[derive(Clone)]
pub struct PyNearbySegment {
    pub(crate) way_id: WayId,
    pub(crate) name: String,
    pub(crate) street_type: Option<String>,
    pub(crate) distance: f64,
    pub(crate) bearing: f64,
    pub(crate) direction: String,
    pub(crate) closest_point: (f64, f64),
    pub(crate) is_explored: bool,
    pub(crate) confidence_score: f64,
}

impl From<&NearbySegment<'_>> for PyNearbySegment {
    fn from(nearby: &NearbySegment<'_>) -> Self {
        Self {
            way_id: nearby.segment.way_id,
            name: nearby.segment.name.clone(),
            street_type: nearby
                .segment
                .street_type
                .as_ref()
                .map(|t| t.as_tag().to_string()),
            distance: nearby.distance,
            bearing: nearby.bearing,
            direction: nearby.direction.to_string(),
            closest_point: (nearby.closest_point.latitude, nearby.closest_point.longitude),
            is_explored: nearby.segment.exploration.is_explored,
            confidence_score: nearby.segment.exploration.confidence_score,
        }
    }
}

#[gen_stub_pymethods]
#[pymethods]
impl PyNearbySegment {
    #[getter]
    fn way_id(&self) -> WayId {
        self.way_id
    }

    #[getter]
    fn name(&self) -> String {
        self.name.clone()
    }

    #[getter]
    fn street_type(&self) -> Option<String> {
        self.street_type.clone()
    }

    /// Distance in meters from the query point to the street
    #[getter]
    fn distance(&self) -> f64 {
        self.distance
    }

    #[getter]
    fn bearing(&self) -> f64 {
        self.bearing
    }

    /// Compass direction towards the street, e.g. "NE"
    #[getter]
    fn direction(&self) -> String {
        self.direction.clone()
    }

    /// Closest location on the street as (lat, lon)
    #[getter]
    fn closest_point(&self) -> (f64, f64) {
        self.closest_point
    }

    #[getter]
    fn is_explored(&self) -> bool {
        self.is_explored
    }

    #[getter]
    fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    fn __repr__(&self) -> String {
        format!(
            "NearbySegment(way_id={}, name='{}', distance={:.1}, direction={})",
            self.way_id, self.name, self.distance, self.direction
        )
    }
}

/// An intersection near a query point
#[gen_stub_pyclass]
#[pyclass(name = "NearbyIntersection")]
#[derive(Clone)]
pub struct PyNearbyIntersection {
    pub(crate) key: String,
    pub(crate) location: (f64, f64),
    pub(crate) street_names: Vec<String>,
    pub(crate) distance: f64,
    pub(crate) direction: String,
    pub(crate) is_explored: bool,
}

impl From<&NearbyIntersection<'_>> for PyNearbyIntersection {
    fn from(nearby: &NearbyIntersection<'_>) -> Self {
        let intersection = nearby.intersection;
        Self {
            key: intersection.key.to_string(),
            location: (intersection.location.latitude, intersection.location.longitude),
            street_names: intersection.street_names.iter().cloned().collect(),
            distance: nearby.distance,
            direction: nearby.direction.to_string(),
            is_explored: intersection.exploration.is_explored,
        }
    }
}

#[gen_stub_pymethods]
#[pymethods]
impl PyNearbyIntersection {
    /// Rounded coordinate key, e.g. "52.52000,13.40500"
    #[getter]
    fn key(&self) -> String {
        self.key.clone()
    }

    #[getter]
    fn location(&self) -> (f64, f64) {
        self.location
    }

    #[getter]
    fn street_names(&self) -> Vec<String> {
        self.street_names.clone()
    }

    #[getter]
    fn distance(&self) -> f64 {
        self.distance
    }

    #[getter]
    fn direction(&self) -> String {
        self.direction.clone()
    }

    #[getter]
    fn is_explored(&self) -> bool {
        self.is_explored
    }

    fn __repr__(&self) -> String {
        format!(
            "NearbyIntersection(key={}, streets={:?}, distance={:.1})",
            self.key, self.street_names, self.distance
        )
    }
}

/// Outcome of a loop search. Check `success` before reading the route.
#[gen_stub_pyclass]
#[pyclass(name = "LoopResult")]
pub struct PyLoopResult {
    pub(crate) error: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) total_distance: f64,
    pub(crate) waypoints: Vec<(f64, f64)>,
    pub(crate) way_ids: Vec<WayId>,
    pub(crate) legs: Vec<(String, WayId, f64)>,
    pub(crate) geojson: Option<String>,
}

impl PyLoopResult {
    pub(crate) fn from_result(
        graph: &StreetGraph,
        result: Result<LoopRoute, LoopError>,
    ) -> PyResult<Self> {
        match result {
            Ok(route) => {
                let waypoints = route
                    .intersections()
                    .filter_map(|node| graph.intersection(node))
                    .map(|i| (i.location.latitude, i.location.longitude))
                    .collect();
                let legs: Vec<(String, WayId, f64)> = route
                    .legs(graph)
                    .map(|leg| {
                        (
                            leg.intersection.key.to_string(),
                            leg.segment.way_id,
                            leg.distance_from_start,
                        )
                    })
                    .collect();
                let way_ids = legs.iter().map(|&(_, way_id, _)| way_id).collect();
                let geojson = route.to_geojson_string(graph).map_err(|e| {
                    PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                        "Failed to export loop: {e}"
                    ))
                })?;

                Ok(Self {
                    error: None,
                    message: None,
                    total_distance: route.total_distance,
                    waypoints,
                    way_ids,
                    legs,
                    geojson: Some(geojson),
                })
            }
            Err(error) => Ok(Self {
                error: Some(error.tag().to_string()),
                message: Some(error.to_string()),
                total_distance: 0.0,
                waypoints: Vec::new(),
                way_ids: Vec::new(),
                legs: Vec::new(),
                geojson: None,
            }),
        }
    }
}

#[gen_stub_pymethods]
#[pymethods]
impl PyLoopResult {
    #[getter]
    fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Failure tag: "dead_end", "over_budget" or "search_limit"
    #[getter]
    fn error(&self) -> Option<String> {
        self.error.clone()
    }

    #[getter]
    fn message(&self) -> Option<String> {
        self.message.clone()
    }

    #[getter]
    fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Intersections as (lat, lon), first and last are the start
    #[getter]
    fn waypoints(&self) -> Vec<(f64, f64)> {
        self.waypoints.clone()
    }

    #[getter]
    fn way_ids(&self) -> Vec<WayId> {
        self.way_ids.clone()
    }

    /// One entry per waypoint: (intersection key, way id walked to reach
    /// it, meters from the start on arrival)
    #[getter]
    fn legs(&self) -> Vec<(String, WayId, f64)> {
        self.legs.clone()
    }

    /// GeoJSON Feature string of the route, None on failure
    fn to_geojson(&self) -> Option<String> {
        self.geojson.clone()
    }

    fn __repr__(&self) -> String {
        match &self.error {
            None => format!(
                "LoopResult(success=True, distance={:.0}, waypoints={})",
                self.total_distance,
                self.waypoints.len()
            ),
            Some(tag) => format!("LoopResult(success=False, error='{tag}')"),
        }
    }
}

/// Explored vs. total counts
#[gen_stub_pyclass]
#[pyclass(name = "Coverage")]
pub struct PyCoverage {
    pub(crate) inner: CoverageStats,
}

#[gen_stub_pymethods]
#[pymethods]
impl PyCoverage {
    #[getter]
    fn explored_segments(&self) -> usize {
        self.inner.explored_segments
    }

    #[getter]
    fn total_segments(&self) -> usize {
        self.inner.total_segments
    }

    #[getter]
    fn explored_intersections(&self) -> usize {
        self.inner.explored_intersections
    }

    #[getter]
    fn total_intersections(&self) -> usize {
        self.inner.total_intersections
    }

    /// Share of street length explored, in [0, 1]
    #[getter]
    fn explored_ratio(&self) -> f64 {
        self.inner.explored_ratio()
    }

    fn __repr__(&self) -> String {
        format!(
            "Coverage(segments={}/{}, intersections={}/{}, ratio={:.3})",
            self.inner.explored_segments,
            self.inner.total_segments,
            self.inner.explored_intersections,
            self.inner.total_intersections,
            self.inner.explored_ratio()
        )
    }
}

/// Outcome of recording a GPS path
#[gen_stub_pyclass]
#[pyclass(name = "TrackingSummary")]
pub struct PyTrackingSummary {
    pub(crate) samples_processed: usize,
    pub(crate) newly_explored_way_ids: Vec<WayId>,
    pub(crate) newly_explored_intersections: Vec<String>,
}

impl PyTrackingSummary {
    pub(crate) fn new(graph: &StreetGraph, summary: &TrackingSummary) -> Self {
        Self {
            samples_processed: summary.samples_processed,
            newly_explored_way_ids: summary
                .newly_explored_segments
                .iter()
                .filter_map(|&edge| graph.segment(edge))
                .map(|segment| segment.way_id)
                .collect(),
            newly_explored_intersections: summary
                .newly_explored_intersections
                .iter()
                .filter_map(|&node| graph.intersection(node))
                .map(|intersection| intersection.key.to_string())
                .collect(),
        }
    }
}

#[gen_stub_pymethods]
#[pymethods]
impl PyTrackingSummary {
    #[getter]
    fn samples_processed(&self) -> usize {
        self.samples_processed
    }

    #[getter]
    fn newly_explored_way_ids(&self) -> Vec<WayId> {
        self.newly_explored_way_ids.clone()
    }

    #[getter]
    fn newly_explored_intersections(&self) -> Vec<String> {
        self.newly_explored_intersections.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "TrackingSummary(samples={}, new_segments={}, new_intersections={})",
            self.samples_processed,
            self.newly_explored_way_ids.len(),
            self.newly_explored_intersections.len()
        )
    }
}
