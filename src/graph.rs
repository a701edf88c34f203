use chrono::{DateTime, Utc};
use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pymethods};

use streetfog_core::prelude::*;

use crate::results::{
    PyCoverage, PyLoopResult, PyNearbyIntersection, PyNearbySegment, PyTrackingSummary,
};

/// StreetGraph
///
/// Street segments and intersections of one area with their exploration
/// state. Obtained from `StreetDataClient.fetch_graph` or restored with
/// `StreetGraph.from_json`.
///
/// Example:
///
/// .. code-block:: python
///
///     client = StreetDataClient()
///     graph = client.fetch_graph(52.52, 13.405, 800)
///     graph.update_from_path([(52.5201, 13.4049, 1700000000000, 5.0)])
///     print(graph.coverage())
#[gen_stub_pyclass]
#[pyclass(name = "StreetGraph")]
pub struct PyStreetGraph {
    pub(crate) inner: StreetGraph,
    pub(crate) tracker: ExplorationTracker,
    pub(crate) from_cache: bool,
    pub(crate) is_offline_fallback: bool,
}

impl PyStreetGraph {
    pub(crate) fn new(inner: StreetGraph, from_cache: bool, is_offline_fallback: bool) -> Self {
        Self {
            inner,
            tracker: ExplorationTracker::default(),
            from_cache,
            is_offline_fallback,
        }
    }
}

fn parse_filter(filter: &str) -> PyResult<ExploredFilter> {
    match filter {
        "all" => Ok(ExploredFilter::All),
        "explored" => Ok(ExploredFilter::Explored),
        "unexplored" => Ok(ExploredFilter::Unexplored),
        other => Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
            "Unknown filter '{other}', expected 'all', 'explored' or 'unexplored'"
        ))),
    }
}

fn timestamp(millis: i64) -> PyResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
            "Timestamp {millis} ms is out of range"
        ))
    })
}

fn timestamp_or_now(millis: Option<i64>) -> PyResult<DateTime<Utc>> {
    millis.map_or_else(|| Ok(Utc::now()), timestamp)
}

#[gen_stub_pymethods]
#[pymethods]
impl PyStreetGraph {
    pub fn segment_count(&self) -> usize {
        self.inner.segment_count()
    }

    pub fn intersection_count(&self) -> usize {
        self.inner.intersection_count()
    }

    /// True if the graph was served from a fresh cache entry
    #[getter]
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// True if the fetch failed and a stale cached graph was served instead
    #[getter]
    pub fn is_offline_fallback(&self) -> bool {
        self.is_offline_fallback
    }

    /// Nearest streets to a point
    ///
    /// Parameters
    /// ----------
    /// lat : float
    /// lon : float
    /// k : int, default=5
    ///     Maximum number of results
    /// filter : str, default="all"
    ///     "all", "explored" or "unexplored"
    ///
    /// Returns
    /// -------
    /// list[NearbySegment]
    ///     Sorted by ascending distance
    #[pyo3(signature = (lat, lon, k = 5, filter = "all"))]
    pub fn nearest_segments(
        &self,
        lat: f64,
        lon: f64,
        k: usize,
        filter: &str,
    ) -> PyResult<Vec<PyNearbySegment>> {
        let filter = parse_filter(filter)?;
        Ok(
            nearest_segments(&self.inner, StreetPoint::new(lat, lon), k, filter)
                .iter()
                .map(PyNearbySegment::from)
                .collect(),
        )
    }

    /// Nearest intersections to a point, sorted by ascending distance
    #[pyo3(signature = (lat, lon, k = 5, filter = "all"))]
    pub fn nearest_intersections(
        &self,
        lat: f64,
        lon: f64,
        k: usize,
        filter: &str,
    ) -> PyResult<Vec<PyNearbyIntersection>> {
        let filter = parse_filter(filter)?;
        Ok(
            nearest_intersections(&self.inner, StreetPoint::new(lat, lon), k, filter)
                .iter()
                .map(PyNearbyIntersection::from)
                .collect(),
        )
    }

    /// Find a walking loop that returns to the intersection nearest the
    /// start point
    ///
    /// Parameters
    /// ----------
    /// lat : float
    /// lon : float
    /// max_distance : float
    ///     Length budget in meters
    /// max_expansions : int, default=10000
    ///     Search effort cap
    ///
    /// Returns
    /// -------
    /// LoopResult
    ///     `success` is False with an `error` tag when no loop fits
    #[pyo3(signature = (lat, lon, max_distance, max_expansions = 10_000))]
    pub fn find_loop(
        &self,
        py: Python<'_>,
        lat: f64,
        lon: f64,
        max_distance: f64,
        max_expansions: usize,
    ) -> PyResult<PyLoopResult> {
        let config = LoopConfig {
            max_expansions,
            ..Default::default()
        };
        let graph = &self.inner;
        let result = py.detach(|| {
            find_loop(graph, StreetPoint::new(lat, lon), max_distance, &config)
        });
        PyLoopResult::from_result(graph, result)
    }

    /// Feed GPS samples into the exploration state
    ///
    /// Parameters
    /// ----------
    /// samples : list[tuple[float, float, int, float | None]]
    ///     (lat, lon, unix timestamp in milliseconds, accuracy in meters)
    ///
    /// Returns
    /// -------
    /// TrackingSummary
    pub fn update_from_path(
        &mut self,
        samples: Vec<(f64, f64, i64, Option<f64>)>,
    ) -> PyResult<PyTrackingSummary> {
        let samples = samples
            .into_iter()
            .map(|(lat, lon, millis, accuracy)| {
                Ok(GpsSample {
                    point: StreetPoint::new(lat, lon),
                    timestamp: timestamp(millis)?,
                    accuracy,
                })
            })
            .collect::<PyResult<Vec<_>>>()?;

        let summary = self.tracker.update_from_path(&mut self.inner, &samples);
        Ok(PyTrackingSummary::new(&self.inner, &summary))
    }

    /// Mark a street explored by its way id. Returns False if it already was.
    #[pyo3(signature = (way_id, timestamp_ms = None))]
    pub fn mark_segment_explored(&mut self, way_id: WayId, timestamp_ms: Option<i64>) -> PyResult<bool> {
        let at = timestamp_or_now(timestamp_ms)?;
        let edge = self.inner.segment_by_way(way_id).ok_or_else(|| {
            PyErr::new::<pyo3::exceptions::PyKeyError, _>(format!("Unknown way {way_id}"))
        })?;
        Ok(self.tracker.mark_segment_explored(&mut self.inner, edge, at))
    }

    /// Mark the intersection nearest to (lat, lon) explored, if it lies
    /// within `max_distance` meters
    #[pyo3(signature = (lat, lon, timestamp_ms = None, max_distance = 15.0))]
    pub fn mark_intersection_explored(
        &mut self,
        lat: f64,
        lon: f64,
        timestamp_ms: Option<i64>,
        max_distance: f64,
    ) -> PyResult<bool> {
        let at = timestamp_or_now(timestamp_ms)?;
        let nearest = nearest_intersections(
            &self.inner,
            StreetPoint::new(lat, lon),
            1,
            ExploredFilter::All,
        )
        .first()
        .filter(|nearby| nearby.distance <= max_distance)
        .map(|nearby| nearby.index);

        match nearest {
            Some(node) => Ok(self
                .tracker
                .mark_intersection_explored(&mut self.inner, node, at)),
            None => Err(PyErr::new::<pyo3::exceptions::PyKeyError, _>(format!(
                "No intersection within {max_distance} m of ({lat}, {lon})"
            ))),
        }
    }

    pub fn reset_exploration(&mut self) {
        self.inner.reset_exploration();
    }

    pub fn coverage(&self) -> PyCoverage {
        PyCoverage {
            inner: self.inner.coverage(),
        }
    }

    /// GeoJSON FeatureCollection of all streets with exploration state
    pub fn to_geojson(&self) -> PyResult<String> {
        self.inner.to_geojson_string().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to export GeoJSON: {e}"
            ))
        })
    }

    /// Serialize the graph, exploration state included
    pub fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to serialize StreetGraph: {e}"
            ))
        })
    }

    /// Restore a graph produced by `to_json`
    #[staticmethod]
    pub fn from_json(json: &str) -> PyResult<Self> {
        let inner = StreetGraph::from_json(json).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Failed to restore StreetGraph: {e}"
            ))
        })?;
        Ok(Self::new(inner, false, false))
    }

    fn __repr__(&self) -> String {
        let coverage = self.inner.coverage();
        format!(
            "StreetGraph with {} segments and {} intersections ({} explored)",
            self.inner.segment_count(),
            self.inner.intersection_count(),
            coverage.explored_segments
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}
