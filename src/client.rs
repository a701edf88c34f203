use pyo3::prelude::*;
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pymethods};
use tokio::runtime::Runtime;

use streetfog_core::prelude::*;

use crate::graph::PyStreetGraph;

/// StreetDataClient
///
/// Fetches street networks from an Overpass API endpoint with retries, a
/// five minute cache and an offline fallback to previously fetched areas.
/// Calls block the caller; the GIL is released while waiting.
#[gen_stub_pyclass]
#[pyclass(name = "StreetDataClient")]
pub struct PyStreetDataClient {
    runtime: Runtime,
    inner: StreetDataClient<ReqwestTransport>,
}

#[gen_stub_pymethods]
#[pymethods]
impl PyStreetDataClient {
    /// Parameters
    /// ----------
    /// endpoint : str, optional
    ///     Overpass interpreter URL
    /// max_attempts : int, default=3
    ///     Attempts per fetch, including the first
    /// cache_ttl_secs : int, default=300
    /// node_precision : int, default=5
    ///     Decimal places used to merge street endpoints into intersections
    #[new]
    #[pyo3(signature = (endpoint = None, max_attempts = 3, cache_ttl_secs = 300, node_precision = 5))]
    pub fn new(
        endpoint: Option<String>,
        max_attempts: u32,
        cache_ttl_secs: u64,
        node_precision: u32,
    ) -> PyResult<Self> {
        let mut config = FetchConfig {
            max_attempts,
            cache_ttl_secs,
            ..Default::default()
        };
        if let Some(endpoint) = endpoint {
            config.endpoint = endpoint;
        }
        let build_config = GraphBuildConfig { node_precision };

        let inner = StreetDataClient::with_http(config, build_config).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Failed to create StreetDataClient: {e}"
            ))
        })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                    "Failed to start async runtime: {e}"
                ))
            })?;

        Ok(Self { runtime, inner })
    }

    /// Street network within `radius` meters of (lat, lon)
    ///
    /// Raises
    /// ------
    /// RuntimeError
    ///     If the fetch fails and no cached copy of the area exists
    pub fn fetch_graph(
        &mut self,
        py: Python<'_>,
        lat: f64,
        lon: f64,
        radius: f64,
    ) -> PyResult<PyStreetGraph> {
        let Self { runtime, inner } = self;
        let fetch = py
            .detach(|| runtime.block_on(inner.fetch_graph(StreetPoint::new(lat, lon), radius)))
            .map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                    "Failed to fetch street graph: {e}"
                ))
            })?;

        Ok(PyStreetGraph::new(
            fetch.graph,
            fetch.from_cache,
            fetch.is_offline_fallback,
        ))
    }

    /// "online" or "offline", as of the last network attempt
    pub fn status(&self) -> &'static str {
        match self.inner.status() {
            ConnectivityStatus::Online => "online",
            ConnectivityStatus::Offline => "offline",
        }
    }

    pub fn cached_areas(&self) -> usize {
        self.inner.cache().len()
    }

    pub fn invalidate_cache(&mut self) {
        self.inner.invalidate_cache();
    }

    fn __repr__(&self) -> String {
        format!(
            "StreetDataClient(endpoint='{}', status={}, cached_areas={})",
            self.inner.config().endpoint,
            self.status(),
            self.cached_areas()
        )
    }
}
