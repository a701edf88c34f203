use pyo3::prelude::*;
use pyo3_stub_gen::define_stub_info_gatherer;

use client::PyStreetDataClient;
use graph::PyStreetGraph;
use results::{PyCoverage, PyLoopResult, PyNearbyIntersection, PyNearbySegment, PyTrackingSummary};

pub mod client;
pub mod graph;
pub mod results;

/// A Python module implemented in Rust.
#[pymodule]
fn streetfog(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyStreetDataClient>()?;
    m.add_class::<PyStreetGraph>()?;

    m.add_class::<PyNearbySegment>()?;
    m.add_class::<PyNearbyIntersection>()?;
    m.add_class::<PyLoopResult>()?;
    m.add_class::<PyCoverage>()?;
    m.add_class::<PyTrackingSummary>()?;
    Ok(())
}

define_stub_info_gatherer!(stub_info);
