//! This module is responsible for fetching road geometry from an
//! Overpass-style geodata service and building the street graph from it.

mod builder;
mod config;
pub mod fetch;
pub mod overpass;

pub use builder::{Way, build_street_graph};
pub use config::{FetchConfig, GraphBuildConfig};
pub use fetch::{
    CacheKey, ConnectivityStatus, FetchError, GraphCache, GraphFetch, OverpassTransport,
    ReqwestTransport, StreetDataClient,
};
