//! Resilient street data client: retry with backoff, TTL cache and
//! offline fallback.

mod cache;
mod error;
mod transport;

pub use cache::{CacheKey, GraphCache};
pub use error::FetchError;
pub use transport::{OverpassTransport, ReqwestTransport};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::config::{FetchConfig, GraphBuildConfig};
use super::overpass::{build_street_query, parse_overpass_response};
use super::{Way, build_street_graph};
use crate::{Error, StreetGraph, StreetPoint};

/// Outcome of the most recent network attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityStatus {
    #[default]
    Online,
    Offline,
}

/// Graph returned by [`StreetDataClient::fetch_graph`] with its provenance
#[derive(Debug, Clone)]
pub struct GraphFetch {
    pub graph: StreetGraph,
    /// Served from a fresh cache entry without network I/O
    pub from_cache: bool,
    /// Served from a possibly expired cache entry after the fetch failed
    pub is_offline_fallback: bool,
}

/// Fetches street graphs through an [`OverpassTransport`].
///
/// Owns its cache and connectivity status; nothing is shared between
/// instances.
pub struct StreetDataClient<T: OverpassTransport> {
    transport: T,
    config: FetchConfig,
    build_config: GraphBuildConfig,
    cache: GraphCache,
    status: ConnectivityStatus,
}

impl StreetDataClient<ReqwestTransport> {
    /// Client talking to `config.endpoint` over HTTP
    pub fn with_http(config: FetchConfig, build_config: GraphBuildConfig) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(&config)?;
        Self::new(transport, config, build_config)
    }
}

impl<T: OverpassTransport> StreetDataClient<T> {
    pub fn new(
        transport: T,
        config: FetchConfig,
        build_config: GraphBuildConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        build_config.validate()?;

        let cache = GraphCache::new(config.cache_ttl(), config.max_cache_entries);
        Ok(Self {
            transport,
            config,
            build_config,
            cache,
            status: ConnectivityStatus::Online,
        })
    }

    /// Street graph for the area within `radius_meters` of `center`.
    ///
    /// A fresh cache entry is returned without network I/O. Otherwise the
    /// area is fetched, retrying transient failures with exponential backoff.
    /// If the fetch fails, any cached entry for the same area is returned as
    /// an offline fallback; with no entry the failure is propagated.
    pub async fn fetch_graph(
        &mut self,
        center: StreetPoint,
        radius_meters: f64,
    ) -> Result<GraphFetch, Error> {
        let key = CacheKey::new(center, radius_meters);

        if let Some(graph) = self.cache.get_fresh(&key) {
            debug!("Cache hit for {key:?}");
            return Ok(GraphFetch {
                graph: graph.clone(),
                from_cache: true,
                is_offline_fallback: false,
            });
        }

        match self.fetch_with_retry(center, radius_meters).await {
            Ok(ways) => {
                self.status = ConnectivityStatus::Online;
                let graph = build_street_graph(&ways, &self.build_config)?;
                self.cache.insert(key, graph.clone());
                Ok(GraphFetch {
                    graph,
                    from_cache: false,
                    is_offline_fallback: false,
                })
            }
            Err(error) => {
                if error.is_transient() {
                    self.status = ConnectivityStatus::Offline;
                }
                match self.cache.get_any(&key) {
                    Some(graph) => {
                        warn!("Fetch failed ({error}), serving cached graph for {key:?}");
                        Ok(GraphFetch {
                            graph: graph.clone(),
                            from_cache: true,
                            is_offline_fallback: true,
                        })
                    }
                    None => Err(error.into()),
                }
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        center: StreetPoint,
        radius_meters: f64,
    ) -> Result<Vec<Way>, FetchError> {
        let query = build_street_query(
            center,
            radius_meters,
            &self.config.road_classes,
            self.config.server_timeout_secs,
        );

        let mut attempt = 1;
        loop {
            let result = match self.transport.post_query(&query).await {
                Ok(body) => parse_overpass_response(&body),
                Err(e) => Err(e),
            };

            match result {
                Ok(ways) => {
                    info!("Fetched {} ways on attempt {}", ways.len(), attempt);
                    return Ok(ways);
                }
                Err(error) if error.is_transient() && attempt < self.config.max_attempts => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt, self.config.max_attempts, error, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!("Fetch aborted after {} attempt(s): {}", attempt, error);
                    return Err(error);
                }
            }
        }
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.status
    }

    /// Drops every cached graph, including offline fallbacks
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}
