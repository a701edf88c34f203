use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_NODE_PRECISION, Error};

/// Road classes a pedestrian can walk, used to filter the Overpass query
const WALKABLE_ROAD_CLASSES: &[&str] = &[
    "primary",
    "secondary",
    "tertiary",
    "unclassified",
    "residential",
    "living_street",
    "service",
    "pedestrian",
    "footway",
    "path",
    "cycleway",
    "steps",
    "track",
];

/// Configuration for [`StreetDataClient`](super::StreetDataClient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Overpass interpreter endpoint
    pub endpoint: String,
    pub user_agent: String,
    /// Timeout hint embedded in the query, seconds
    pub server_timeout_secs: u32,
    /// Client-side HTTP timeout, milliseconds
    pub request_timeout_ms: u64,
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles after each failure
    pub base_delay_ms: u64,
    pub cache_ttl_secs: u64,
    pub max_cache_entries: usize,
    /// Values of the `highway` tag to request
    pub road_classes: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://overpass-api.de/api/interpreter".to_string(),
            user_agent: concat!("streetfog/", env!("CARGO_PKG_VERSION")).to_string(),
            server_timeout_secs: 25,
            request_timeout_ms: 30_000,
            max_attempts: 3,
            base_delay_ms: 1_000,
            cache_ttl_secs: 300,
            max_cache_entries: 10,
            road_classes: WALKABLE_ROAD_CLASSES
                .iter()
                .map(|class| (*class).to_string())
                .collect(),
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Delay after failed attempt number `attempt` (1-based):
    /// `base_delay * 2^(attempt - 1)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.base_delay_ms).saturating_mul(factor)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("endpoint must not be empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_cache_entries == 0 {
            return Err(Error::InvalidConfig(
                "max_cache_entries must be at least 1".to_string(),
            ));
        }
        if self.road_classes.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one road class is required".to_string(),
            ));
        }
        // Classes are spliced into a regex inside the query
        if let Some(bad) = self.road_classes.iter().find(|class| {
            class.is_empty()
                || !class
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c == '_')
        }) {
            return Err(Error::InvalidConfig(format!("invalid road class '{bad}'")));
        }
        Ok(())
    }
}

/// Configuration for [`build_street_graph`](super::build_street_graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphBuildConfig {
    /// Decimal places endpoints are rounded to before merging
    pub node_precision: u32,
}

impl Default for GraphBuildConfig {
    fn default() -> Self {
        Self {
            node_precision: DEFAULT_NODE_PRECISION,
        }
    }
}

impl GraphBuildConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(1..=9).contains(&self.node_precision) {
            return Err(Error::InvalidConfig(format!(
                "node_precision must be between 1 and 9, got {}",
                self.node_precision
            )));
        }
        Ok(())
    }
}
