//! Bounded TTL cache of built street graphs

use std::time::Duration;

use hashbrown::HashMap;
use log::debug;
use tokio::time::Instant;

use crate::{StreetGraph, StreetPoint};

/// Cache key: center rounded to 4 decimal places (~11 m) plus radius in
/// whole meters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_e4: i64,
    lon_e4: i64,
    radius_m: u64,
}

impl CacheKey {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(center: StreetPoint, radius_meters: f64) -> Self {
        Self {
            lat_e4: (center.latitude * 1e4).round() as i64,
            lon_e4: (center.longitude * 1e4).round() as i64,
            radius_m: radius_meters.max(0.0).round() as u64,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: StreetGraph,
    timestamp: Instant,
}

/// Graph cache with a freshness window and a size bound.
///
/// Expired entries are kept until evicted so they can serve as an offline
/// fallback; inserting beyond capacity drops the oldest entry.
#[derive(Debug)]
pub struct GraphCache {
    entries: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl GraphCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(max_entries),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Entry younger than the TTL
    pub fn get_fresh(&self, key: &CacheKey) -> Option<&StreetGraph> {
        self.entries
            .get(key)
            .filter(|entry| entry.timestamp.elapsed() < self.ttl)
            .map(|entry| &entry.data)
    }

    /// Entry of any age
    pub fn get_any(&self, key: &CacheKey) -> Option<&StreetGraph> {
        self.entries.get(key).map(|entry| &entry.data)
    }

    pub fn insert(&mut self, key: CacheKey, data: StreetGraph) {
        self.entries.insert(
            key,
            CacheEntry {
                data,
                timestamp: Instant::now(),
            },
        );

        while self.entries.len() > self.max_entries {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(key, _)| *key)
            else {
                break;
            };
            debug!("Evicting cached graph {oldest:?}");
            self.entries.remove(&oldest);
        }
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(lat: f64) -> CacheKey {
        CacheKey::new(StreetPoint::new(lat, 13.4), 500.0)
    }

    #[test]
    fn test_key_rounds_center() {
        let a = CacheKey::new(StreetPoint::new(52.520_01, 13.404_99), 500.2);
        let b = CacheKey::new(StreetPoint::new(52.519_99, 13.405_01), 499.8);
        assert_eq!(a, b);
        assert_ne!(a, CacheKey::new(StreetPoint::new(52.5202, 13.405), 500.0));
        assert_ne!(a, CacheKey::new(StreetPoint::new(52.52, 13.405), 800.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_freshness_window() {
        let mut cache = GraphCache::new(Duration::from_secs(300), 4);
        cache.insert(key(52.0), StreetGraph::empty());

        assert!(cache.get_fresh(&key(52.0)).is_some());
        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.get_fresh(&key(52.0)).is_none());
        assert!(cache.get_any(&key(52.0)).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicts_oldest() {
        let mut cache = GraphCache::new(Duration::from_secs(300), 2);
        cache.insert(key(1.0), StreetGraph::empty());
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert(key(2.0), StreetGraph::empty());
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert(key(3.0), StreetGraph::empty());

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&key(1.0)));
        assert!(cache.contains(&key(2.0)));
        assert!(cache.contains(&key(3.0)));
    }
}
