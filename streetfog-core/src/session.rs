//! Host-facing exploration context.
//!
//! Owns the fetch client, the current street graph and the tracker. There is
//! no process-wide state: each session is independent and all mutation goes
//! through `&mut self`.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::algo::exploration::{ExplorationTracker, TrackerConfig, TrackingSummary};
use crate::algo::nearest::{
    ExploredFilter, NearbyIntersection, NearbySegment, nearest_intersections, nearest_segments,
};
use crate::loading::{ConnectivityStatus, OverpassTransport, StreetDataClient};
use crate::model::CoverageStats;
use crate::routing::{LoopConfig, LoopError, LoopRoute, find_loop};
use crate::{Error, GpsSample, NodeKey, StreetGraph, StreetPoint, WayId};

/// Summary of a [`ExplorationSession::load_area`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphLoad {
    pub segment_count: usize,
    pub intersection_count: usize,
    pub from_cache: bool,
    pub is_offline_fallback: bool,
    /// Entities whose exploration state was carried over from the previous graph
    pub carried_over: usize,
}

pub struct ExplorationSession<T: OverpassTransport> {
    client: StreetDataClient<T>,
    graph: Option<StreetGraph>,
    tracker: ExplorationTracker,
    loop_config: LoopConfig,
}

impl<T: OverpassTransport> ExplorationSession<T> {
    pub fn new(client: StreetDataClient<T>, tracker_config: TrackerConfig) -> Result<Self, Error> {
        Ok(Self {
            client,
            graph: None,
            tracker: ExplorationTracker::new(tracker_config)?,
            loop_config: LoopConfig::default(),
        })
    }

    pub fn with_loop_config(mut self, loop_config: LoopConfig) -> Self {
        self.loop_config = loop_config;
        self
    }

    /// Fetches the area around `center` and makes it the current graph.
    ///
    /// Exploration state of segments and intersections that also exist in
    /// the previous graph (same way id or intersection key) is kept.
    pub async fn load_area(
        &mut self,
        center: StreetPoint,
        radius_meters: f64,
    ) -> Result<GraphLoad, Error> {
        let fetch = self.client.fetch_graph(center, radius_meters).await?;
        let mut graph = fetch.graph;

        let carried_over = match &self.graph {
            Some(previous) => graph.adopt_exploration(previous),
            None => 0,
        };
        if carried_over > 0 {
            debug!("Carried exploration state over to {carried_over} entities");
        }

        let load = GraphLoad {
            segment_count: graph.segment_count(),
            intersection_count: graph.intersection_count(),
            from_cache: fetch.from_cache,
            is_offline_fallback: fetch.is_offline_fallback,
            carried_over,
        };
        info!(
            "Loaded area: {} segments, {} intersections (cache: {}, offline: {})",
            load.segment_count, load.intersection_count, load.from_cache, load.is_offline_fallback
        );

        self.graph = Some(graph);
        Ok(load)
    }

    /// Installs a graph built elsewhere, e.g. restored from a snapshot
    pub fn replace_graph(&mut self, graph: StreetGraph) -> Option<StreetGraph> {
        self.graph.replace(graph)
    }

    pub fn graph(&self) -> Option<&StreetGraph> {
        self.graph.as_ref()
    }

    /// Applies GPS samples to the current graph. Without a graph nothing is
    /// processed.
    pub fn record_path(&mut self, samples: &[GpsSample]) -> TrackingSummary {
        match self.graph.as_mut() {
            Some(graph) => self.tracker.update_from_path(graph, samples),
            None => TrackingSummary::default(),
        }
    }

    pub fn nearest_segments(
        &self,
        point: StreetPoint,
        k: usize,
        filter: ExploredFilter,
    ) -> Vec<NearbySegment<'_>> {
        self.graph
            .as_ref()
            .map(|graph| nearest_segments(graph, point, k, filter))
            .unwrap_or_default()
    }

    pub fn nearest_intersections(
        &self,
        point: StreetPoint,
        k: usize,
        filter: ExploredFilter,
    ) -> Vec<NearbyIntersection<'_>> {
        self.graph
            .as_ref()
            .map(|graph| nearest_intersections(graph, point, k, filter))
            .unwrap_or_default()
    }

    /// Without a graph there is nothing to walk: [`LoopError::DeadEnd`]
    pub fn find_loop(&self, start: StreetPoint, max_distance: f64) -> Result<LoopRoute, LoopError> {
        match &self.graph {
            Some(graph) => find_loop(graph, start, max_distance, &self.loop_config),
            None => Err(LoopError::DeadEnd),
        }
    }

    /// Returns whether the segment became explored by this call
    pub fn mark_segment_explored(
        &mut self,
        way_id: WayId,
        at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let graph = self.graph.as_mut().ok_or(Error::NoGraphLoaded)?;
        let edge = graph
            .segment_by_way(way_id)
            .ok_or_else(|| Error::InvalidData(format!("unknown way {way_id}")))?;
        Ok(self.tracker.mark_segment_explored(graph, edge, at))
    }

    pub fn mark_intersection_explored(
        &mut self,
        key: &NodeKey,
        at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let graph = self.graph.as_mut().ok_or(Error::NoGraphLoaded)?;
        let node = graph
            .intersection_by_key(key)
            .ok_or_else(|| Error::InvalidData(format!("unknown intersection {key}")))?;
        Ok(self.tracker.mark_intersection_explored(graph, node, at))
    }

    /// Drops the current graph and every cached area
    pub fn reset(&mut self) {
        self.graph = None;
        self.client.invalidate_cache();
        info!("Exploration session reset");
    }

    /// Zero coverage when no graph is loaded
    pub fn coverage(&self) -> CoverageStats {
        self.graph
            .as_ref()
            .map(StreetGraph::coverage)
            .unwrap_or_default()
    }

    pub fn connectivity(&self) -> ConnectivityStatus {
        self.client.status()
    }

    pub fn client(&self) -> &StreetDataClient<T> {
        &self.client
    }

    pub fn tracker(&self) -> &ExplorationTracker {
        &self.tracker
    }
}
