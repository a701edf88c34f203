//! Confidence-scored exploration tracking.
//!
//! A single GPS fix near a street is weak evidence: urban canyons and sensor
//! jitter routinely place fixes on the wrong block. Each fix is therefore
//! turned into a point confidence (closer and more accurate fixes count more)
//! and folded into a per-entity exponential moving average. An entity flips
//! to explored only once the average crosses a threshold, which takes several
//! corroborating fixes.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use log::{debug, info};
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

use super::geometry::{closest_point_on_polyline, distance};
use crate::{BoundingBox, Error, ExplorationState, GpsSample, Millis, StreetGraph};

/// Tuning for [`ExplorationTracker`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Samples at or beyond this distance (meters) are ignored
    pub max_tracking_distance: f64,
    /// EMA weight of the newest observation
    pub smoothing_factor: f64,
    /// Confidence at which an entity becomes explored
    pub explored_threshold: f64,
    /// Accuracy radius (meters) above which the moderate penalty applies
    pub moderate_accuracy: f64,
    pub moderate_accuracy_penalty: f64,
    /// Accuracy radius (meters) above which the poor penalty applies instead
    pub poor_accuracy: f64,
    pub poor_accuracy_penalty: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_tracking_distance: 30.0,
            smoothing_factor: 0.3,
            explored_threshold: 0.7,
            moderate_accuracy: 10.0,
            moderate_accuracy_penalty: 0.75,
            poor_accuracy: 20.0,
            poor_accuracy_penalty: 0.5,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.max_tracking_distance.is_finite() && self.max_tracking_distance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_tracking_distance must be positive, got {}",
                self.max_tracking_distance
            )));
        }
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "smoothing_factor must be in (0, 1], got {}",
                self.smoothing_factor
            )));
        }
        for (name, value) in [
            ("explored_threshold", self.explored_threshold),
            ("moderate_accuracy_penalty", self.moderate_accuracy_penalty),
            ("poor_accuracy_penalty", self.poor_accuracy_penalty),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if self.poor_accuracy < self.moderate_accuracy {
            return Err(Error::InvalidConfig(
                "poor_accuracy must not be below moderate_accuracy".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one [`ExplorationTracker::update_from_path`] call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingSummary {
    pub samples_processed: usize,
    /// Sample/segment pairs within tracking range
    pub segment_observations: usize,
    /// Sample/intersection pairs within tracking range
    pub intersection_observations: usize,
    /// Segments that crossed the threshold during this call, in order
    pub newly_explored_segments: Vec<EdgeIndex>,
    pub newly_explored_intersections: Vec<NodeIndex>,
}

/// One sample as seen from one entity
#[derive(Debug, Clone, Copy)]
struct Observation {
    confidence: f64,
    distance: f64,
    dwell: Millis,
    timestamp: DateTime<Utc>,
}

impl ExplorationState {
    /// Folds an observation into the running state. Returns `true` when this
    /// observation made the entity explored.
    fn observe(&mut self, observation: &Observation, smoothing: f64, threshold: f64) -> bool {
        self.confidence_score = (smoothing * observation.confidence
            + (1.0 - smoothing) * self.confidence_score)
            .clamp(0.0, 1.0);

        self.visit_count += 1;
        self.total_time_nearby += observation.dwell;
        self.average_distance +=
            (observation.distance - self.average_distance) / f64::from(self.visit_count);
        self.last_visited = Some(observation.timestamp);

        self.promote(threshold, observation.timestamp)
    }

    fn promote(&mut self, threshold: f64, at: DateTime<Utc>) -> bool {
        if self.is_explored || self.confidence_score < threshold {
            return false;
        }
        self.is_explored = true;
        self.explored_at = Some(at);
        true
    }

    /// Manual override: raises confidence to `threshold` and flips the flag.
    /// Returns `false` if the entity was already explored.
    fn force_explored(&mut self, threshold: f64, at: DateTime<Utc>) -> bool {
        if self.is_explored {
            return false;
        }
        self.confidence_score = self.confidence_score.max(threshold);
        self.promote(threshold, at)
    }
}

/// Updates exploration state of a [`StreetGraph`] from GPS paths
#[derive(Debug, Clone, Default)]
pub struct ExplorationTracker {
    config: TrackerConfig,
}

impl ExplorationTracker {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for out-of-range tuning values
    pub fn new(config: TrackerConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Confidence in `[0, 1]` contributed by one fix at `distance` meters.
    ///
    /// Three linear bands: `[0, 5]` maps to `[1.0, 0.8]`, `(5, 15]` to
    /// `[0.8, 0.4]` and `(15, max]` to `[0.4, 0.0]`. Poor accuracy then scales
    /// the result down.
    pub fn point_confidence(&self, distance: f64, accuracy: Option<f64>) -> f64 {
        let max = self.config.max_tracking_distance;
        let base = if distance <= 5.0 {
            1.0 - 0.2 * (distance / 5.0)
        } else if distance <= 15.0 {
            0.8 - 0.4 * ((distance - 5.0) / 10.0)
        } else if distance < max && max > 15.0 {
            0.4 - 0.4 * ((distance - 15.0) / (max - 15.0))
        } else {
            0.0
        };

        let penalty = match accuracy {
            Some(radius) if radius > self.config.poor_accuracy => self.config.poor_accuracy_penalty,
            Some(radius) if radius > self.config.moderate_accuracy => {
                self.config.moderate_accuracy_penalty
            }
            _ => 1.0,
        };

        (base.max(0.0) * penalty).clamp(0.0, 1.0)
    }

    /// Feeds a batch of GPS samples into the graph's exploration state.
    ///
    /// Samples are expected in timestamp order and are re-sorted if they are
    /// not. Updates are order-sensitive: replaying a sample changes scores.
    pub fn update_from_path(
        &self,
        graph: &mut StreetGraph,
        samples: &[GpsSample],
    ) -> TrackingSummary {
        let ordered: Cow<'_, [GpsSample]> = if samples.is_sorted_by_key(|s| s.timestamp) {
            Cow::Borrowed(samples)
        } else {
            debug!("Re-sorting {} GPS samples by timestamp", samples.len());
            let mut sorted = samples.to_vec();
            sorted.sort_by_key(|s| s.timestamp);
            Cow::Owned(sorted)
        };

        let mut summary = TrackingSummary::default();
        let mut nearby_segments: Vec<EdgeIndex> = Vec::new();
        let mut nearby_intersections: Vec<NodeIndex> = Vec::new();

        for (idx, sample) in ordered.iter().enumerate() {
            let dwell = ordered.get(idx + 1).map_or(0, |next| {
                Millis::try_from((next.timestamp - sample.timestamp).num_milliseconds())
                    .unwrap_or(0)
            });
            let window = BoundingBox::around(sample.point, self.config.max_tracking_distance);

            nearby_segments.clear();
            nearby_segments.extend(graph.segments_within(window));
            for &edge in &nearby_segments {
                let Some(segment) = graph.segment(edge) else {
                    continue;
                };
                let d = closest_point_on_polyline(sample.point, &segment.points).distance;
                if d >= self.config.max_tracking_distance {
                    continue;
                }
                let observation = self.observation(sample, d, dwell);
                summary.segment_observations += 1;
                if let Some(segment) = graph.segment_mut(edge)
                    && segment.exploration.observe(
                        &observation,
                        self.config.smoothing_factor,
                        self.config.explored_threshold,
                    )
                {
                    debug!("Segment {} ({}) explored", segment.way_id, segment.name);
                    summary.newly_explored_segments.push(edge);
                }
            }

            nearby_intersections.clear();
            nearby_intersections.extend(graph.intersections_within(window));
            for &node in &nearby_intersections {
                let Some(intersection) = graph.intersection_mut(node) else {
                    continue;
                };
                let d = distance(sample.point, intersection.location);
                if d >= self.config.max_tracking_distance {
                    continue;
                }
                let observation = self.observation(sample, d, dwell);
                summary.intersection_observations += 1;
                if intersection.exploration.observe(
                    &observation,
                    self.config.smoothing_factor,
                    self.config.explored_threshold,
                ) {
                    debug!("Intersection {} explored", intersection.key);
                    summary.newly_explored_intersections.push(node);
                }
            }

            summary.samples_processed += 1;
        }

        if !summary.newly_explored_segments.is_empty()
            || !summary.newly_explored_intersections.is_empty()
        {
            info!(
                "{} samples explored {} new segments and {} new intersections",
                summary.samples_processed,
                summary.newly_explored_segments.len(),
                summary.newly_explored_intersections.len()
            );
        }

        summary
    }

    /// Marks a segment explored regardless of GPS evidence.
    /// Returns `false` if it was already explored or does not exist.
    pub fn mark_segment_explored(
        &self,
        graph: &mut StreetGraph,
        segment: EdgeIndex,
        at: DateTime<Utc>,
    ) -> bool {
        graph.segment_mut(segment).is_some_and(|segment| {
            segment
                .exploration
                .force_explored(self.config.explored_threshold, at)
        })
    }

    /// Marks an intersection explored regardless of GPS evidence.
    pub fn mark_intersection_explored(
        &self,
        graph: &mut StreetGraph,
        intersection: NodeIndex,
        at: DateTime<Utc>,
    ) -> bool {
        graph.intersection_mut(intersection).is_some_and(|node| {
            node.exploration
                .force_explored(self.config.explored_threshold, at)
        })
    }

    fn observation(&self, sample: &GpsSample, distance: f64, dwell: Millis) -> Observation {
        Observation {
            confidence: self.point_confidence(distance, sample.accuracy),
            distance,
            dwell,
            timestamp: sample.timestamp,
        }
    }
}
