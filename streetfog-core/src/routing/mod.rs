//! Route search over the street graph

pub mod loops;

pub use loops::{LoopConfig, LoopError, LoopLeg, LoopRoute, LoopWaypoint, find_loop};
