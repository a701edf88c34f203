//! Geometry primitives, exploration tracking and nearest-entity queries

pub mod exploration;
pub mod geometry;
pub mod nearest;
