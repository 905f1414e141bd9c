//! Narrow-phase geometric queries between convex shapes.
//!
//! * [`gjk::GjkPairDetector`] computes the closest points of two shapes, and
//!   falls back to a [`penetration`] solver when they overlap.
//! * [`gjk_epa`] computes separation distances and penetration depths with a
//!   self-contained GJK and Expanding Polytope Algorithm.
//! * [`cast`] computes the time of impact of two moving shapes.

pub use self::closest_points::{
    ClosestPointInput, ClosestPointsResult, DiscreteCollisionDetector, PointCollector,
};

pub mod cast;
mod closest_points;
pub mod gjk;
pub mod gjk_epa;
pub mod penetration;
