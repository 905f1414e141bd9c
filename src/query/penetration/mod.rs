//! Penetration depth estimation between overlapping convex shapes.
//!
//! These solvers are the fall-back of the [`GjkPairDetector`](crate::query::gjk::GjkPairDetector)
//! when GJK alone cannot conclude, either because the shapes overlap or because
//! the simplex degenerated.

pub use self::gjk_epa_penetration::GjkEpaPenetrationDepthSolver;
pub use self::minkowski_penetration::MinkowskiPenetrationDepthSolver;

use crate::math::{Isometry, Point, Real, Vector};
use crate::query::gjk::VoronoiSimplexSolver;
use crate::shape::ConvexShape;

mod gjk_epa_penetration;
mod minkowski_penetration;

/// The outcome of a penetration depth estimation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PenetrationDepth {
    /// The shapes overlap.
    Penetrating {
        /// The penetration axis, pointing from the second shape toward the first.
        axis: Vector<Real>,
        /// The deepest point of the first shape inside the second one.
        witness_a: Point<Real>,
        /// The deepest point of the second shape inside the first one.
        witness_b: Point<Real>,
    },
    /// The shapes turned out to be disjoint.
    ///
    /// The witnesses lie on the shape cores, i.e. margins are not included.
    Separated {
        /// The separating axis, pointing from the second shape toward the first.
        axis: Vector<Real>,
        /// The closest point of the first shape's core.
        witness_a: Point<Real>,
        /// The closest point of the second shape's core.
        witness_b: Point<Real>,
    },
}

impl PenetrationDepth {
    /// The axis found by the solver, pointing from the second shape toward the first.
    pub fn axis(&self) -> Vector<Real> {
        match self {
            PenetrationDepth::Penetrating { axis, .. } | PenetrationDepth::Separated { axis, .. } => {
                *axis
            }
        }
    }

    /// The pair of witness points found by the solver.
    pub fn witnesses(&self) -> (Point<Real>, Point<Real>) {
        match self {
            PenetrationDepth::Penetrating {
                witness_a,
                witness_b,
                ..
            }
            | PenetrationDepth::Separated {
                witness_a,
                witness_b,
                ..
            } => (*witness_a, *witness_b),
        }
    }
}

/// An algorithm estimating the penetration depth of two convex shapes.
pub trait ConvexPenetrationDepthSolver {
    /// Estimates the penetration of `shape_a` at `transform_a` with `shape_b` at `transform_b`.
    ///
    /// Returns `None` if no usable result could be found. This is an ordinary
    /// outcome for degenerate configurations.
    fn calc_pen_depth(
        &self,
        simplex_solver: &mut VoronoiSimplexSolver,
        shape_a: &ConvexShape,
        shape_b: &ConvexShape,
        transform_a: &Isometry<Real>,
        transform_b: &Isometry<Real>,
    ) -> Option<PenetrationDepth>;
}
