use crate::math::{Isometry, Real, Vector};
use crate::query::gjk::VoronoiSimplexSolver;
use crate::query::gjk_epa::{self, CoreShape, EpaOptions, GjkEpaResult};
use crate::query::penetration::{ConvexPenetrationDepthSolver, PenetrationDepth};
use crate::shape::ConvexShape;

/// Penetration depth estimation with the GJK+EPA solver.
///
/// Several initial guesses are tried in turn: the direction joining the shape
/// origins, its opposite, the coordinate axes and the cube diagonals. For each
/// of them EPA is attempted first, then a plain distance query; the first one
/// producing usable geometry wins.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GjkEpaPenetrationDepthSolver {
    /// Parameters of the EPA stage.
    pub options: EpaOptions,
}

impl GjkEpaPenetrationDepthSolver {
    /// Creates a solver with default EPA parameters.
    pub fn new() -> Self {
        Self::default()
    }

    fn guesses(transform_a: &Isometry<Real>, transform_b: &Isometry<Real>) -> Vec<Vector<Real>> {
        let mut guesses = Vec::with_capacity(16);
        let centers = transform_b.translation.vector - transform_a.translation.vector;

        if centers.norm_squared() > 0.0 {
            guesses.push(centers);
            guesses.push(-centers);
        }

        for i in 0..3 {
            let mut axis = Vector::zeros();
            axis[i] = 1.0;
            guesses.push(axis);
            guesses.push(-axis);
        }

        for diag in [
            Vector::new(1.0, 1.0, 1.0),
            Vector::new(-1.0, 1.0, 1.0),
            Vector::new(1.0, -1.0, 1.0),
            Vector::new(1.0, 1.0, -1.0),
        ] {
            guesses.push(diag);
            guesses.push(-diag);
        }

        guesses
    }
}

impl ConvexPenetrationDepthSolver for GjkEpaPenetrationDepthSolver {
    fn calc_pen_depth(
        &self,
        _simplex_solver: &mut VoronoiSimplexSolver,
        shape_a: &ConvexShape,
        shape_b: &ConvexShape,
        transform_a: &Isometry<Real>,
        transform_b: &Isometry<Real>,
    ) -> Option<PenetrationDepth> {
        let mut results = GjkEpaResult::default();

        for guess in Self::guesses(transform_a, transform_b) {
            if gjk_epa::penetration_support_maps(
                shape_a,
                transform_a,
                shape_b,
                transform_b,
                &guess,
                &self.options,
                &mut results,
            ) {
                return Some(PenetrationDepth::Penetrating {
                    axis: results.normal,
                    witness_a: results.witnesses[0],
                    witness_b: results.witnesses[1],
                });
            }

            if gjk_epa::distance_support_maps(
                &CoreShape(shape_a),
                transform_a,
                &CoreShape(shape_b),
                transform_b,
                &guess,
                &mut results,
            ) {
                return Some(PenetrationDepth::Separated {
                    axis: results.normal,
                    witness_a: results.witnesses[0],
                    witness_b: results.witnesses[1],
                });
            }

            log::debug!(
                "GJK+EPA penetration failed along {:?}: {:?}",
                guess,
                results.status
            );
        }

        None
    }
}
