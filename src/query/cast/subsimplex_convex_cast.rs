use crate::math::{Isometry, Real, Vector, DEFAULT_EPSILON};
use crate::query::cast::{CastResult, ConvexCast};
use crate::query::gjk::VoronoiSimplexSolver;
use crate::shape::ConvexShape;
use crate::utils::transform_util;

/// Time of impact for linear motion, by ray-casting the Minkowski difference
/// of both shapes along their relative motion.
///
/// The orientations of both shapes are the ones of their `from` poses.
pub struct SubsimplexConvexCast<'a> {
    simplex_solver: &'a mut VoronoiSimplexSolver,
    convex_a: &'a ConvexShape,
    convex_b: &'a ConvexShape,
}

impl<'a> SubsimplexConvexCast<'a> {
    /// Creates a cast of `convex_a` against `convex_b`.
    pub fn new(
        convex_a: &'a ConvexShape,
        convex_b: &'a ConvexShape,
        simplex_solver: &'a mut VoronoiSimplexSolver,
    ) -> Self {
        Self {
            simplex_solver,
            convex_a,
            convex_b,
        }
    }
}

impl ConvexCast for SubsimplexConvexCast<'_> {
    fn calc_time_of_impact(
        &mut self,
        from_a: &Isometry<Real>,
        to_a: &Isometry<Real>,
        from_b: &Isometry<Real>,
        to_b: &Isometry<Real>,
        result: &mut CastResult<'_>,
    ) -> bool {
        self.simplex_solver.reset();

        let linvel_a = to_a.translation.vector - from_a.translation.vector;
        let linvel_b = to_b.translation.vector - from_b.translation.vector;
        let r = linvel_a - linvel_b;

        let mut lambda: Real = 0.0;
        let mut interpolated_a = *from_a;
        let mut interpolated_b = *from_b;

        let support_a = |pose: &Isometry<Real>, dir: &Vector<Real>| {
            pose * self.convex_a.local_support_vertex(&pose.inverse_transform_vector(dir))
        };
        let support_b = |pose: &Isometry<Real>, dir: &Vector<Real>| {
            pose * self.convex_b.local_support_vertex(&pose.inverse_transform_vector(dir))
        };

        let mut v = support_a(from_a, &-r) - support_b(from_b, &r);
        let mut n = Vector::zeros();
        let mut dist2 = v.norm_squared();
        let mut iterations = 0;

        while dist2 > result.options.epsilon {
            if iterations >= result.options.max_iterations {
                result.report_failure(-2, iterations);
                return false;
            }
            iterations += 1;

            let sup_a = support_a(&interpolated_a, &-v);
            let sup_b = support_b(&interpolated_b, &v);
            let mut w = sup_a - sup_b;
            let v_dot_w = v.dot(&w);

            if lambda > 1.0 {
                return false;
            }

            if v_dot_w > 0.0 {
                let v_dot_r = v.dot(&r);

                if v_dot_r >= -(DEFAULT_EPSILON * DEFAULT_EPSILON) {
                    return false;
                }

                lambda -= v_dot_w / v_dot_r;
                interpolated_a = transform_util::interpolate_translation(from_a, to_a, lambda);
                interpolated_b = transform_util::interpolate_translation(from_b, to_b, lambda);
                result.debug_draw(lambda);
                w = sup_a - sup_b;
                n = v;
            }

            if !self.simplex_solver.in_simplex(&w) {
                self.simplex_solver.add_vertex(w, sup_a, sup_b);
            }

            dist2 = match self.simplex_solver.closest() {
                Some(closest) => {
                    v = closest;
                    v.norm_squared()
                }
                None => 0.0,
            };
        }

        result.fraction = lambda;
        result.normal = if n.norm_squared() >= DEFAULT_EPSILON * DEFAULT_EPSILON {
            n.normalize()
        } else {
            Vector::zeros()
        };

        // Motion away from the contact normal, or minor penetration.
        if result.normal.dot(&r) >= -result.options.allowed_penetration {
            return false;
        }

        let (_, hit_b) = self.simplex_solver.compute_points();
        result.hit_point = hit_b;
        result.hit_transform_a = interpolated_a;
        result.hit_transform_b = interpolated_b;
        true
    }
}
