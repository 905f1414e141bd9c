use crate::math::{Isometry, Real};
use crate::query::cast::{CastResult, ConvexCast, CAST_CONTACT_RADIUS};
use crate::query::gjk::{GjkPairDetector, VoronoiSimplexSolver};
use crate::query::{ClosestPointInput, DiscreteCollisionDetector, PointCollector};
use crate::shape::ConvexShape;
use crate::utils::transform_util;

/// Time of impact for linear motion, by conservative advancement driven by
/// GJK closest points.
///
/// The orientations of both shapes are the ones of their `from` poses.
pub struct GjkConvexCast<'a> {
    simplex_solver: &'a mut VoronoiSimplexSolver,
    convex_a: &'a ConvexShape,
    convex_b: &'a ConvexShape,
}

impl<'a> GjkConvexCast<'a> {
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

impl ConvexCast for GjkConvexCast<'_> {
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

        let mut gjk = GjkPairDetector::new(
            self.convex_a,
            self.convex_b,
            &mut *self.simplex_solver,
            None,
        );
        let mut input = ClosestPointInput::new(*from_a, *from_b);
        let mut collector = PointCollector::default();
        gjk.get_closest_points(&input, &mut collector);

        if !collector.has_result {
            return false;
        }

        let mut lambda: Real = 0.0;
        let mut last_lambda = lambda;
        let mut num_iter = 0;
        let mut dist = collector.distance;
        let mut n = collector.normal_on_b_in_world;
        let mut c = collector.point_in_world;

        while dist > CAST_CONTACT_RADIUS {
            num_iter += 1;
            if num_iter > result.options.max_iterations {
                result.report_failure(-2, num_iter);
                return false;
            }

            lambda -= dist / r.dot(&n);

            if !(0.0..=1.0).contains(&lambda) || lambda <= last_lambda {
                return false;
            }

            last_lambda = lambda;
            result.debug_draw(lambda);

            input.transform_a = transform_util::interpolate_translation(from_a, to_a, lambda);
            input.transform_b = transform_util::interpolate_translation(from_b, to_b, lambda);

            let mut collector = PointCollector::default();
            gjk.get_closest_points(&input, &mut collector);

            if !collector.has_result {
                result.report_failure(-1, num_iter);
                return false;
            }

            if collector.distance < 0.0 {
                result.fraction = last_lambda;
                result.normal = collector.normal_on_b_in_world;
                result.hit_point = collector.point_in_world;
                result.hit_transform_a = input.transform_a;
                result.hit_transform_b = input.transform_b;
                return true;
            }

            c = collector.point_in_world;
            n = collector.normal_on_b_in_world;
            dist = collector.distance;
        }

        // Motion away from the contact normal, or minor penetration.
        if n.dot(&r) >= -result.options.allowed_penetration {
            return false;
        }

        result.fraction = lambda;
        result.normal = n;
        result.hit_point = c;
        result.hit_transform_a = input.transform_a;
        result.hit_transform_b = input.transform_b;
        true
    }
}
