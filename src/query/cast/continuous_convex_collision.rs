use crate::math::{Isometry, Real, Vector, DEFAULT_EPSILON};
use crate::query::cast::{CastResult, ConvexCast, CAST_CONTACT_RADIUS};
use crate::query::gjk::{GjkPairDetector, VoronoiSimplexSolver};
use crate::query::penetration::ConvexPenetrationDepthSolver;
use crate::query::{ClosestPointInput, ClosestPointsResult, DiscreteCollisionDetector, PointCollector};
use crate::shape::{ConvexShape, Plane};
use crate::utils::transform_util;

/// The second operand of a [`ContinuousConvexCollision`].
#[derive(Copy, Clone, Debug)]
pub enum CastTarget<'a> {
    /// A convex shape, handled with GJK.
    Shape(&'a ConvexShape),
    /// A plane, handled analytically. The plane is given in the local frame
    /// of the B poses.
    Plane(&'a Plane),
}

/// Time of impact by conservative advancement, for linear and angular motion.
///
/// At each step the closest points at the current poses bound how far the
/// shapes can move before touching, given their relative linear velocity and
/// an upper bound of the velocity induced by their rotation. The sweep
/// fraction advances by that amount until the shapes are closer than
/// [`CAST_CONTACT_RADIUS`].
pub struct ContinuousConvexCollision<'a> {
    simplex_solver: &'a mut VoronoiSimplexSolver,
    penetration_solver: Option<&'a dyn ConvexPenetrationDepthSolver>,
    convex_a: &'a ConvexShape,
    target: CastTarget<'a>,
    /// Maximum number of advancement steps.
    pub max_iterations: usize,
}

impl<'a> ContinuousConvexCollision<'a> {
    /// The default maximum number of advancement steps.
    pub const MAX_ITERATIONS: usize = 64;

    /// Casts `convex_a` against the convex shape `convex_b`.
    pub fn new(
        convex_a: &'a ConvexShape,
        convex_b: &'a ConvexShape,
        simplex_solver: &'a mut VoronoiSimplexSolver,
        penetration_solver: Option<&'a dyn ConvexPenetrationDepthSolver>,
    ) -> Self {
        Self {
            simplex_solver,
            penetration_solver,
            convex_a,
            target: CastTarget::Shape(convex_b),
            max_iterations: Self::MAX_ITERATIONS,
        }
    }

    /// Casts `convex_a` against a static plane.
    pub fn with_plane(
        convex_a: &'a ConvexShape,
        plane: &'a Plane,
        simplex_solver: &'a mut VoronoiSimplexSolver,
    ) -> Self {
        Self {
            simplex_solver,
            penetration_solver: None,
            convex_a,
            target: CastTarget::Plane(plane),
            max_iterations: Self::MAX_ITERATIONS,
        }
    }

    fn compute_closest_points(
        &mut self,
        transform_a: &Isometry<Real>,
        transform_b: &Isometry<Real>,
        collector: &mut PointCollector,
    ) {
        match self.target {
            CastTarget::Shape(convex_b) => {
                let mut gjk = GjkPairDetector::new(
                    self.convex_a,
                    convex_b,
                    &mut *self.simplex_solver,
                    self.penetration_solver,
                );
                let input = ClosestPointInput::new(*transform_a, *transform_b);
                gjk.get_closest_points(&input, collector);
            }
            CastTarget::Plane(plane) => {
                let normal = plane.normal_vector();
                let plane_in_convex = transform_a.inv_mul(transform_b);
                let convex_in_plane = transform_b.inv_mul(transform_a);

                let vtx = self
                    .convex_a
                    .local_support_vertex(&(plane_in_convex.rotation * -normal));
                let vtx_in_plane = convex_in_plane * vtx;
                let distance = plane.signed_distance(&vtx_in_plane);
                let projected = vtx_in_plane - normal * distance;

                collector.add_contact_point(
                    &(transform_b.rotation * normal),
                    &(transform_b * projected),
                    distance,
                );
            }
        }
    }

    fn angular_motion_disc_b(&self) -> Real {
        match self.target {
            CastTarget::Shape(convex_b) => convex_b.angular_motion_disc(),
            CastTarget::Plane(_) => 0.0,
        }
    }
}

impl ConvexCast for ContinuousConvexCollision<'_> {
    fn calc_time_of_impact(
        &mut self,
        from_a: &Isometry<Real>,
        to_a: &Isometry<Real>,
        from_b: &Isometry<Real>,
        to_b: &Isometry<Real>,
        result: &mut CastResult<'_>,
    ) -> bool {
        let (linvel_a, angvel_a) = transform_util::calculate_velocity(from_a, to_a, 1.0);
        let (linvel_b, angvel_b) = transform_util::calculate_velocity(from_b, to_b, 1.0);

        let bounding_radius_a = self.convex_a.angular_motion_disc();
        let bounding_radius_b = self.angular_motion_disc_b();
        let max_angular_projected_velocity =
            angvel_a.norm() * bounding_radius_a + angvel_b.norm() * bounding_radius_b;

        let rel_linvel = linvel_b - linvel_a;

        if rel_linvel.norm() + max_angular_projected_velocity == 0.0 {
            return false;
        }

        let mut collector = PointCollector::default();
        self.compute_closest_points(from_a, from_b, &mut collector);

        if !collector.has_result {
            return false;
        }

        let mut lambda: Real = 0.0;
        let mut last_lambda = lambda;
        let mut num_iter = 0;
        let mut dist = collector.distance + result.options.allowed_penetration;
        let mut n: Vector<Real> = collector.normal_on_b_in_world;
        let mut c = collector.point_in_world;

        while dist > CAST_CONTACT_RADIUS {
            let projected_linear_velocity = rel_linvel.dot(&n);

            // Motion away from the contact normal, or minor penetration.
            if projected_linear_velocity + max_angular_projected_velocity <= DEFAULT_EPSILON {
                return false;
            }

            lambda += dist / (projected_linear_velocity + max_angular_projected_velocity);

            if !(0.0..=1.0).contains(&lambda) {
                return false;
            }

            if lambda <= last_lambda {
                log::debug!(
                    "conservative advancement stalled at {} (previous {})",
                    lambda,
                    last_lambda
                );
                return false;
            }

            last_lambda = lambda;

            let interpolated_a =
                transform_util::integrate_transform(from_a, &linvel_a, &angvel_a, lambda);
            let interpolated_b =
                transform_util::integrate_transform(from_b, &linvel_b, &angvel_b, lambda);

            result.draw_coordinate_system(&interpolated_a);
            result.debug_draw(lambda);

            let mut collector = PointCollector::default();
            self.compute_closest_points(&interpolated_a, &interpolated_b, &mut collector);

            if !collector.has_result {
                result.report_failure(-1, num_iter);
                return false;
            }

            dist = collector.distance + result.options.allowed_penetration;
            c = collector.point_in_world;
            n = collector.normal_on_b_in_world;

            num_iter += 1;
            if num_iter > self.max_iterations {
                result.report_failure(-2, num_iter);
                return false;
            }

            result.hit_transform_a = interpolated_a;
            result.hit_transform_b = interpolated_b;
        }

        if num_iter == 0 {
            result.hit_transform_a = *from_a;
            result.hit_transform_b = *from_b;
        }

        result.fraction = lambda;
        result.normal = n;
        result.hit_point = c;
        true
    }
}
