//! Closest points between two convex shapes with the Gilbert-Johnson-Keerthi algorithm.
//!
//! GJK runs on the shape cores (margins excluded) and the margins are applied
//! to the witness points afterwards, so the reported distance is the distance
//! between the full shapes. When the cores overlap, or when the simplex
//! degenerates close to contact, the detector hands the pair over to a
//! [`ConvexPenetrationDepthSolver`].

use num_derive::FromPrimitive;

use crate::math::{Isometry, Point, Real, Vector, DEFAULT_EPSILON, LARGE_FLOAT};
use crate::query::gjk::VoronoiSimplexSolver;
use crate::query::penetration::{ConvexPenetrationDepthSolver, PenetrationDepth};
use crate::query::{ClosestPointInput, ClosestPointsResult, DiscreteCollisionDetector};
use crate::shape::ConvexShape;

/// Squared relative error under which GJK is considered converged.
pub const GJK_REL_ERROR2: Real = 1.0e-6;

/// The separation under which a degenerate GJK result is re-checked by the penetration solver.
pub const GJK_EPA_PENETRATION_TOLERANCE: Real = 0.001;

/// Parameters of the [`GjkPairDetector`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GjkOptions {
    /// The maximum number of GJK iterations.
    pub max_iterations: usize,
    /// Squared relative error under which GJK is considered converged.
    pub rel_error2: Real,
    /// The search direction GJK starts with.
    pub default_separating_axis: Vector<Real>,
    /// Degenerate results closer than this are re-checked by the penetration solver.
    pub penetration_tolerance: Real,
}

impl Default for GjkOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            rel_error2: GJK_REL_ERROR2,
            default_separating_axis: Vector::y(),
            penetration_tolerance: GJK_EPA_PENETRATION_TOLERANCE,
        }
    }
}

/// Why the GJK loop stopped before converging on a regular simplex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum DegenerateSimplex {
    /// The new support point was already part of the simplex.
    InSimplex = 1,
    /// The new support point did not improve the squared distance at all.
    NoImprovement = 2,
    /// The simplex solver could not find a valid closest point.
    ClosestPointFailed = 3,
    /// The iteration limit was exceeded.
    MaxIterations = 4,
    /// The final separating axis is too small to be normalized reliably.
    SmallSeparatingAxis = 5,
    /// The closest point reached the origin.
    OriginReached = 6,
    /// The shapes are further apart than the maximum distance.
    BeyondMaximumDistance = 10,
    /// The relative error dropped below its threshold.
    RelativeErrorReached = 11,
    /// The squared distance stopped decreasing.
    NoDistanceDecrease = 12,
    /// The simplex became a tetrahedron.
    FullSimplex = 13,
}

/// The way the last reported result was obtained.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum ClosestPointsMethod {
    /// GJK converged on separated cores.
    Gjk = 1,
    /// GJK stopped with a separating axis too small to use.
    GjkSmallAxis = 2,
    /// The penetration solver found a penetration.
    Penetration = 3,
    /// The penetration solver reported a separation farther than the GJK result.
    PenetrationSeparatedRejected = 5,
    /// The penetration solver reported a separation, which was used.
    PenetrationSeparated = 6,
    /// The penetration solver found a penetration shallower than the GJK result.
    PenetrationRejected = 8,
    /// The penetration solver returned coincident witnesses with no usable axis.
    PenetrationDegenerateNormal = 9,
    /// The sign-correction pass flipped the normal.
    FlippedNormal = 10,
}

/// The GJK closest-points detector for a pair of convex shapes.
///
/// The detector borrows a [`VoronoiSimplexSolver`] which is reset at the start
/// of every query, and optionally a penetration depth solver used as fall-back.
pub struct GjkPairDetector<'a> {
    shape_a: &'a ConvexShape,
    shape_b: &'a ConvexShape,
    simplex_solver: &'a mut VoronoiSimplexSolver,
    penetration_solver: Option<&'a dyn ConvexPenetrationDepthSolver>,
    options: GjkOptions,
    margin_a: Real,
    margin_b: Real,
    ignore_margin: bool,
    cached_separating_axis: Vector<Real>,
    cached_separating_distance: Real,
    last_used_method: Option<ClosestPointsMethod>,
    cur_iter: usize,
    degenerate_simplex: Option<DegenerateSimplex>,
    catch_degeneracies: bool,
    fix_contact_normal_direction: bool,
}

impl<'a> GjkPairDetector<'a> {
    /// Creates a detector for the given pair of shapes.
    pub fn new(
        shape_a: &'a ConvexShape,
        shape_b: &'a ConvexShape,
        simplex_solver: &'a mut VoronoiSimplexSolver,
        penetration_solver: Option<&'a dyn ConvexPenetrationDepthSolver>,
    ) -> Self {
        Self::with_options(
            shape_a,
            shape_b,
            simplex_solver,
            penetration_solver,
            GjkOptions::default(),
        )
    }

    /// Creates a detector with custom GJK parameters.
    pub fn with_options(
        shape_a: &'a ConvexShape,
        shape_b: &'a ConvexShape,
        simplex_solver: &'a mut VoronoiSimplexSolver,
        penetration_solver: Option<&'a dyn ConvexPenetrationDepthSolver>,
        options: GjkOptions,
    ) -> Self {
        Self {
            shape_a,
            shape_b,
            simplex_solver,
            penetration_solver,
            margin_a: shape_a.margin(),
            margin_b: shape_b.margin(),
            ignore_margin: false,
            cached_separating_axis: options.default_separating_axis,
            cached_separating_distance: 0.0,
            last_used_method: None,
            cur_iter: 0,
            degenerate_simplex: None,
            catch_degeneracies: true,
            fix_contact_normal_direction: false,
            options,
        }
    }

    /// The separating axis found by the last query, pointing from B toward A.
    #[inline]
    pub fn cached_separating_axis(&self) -> &Vector<Real> {
        &self.cached_separating_axis
    }

    /// Sets the separating axis used as a hint by the sign-correction pass of the next query.
    #[inline]
    pub fn set_cached_separating_axis(&mut self, axis: Vector<Real>) {
        self.cached_separating_axis = axis;
    }

    /// The signed distance found by the last query.
    #[inline]
    pub fn cached_separating_distance(&self) -> Real {
        self.cached_separating_distance
    }

    /// How the last result was obtained, if any result was found.
    #[inline]
    pub fn last_used_method(&self) -> Option<ClosestPointsMethod> {
        self.last_used_method
    }

    /// The number of GJK iterations of the last query.
    #[inline]
    pub fn cur_iter(&self) -> usize {
        self.cur_iter
    }

    /// Why the GJK loop of the last query stopped, if it stopped on a degenerate case.
    #[inline]
    pub fn degenerate_simplex(&self) -> Option<DegenerateSimplex> {
        self.degenerate_simplex
    }

    /// Whether degenerate GJK results close to contact are re-checked by the penetration solver.
    #[inline]
    pub fn catch_degeneracies(&self) -> bool {
        self.catch_degeneracies
    }

    /// Enables or disables the re-check of degenerate GJK results.
    #[inline]
    pub fn set_catch_degeneracies(&mut self, catch: bool) {
        self.catch_degeneracies = catch;
    }

    /// Whether the normal is forced to point from the center of B toward the center of A.
    #[inline]
    pub fn fix_contact_normal_direction(&self) -> bool {
        self.fix_contact_normal_direction
    }

    /// Enables or disables forcing the normal to point from the center of B toward the center of A.
    #[inline]
    pub fn set_fix_contact_normal_direction(&mut self, fix: bool) {
        self.fix_contact_normal_direction = fix;
    }

    /// Makes the detector treat both shapes as their cores.
    #[inline]
    pub fn set_ignore_margin(&mut self, ignore: bool) {
        self.ignore_margin = ignore;
    }

    /// Replaces the penetration depth solver.
    #[inline]
    pub fn set_penetration_solver(
        &mut self,
        penetration_solver: Option<&'a dyn ConvexPenetrationDepthSolver>,
    ) {
        self.penetration_solver = penetration_solver;
    }

    /// The core support point of `w = A - B` toward `-axis`, with both witnesses.
    fn support(
        &self,
        axis: &Vector<Real>,
        transform_a: &Isometry<Real>,
        transform_b: &Isometry<Real>,
    ) -> (Vector<Real>, Point<Real>, Point<Real>) {
        let axis_in_a = transform_a.inverse_transform_vector(&-axis);
        let axis_in_b = transform_b.inverse_transform_vector(axis);
        let p = transform_a * self.shape_a.local_support_vertex_without_margin(&axis_in_a);
        let q = transform_b * self.shape_b.local_support_vertex_without_margin(&axis_in_b);
        (p - q, p, q)
    }

    fn closest_points(&mut self, input: &ClosestPointInput, output: &mut dyn ClosestPointsResult) {
        let org_normal_in_b = self.cached_separating_axis;
        self.cached_separating_distance = 0.0;

        let mut distance = 0.0;
        let mut normal_in_b = Vector::zeros();
        let mut point_on_b = Point::origin();

        // Work around the midpoint of both shapes to limit cancellation errors.
        let position_offset =
            (input.transform_a.translation.vector + input.transform_b.translation.vector) * 0.5;
        let mut local_transform_a = input.transform_a;
        let mut local_transform_b = input.transform_b;
        local_transform_a.translation.vector -= position_offset;
        local_transform_b.translation.vector -= position_offset;

        let (margin_a, margin_b) = if self.ignore_margin {
            (0.0, 0.0)
        } else {
            (self.margin_a, self.margin_b)
        };
        let margin = margin_a + margin_b;

        self.cur_iter = 0;
        self.cached_separating_axis = self.options.default_separating_axis;
        self.degenerate_simplex = None;
        self.last_used_method = None;

        let mut is_valid = false;
        let mut check_simplex = false;
        let mut squared_distance = LARGE_FLOAT;

        self.simplex_solver.reset();

        loop {
            let (w, p, q) =
                self.support(&self.cached_separating_axis, &local_transform_a, &local_transform_b);
            let delta = self.cached_separating_axis.dot(&w);

            // Early exit: the cores are further apart than the maximum distance.
            if delta > 0.0 && delta * delta > squared_distance * input.maximum_distance_squared {
                self.degenerate_simplex = Some(DegenerateSimplex::BeyondMaximumDistance);
                check_simplex = true;
                break;
            }

            if self.simplex_solver.in_simplex(&w) {
                self.degenerate_simplex = Some(DegenerateSimplex::InSimplex);
                check_simplex = true;
                break;
            }

            let f0 = squared_distance - delta;
            let f1 = squared_distance * self.options.rel_error2;

            if f0 <= f1 {
                self.degenerate_simplex = Some(if f0 <= 0.0 {
                    DegenerateSimplex::NoImprovement
                } else {
                    DegenerateSimplex::RelativeErrorReached
                });
                check_simplex = true;
                break;
            }

            self.simplex_solver.add_vertex(w, p, q);

            let Some(new_axis) = self.simplex_solver.closest() else {
                self.degenerate_simplex = Some(DegenerateSimplex::ClosestPointFailed);
                check_simplex = true;
                break;
            };

            if new_axis.norm_squared() < self.options.rel_error2 {
                self.cached_separating_axis = new_axis;
                self.degenerate_simplex = Some(DegenerateSimplex::OriginReached);
                check_simplex = true;
                break;
            }

            let previous_squared_distance = squared_distance;
            squared_distance = new_axis.norm_squared();

            if previous_squared_distance - squared_distance
                <= DEFAULT_EPSILON * previous_squared_distance
            {
                self.degenerate_simplex = Some(DegenerateSimplex::NoDistanceDecrease);
                check_simplex = true;
                break;
            }

            self.cached_separating_axis = new_axis;

            self.cur_iter += 1;
            if self.cur_iter > self.options.max_iterations {
                log::debug!(
                    "GJK exceeded {} iterations, squared distance {}",
                    self.options.max_iterations,
                    squared_distance
                );
                self.degenerate_simplex = Some(DegenerateSimplex::MaxIterations);
                break;
            }

            if self.simplex_solver.full_simplex() {
                self.degenerate_simplex = Some(DegenerateSimplex::FullSimplex);
                break;
            }
        }

        if check_simplex {
            let (_, witness_b) = self.simplex_solver.compute_points();
            point_on_b = witness_b;
            normal_in_b = self.cached_separating_axis;

            let len_sq = self.cached_separating_axis.norm_squared();

            if len_sq < self.options.rel_error2 {
                self.degenerate_simplex = Some(DegenerateSimplex::SmallSeparatingAxis);
            }

            if len_sq > DEFAULT_EPSILON * DEFAULT_EPSILON {
                let len = len_sq.sqrt();
                normal_in_b /= len;
                let s = squared_distance.sqrt();
                debug_assert!(s > 0.0);
                point_on_b += self.cached_separating_axis * (margin_b / s);
                distance = len - margin;
                is_valid = true;
                self.last_used_method = Some(ClosestPointsMethod::Gjk);
            } else {
                self.last_used_method = Some(ClosestPointsMethod::GjkSmallAxis);
            }
        }

        let catch_degenerate_penetration_case = self.catch_degeneracies
            && self.penetration_solver.is_some()
            && self.degenerate_simplex.is_some()
            && (distance + margin) < self.options.penetration_tolerance;

        if !is_valid || catch_degenerate_penetration_case {
            if let Some(solver) = self.penetration_solver {
                if self.degenerate_simplex.is_some() {
                    log::debug!(
                        "GJK degenerate simplex {:?}, falling back to the penetration solver",
                        self.degenerate_simplex
                    );
                }

                self.cached_separating_axis = Vector::zeros();
                let depth = solver.calc_pen_depth(
                    &mut *self.simplex_solver,
                    self.shape_a,
                    self.shape_b,
                    &local_transform_a,
                    &local_transform_b,
                );

                match depth {
                    Some(PenetrationDepth::Penetrating {
                        axis,
                        witness_a,
                        witness_b,
                    }) => {
                        self.cached_separating_axis = axis;
                        let mut tmp_normal_in_b = witness_b - witness_a;
                        let mut len_sq = tmp_normal_in_b.norm_squared();

                        if len_sq <= DEFAULT_EPSILON * DEFAULT_EPSILON {
                            tmp_normal_in_b = axis;
                            len_sq = axis.norm_squared();
                        }

                        if len_sq > DEFAULT_EPSILON * DEFAULT_EPSILON {
                            tmp_normal_in_b /= len_sq.sqrt();
                            let distance2 = -(witness_a - witness_b).norm();
                            self.last_used_method = Some(ClosestPointsMethod::Penetration);

                            if !is_valid || distance2 < distance {
                                distance = distance2;
                                point_on_b = witness_b;
                                normal_in_b = tmp_normal_in_b;
                                is_valid = true;
                            } else {
                                self.last_used_method =
                                    Some(ClosestPointsMethod::PenetrationRejected);
                            }
                        } else {
                            self.last_used_method =
                                Some(ClosestPointsMethod::PenetrationDegenerateNormal);
                        }
                    }
                    Some(PenetrationDepth::Separated {
                        axis,
                        witness_a,
                        witness_b,
                    }) => {
                        self.cached_separating_axis = axis;

                        if let Some(axis_dir) = axis.try_normalize(0.0) {
                            let distance2 = (witness_a - witness_b).norm() - margin;

                            if !is_valid || distance2 < distance {
                                distance = distance2;
                                point_on_b = witness_b + axis * margin_b;
                                normal_in_b = axis_dir;
                                is_valid = true;
                                self.last_used_method =
                                    Some(ClosestPointsMethod::PenetrationSeparated);
                            } else {
                                self.last_used_method =
                                    Some(ClosestPointsMethod::PenetrationSeparatedRejected);
                            }
                        }
                    }
                    None => {}
                }
            }
        }

        if is_valid && (distance < 0.0 || distance * distance < input.maximum_distance_squared) {
            self.cached_separating_axis = normal_in_b;
            self.cached_separating_distance = distance;

            self.correct_normal_sign(
                &mut normal_in_b,
                &mut distance,
                &org_normal_in_b,
                margin,
                &local_transform_a,
                &local_transform_b,
            );

            if self.fix_contact_normal_direction {
                let (mins_a, maxs_a) = self.shape_a.local_aabb();
                let (mins_b, maxs_b) = self.shape_b.local_aabb();
                let center_a = local_transform_a * na::center(&mins_a, &maxs_a);
                let center_b = local_transform_b * na::center(&mins_b, &maxs_b);

                if (center_a - center_b).dot(&normal_in_b) < 0.0 {
                    normal_in_b = -normal_in_b;
                }
            }

            output.add_contact_point(
                &normal_in_b,
                &(point_on_b + position_offset),
                distance,
            );
        }
    }

    /// Re-evaluates the separation along the reported normal, its opposite, and
    /// the axis known before the query, and keeps the most plausible one.
    ///
    /// The penetration solver occasionally reports a normal opposite to the
    /// segment joining its witnesses. This pass detects and reverts it; it is
    /// an empirical correction, not a part of GJK itself.
    fn correct_normal_sign(
        &mut self,
        normal_in_b: &mut Vector<Real>,
        distance: &mut Real,
        org_normal_in_b: &Vector<Real>,
        margin: Real,
        transform_a: &Isometry<Real>,
        transform_b: &Isometry<Real>,
    ) {
        let separation = |axis: &Vector<Real>| {
            let (w, _, _) = self.support(axis, transform_a, transform_b);
            axis.dot(&w) - margin
        };

        let d0 = separation(normal_in_b);
        let d1 = separation(&-*normal_in_b);
        let d2 = if org_normal_in_b.norm_squared() > 0.0 {
            Some(separation(org_normal_in_b))
        } else {
            None
        };

        if d1 > d0 {
            self.last_used_method = Some(ClosestPointsMethod::FlippedNormal);
            *normal_in_b = -*normal_in_b;
        }

        if let Some(d2) = d2 {
            if d2 > d0 && d2 > d1 && d2 > *distance {
                if let Some(org_normal) = org_normal_in_b.try_normalize(DEFAULT_EPSILON) {
                    *normal_in_b = org_normal;
                    *distance = d2;
                }
            }
        }
    }
}

impl DiscreteCollisionDetector for GjkPairDetector<'_> {
    fn get_closest_points(
        &mut self,
        input: &ClosestPointInput,
        output: &mut dyn ClosestPointsResult,
    ) {
        self.closest_points(input, output)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::query::penetration::GjkEpaPenetrationDepthSolver;
    use crate::query::PointCollector;

    #[test]
    fn separated_cores_stop_on_a_repeated_support_point() {
        let ball = ConvexShape::sphere(1.0);
        let mut simplex = VoronoiSimplexSolver::new();
        let mut detector = GjkPairDetector::new(&ball, &ball, &mut simplex, None);
        let input = ClosestPointInput::new(Isometry::translation(3.0, 0.0, 0.0), Isometry::identity());
        let mut output = PointCollector::default();

        detector.get_closest_points(&input, &mut output);

        // The cores are points: the second support point is the first one again.
        assert!(output.has_result);
        assert_relative_eq!(output.distance, 1.0, epsilon = 1.0e-5);
        assert_eq!(detector.last_used_method(), Some(ClosestPointsMethod::Gjk));
        assert_eq!(detector.degenerate_simplex(), Some(DegenerateSimplex::InSimplex));
        assert_eq!(detector.cur_iter(), 1);
        assert_relative_eq!(detector.cached_separating_distance(), 1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn overlapping_cores_fall_back_to_the_penetration_solver() {
        let cube = ConvexShape::cuboid(Vector::repeat(1.0));
        let solver = GjkEpaPenetrationDepthSolver::new();
        let mut simplex = VoronoiSimplexSolver::new();
        let mut detector = GjkPairDetector::new(&cube, &cube, &mut simplex, Some(&solver));
        let input = ClosestPointInput::new(Isometry::translation(1.5, 0.0, 0.0), Isometry::identity());
        let mut output = PointCollector::default();

        detector.get_closest_points(&input, &mut output);

        assert!(output.has_result);
        assert_relative_eq!(output.distance, -0.5, epsilon = 1.0e-2);
        assert_eq!(
            detector.last_used_method(),
            Some(ClosestPointsMethod::Penetration)
        );
        assert!(detector.degenerate_simplex().is_some());
    }

    #[test]
    fn overlapping_cores_without_penetration_solver() {
        let cube = ConvexShape::cuboid(Vector::repeat(1.0));
        let mut simplex = VoronoiSimplexSolver::new();
        let mut detector = GjkPairDetector::new(&cube, &cube, &mut simplex, None);
        let input = ClosestPointInput::new(Isometry::translation(0.5, 0.0, 0.0), Isometry::identity());
        let mut output = PointCollector::default();

        detector.get_closest_points(&input, &mut output);

        // GJK alone cannot measure a penetration of the cores.
        assert!(detector.degenerate_simplex().is_some());
        assert!(!output.has_result || output.distance > -0.1);
    }
}
