use arrayvec::ArrayVec;

use crate::math::{Isometry, Point, Real, Vector, LARGE_FLOAT};
use crate::query::gjk::{GjkPairDetector, VoronoiSimplexSolver};
use crate::query::penetration::{ConvexPenetrationDepthSolver, PenetrationDepth};
use crate::query::{ClosestPointInput, DiscreteCollisionDetector, PointCollector};
use crate::shape::{ConvexShape, MAX_PREFERRED_PENETRATION_DIRECTIONS};
use crate::utils::{self, NUM_UNIT_SPHERE_POINTS};

const MAX_SAMPLE_DIRECTIONS: usize =
    NUM_UNIT_SPHERE_POINTS + 2 * MAX_PREFERRED_PENETRATION_DIRECTIONS;

/// Penetration depth estimation by sampling directions of the unit sphere.
///
/// The separation of both shapes is measured along a fixed set of directions,
/// plus the preferred penetration directions of each shape. The shapes are
/// then pulled apart along the direction of least penetration and a plain GJK
/// query measures the exact depth along it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MinkowskiPenetrationDepthSolver {
    /// Additional separation added before the refining GJK query.
    pub extra_separation: Real,
}

impl Default for MinkowskiPenetrationDepthSolver {
    fn default() -> Self {
        Self {
            extra_separation: 0.5,
        }
    }
}

impl MinkowskiPenetrationDepthSolver {
    /// Creates a new solver.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConvexPenetrationDepthSolver for MinkowskiPenetrationDepthSolver {
    fn calc_pen_depth(
        &self,
        simplex_solver: &mut VoronoiSimplexSolver,
        shape_a: &ConvexShape,
        shape_b: &ConvexShape,
        transform_a: &Isometry<Real>,
        transform_b: &Isometry<Real>,
    ) -> Option<PenetrationDepth> {
        let mut directions: ArrayVec<Vector<Real>, MAX_SAMPLE_DIRECTIONS> =
            utils::unit_sphere_directions().into_iter().collect();
        directions.extend(
            shape_a
                .preferred_penetration_directions()
                .into_iter()
                .map(|n| transform_a.rotation * n),
        );
        directions.extend(
            shape_b
                .preferred_penetration_directions()
                .into_iter()
                .map(|n| transform_b.rotation * n),
        );

        let axes_in_a: Vec<_> = directions
            .iter()
            .map(|n| transform_a.inverse_transform_vector(&-n))
            .collect();
        let axes_in_b: Vec<_> = directions
            .iter()
            .map(|n| transform_b.inverse_transform_vector(n))
            .collect();

        let mut supports_a = Vec::with_capacity(directions.len());
        let mut supports_b = Vec::with_capacity(directions.len());
        shape_a.batched_support_vertices_without_margin(&axes_in_a, &mut supports_a);
        shape_b.batched_support_vertices_without_margin(&axes_in_b, &mut supports_b);

        let mut min_proj = LARGE_FLOAT;
        let mut min_norm = Vector::zeros();

        for ((norm, p), q) in directions.iter().zip(&supports_a).zip(&supports_b) {
            let p_world: Point<Real> = transform_a * p;
            let q_world: Point<Real> = transform_b * q;
            let delta = norm.dot(&(q_world - p_world));

            if delta < min_proj {
                min_proj = delta;
                min_norm = *norm;
            }
        }

        if min_proj < 0.0 {
            return None;
        }

        min_proj += self.extra_separation + shape_a.margin() + shape_b.margin();

        // Pull the shapes apart and measure the separation exactly.
        let mut displaced_a = *transform_a;
        displaced_a.translation.vector += min_norm * min_proj;

        let input = ClosestPointInput {
            transform_a: displaced_a,
            transform_b: *transform_b,
            maximum_distance_squared: LARGE_FLOAT,
        };
        let mut collector = PointCollector::default();
        let mut detector = GjkPairDetector::new(shape_a, shape_b, simplex_solver, None);
        detector.set_cached_separating_axis(-min_norm);
        detector.get_closest_points(&input, &mut collector);

        if !collector.has_result {
            log::debug!("Minkowski sampling: the refining GJK query found no result");
            return None;
        }

        let corrected_depth = min_proj - collector.distance;
        let witness_b = collector.point_in_world;
        let witness_a = witness_b - min_norm * corrected_depth;

        Some(PenetrationDepth::Penetrating {
            axis: min_norm,
            witness_a,
            witness_b,
        })
    }
}
