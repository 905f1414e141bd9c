use impact3d::math::{Isometry, Point, Vector};
use impact3d::query::gjk::{GjkPairDetector, VoronoiSimplexSolver};
use impact3d::query::gjk_epa::{self, GjkEpaResult};
use impact3d::query::penetration::GjkEpaPenetrationDepthSolver;
use impact3d::query::{ClosestPointInput, DiscreteCollisionDetector, PointCollector};
use impact3d::shape::ConvexShape;

#[test]
fn overlapping_spheres() {
    let ball = ConvexShape::sphere(1.0);
    let pos_a = Isometry::translation(0.0, 1.5, 0.0);
    let pos_b = Isometry::identity();

    let result = gjk_epa::calc_penetration_depth(&ball, &pos_a, &ball, &pos_b)
        .expect("The spheres overlap.");
    assert_relative_eq!(result.distance, -0.5, epsilon = 0.05);
    assert_relative_eq!(result.normal, Vector::y(), epsilon = 0.05);

    let solver = GjkEpaPenetrationDepthSolver::new();
    let mut simplex = VoronoiSimplexSolver::new();
    let mut detector = GjkPairDetector::new(&ball, &ball, &mut simplex, Some(&solver));
    let mut output = PointCollector::default();
    detector.get_closest_points(&ClosestPointInput::new(pos_a, pos_b), &mut output);

    // The cores of the spheres are points: GJK alone resolves the penetration.
    assert!(output.has_result);
    assert_relative_eq!(output.distance, -0.5, epsilon = 1.0e-4);
    assert_relative_eq!(output.normal_on_b_in_world, Vector::y(), epsilon = 1.0e-4);
}

#[test]
fn signed_distance_to_a_point() {
    let ball = ConvexShape::sphere(1.0);
    let pos = Isometry::identity();
    let mut result = GjkEpaResult::default();

    let outside = gjk_epa::signed_distance_to_point(&Point::new(3.0, 0.0, 0.0), 0.0, &ball, &pos, &mut result);
    assert_relative_eq!(outside, 2.0, epsilon = 1.0e-3);

    let cube = ConvexShape::cuboid(Vector::repeat(1.0));
    let inside = gjk_epa::signed_distance_to_point(&Point::new(0.0, 0.8, 0.0), 0.0, &cube, &pos, &mut result);
    assert!(inside < 0.0);
    assert_relative_eq!(inside, -0.2, epsilon = 0.05);
}

#[test]
fn point_on_the_core_surface_has_no_nan() {
    // The core of this box ends at 0.96: the core-to-point distance vanishes.
    let cube = ConvexShape::cuboid(Vector::repeat(1.0));
    let pos = Isometry::identity();
    let mut result = GjkEpaResult::default();

    let dist = gjk_epa::signed_distance_to_point(&Point::new(0.96, 0.0, 0.0), 0.0, &cube, &pos, &mut result);
    assert!(!dist.is_nan());
    assert!(result.normal.iter().all(|n| !n.is_nan()));
    assert!(result.witnesses.iter().all(|w| w.iter().all(|c| !c.is_nan())));
}
