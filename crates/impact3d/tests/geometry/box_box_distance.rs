use impact3d::math::{Isometry, Vector};
use impact3d::query::gjk::{GjkPairDetector, VoronoiSimplexSolver};
use impact3d::query::gjk_epa::{self, GjkEpaResult, GjkEpaStatus};
use impact3d::query::penetration::{GjkEpaPenetrationDepthSolver, MinkowskiPenetrationDepthSolver};
use impact3d::query::{ClosestPointInput, DiscreteCollisionDetector, PointCollector};
use impact3d::shape::ConvexShape;

fn unit_box() -> ConvexShape {
    ConvexShape::cuboid(Vector::repeat(1.0))
}

#[test]
fn separated_boxes_gjk_epa() {
    let cube = unit_box();
    let pos_a = Isometry::translation(2.5, 0.0, 0.0);
    let pos_b = Isometry::identity();
    let mut result = GjkEpaResult::default();

    assert!(gjk_epa::distance(
        &cube,
        &pos_a,
        &cube,
        &pos_b,
        &Vector::x(),
        &mut result
    ));
    assert_eq!(result.status, GjkEpaStatus::Separated);
    assert_relative_eq!(result.distance, 0.5, epsilon = 1.0e-4);
    assert_relative_eq!(result.normal, Vector::x(), epsilon = 1.0e-4);
    assert_relative_eq!(result.witnesses[0].x, 1.5, epsilon = 1.0e-4);
    assert_relative_eq!(result.witnesses[1].x, 1.0, epsilon = 1.0e-4);
}

#[test]
fn overlapping_boxes_gjk_epa() {
    let cube = unit_box();
    let pos_a = Isometry::translation(1.5, 0.0, 0.0);
    let pos_b = Isometry::identity();

    let result = gjk_epa::calc_penetration_depth(&cube, &pos_a, &cube, &pos_b)
        .expect("The boxes overlap.");
    assert_eq!(result.status, GjkEpaStatus::Penetrating);
    assert_relative_eq!(result.distance, -0.5, epsilon = 1.0e-3);
    assert_relative_eq!(result.normal, Vector::x(), epsilon = 1.0e-3);

    // Separated shapes have no penetration.
    let far = Isometry::translation(5.0, 0.0, 0.0);
    assert!(gjk_epa::calc_penetration_depth(&cube, &far, &cube, &pos_b).is_none());
}

#[test]
fn separated_boxes_pair_detector() {
    let cube = unit_box();
    let mut simplex = VoronoiSimplexSolver::new();
    let mut detector = GjkPairDetector::new(&cube, &cube, &mut simplex, None);
    let input = ClosestPointInput::new(Isometry::translation(2.5, 0.0, 0.0), Isometry::identity());
    let mut output = PointCollector::default();

    detector.get_closest_points(&input, &mut output);

    assert!(output.has_result);
    assert_relative_eq!(output.distance, 0.5, epsilon = 1.0e-4);
    assert_relative_eq!(output.normal_on_b_in_world, Vector::x(), epsilon = 1.0e-4);
    assert_relative_eq!(output.point_in_world.x, 1.0, epsilon = 1.0e-4);
    assert_relative_eq!(output.point_on_a().x, 1.5, epsilon = 1.0e-4);
}

#[test]
fn overlapping_boxes_pair_detector() {
    let cube = unit_box();
    let input = ClosestPointInput::new(Isometry::translation(1.5, 0.0, 0.0), Isometry::identity());
    let gjk_epa_solver = GjkEpaPenetrationDepthSolver::new();
    let minkowski_solver = MinkowskiPenetrationDepthSolver::new();

    for solver in [
        &gjk_epa_solver as &dyn impact3d::query::penetration::ConvexPenetrationDepthSolver,
        &minkowski_solver,
    ] {
        let mut simplex = VoronoiSimplexSolver::new();
        let mut detector = GjkPairDetector::new(&cube, &cube, &mut simplex, Some(solver));
        let mut output = PointCollector::default();

        detector.get_closest_points(&input, &mut output);

        assert!(output.has_result);
        assert_relative_eq!(output.distance, -0.5, epsilon = 1.0e-2);
        assert_relative_eq!(output.normal_on_b_in_world, Vector::x(), epsilon = 1.0e-2);
    }
}

#[test]
fn maximum_distance_filters_far_pairs() {
    let cube = unit_box();
    let mut simplex = VoronoiSimplexSolver::new();
    let mut detector = GjkPairDetector::new(&cube, &cube, &mut simplex, None);
    let mut input = ClosestPointInput::new(Isometry::translation(10.0, 0.0, 0.0), Isometry::identity());
    input.maximum_distance_squared = 1.0;
    let mut output = PointCollector::default();

    detector.get_closest_points(&input, &mut output);
    assert!(!output.has_result);
}

#[test]
fn half_unit_boxes_from_separation_to_penetration() {
    let cube = ConvexShape::cuboid(Vector::repeat(0.5));
    let pos_a = Isometry::identity();
    let mut result = GjkEpaResult::default();

    assert!(gjk_epa::distance(
        &cube,
        &pos_a,
        &cube,
        &Isometry::translation(1.5, 0.0, 0.0),
        &Vector::x(),
        &mut result
    ));
    assert_relative_eq!(result.distance, 0.5, epsilon = 1.0e-4);

    let result = gjk_epa::calc_penetration_depth(
        &cube,
        &pos_a,
        &cube,
        &Isometry::translation(0.5, 0.0, 0.0),
    )
    .expect("The boxes overlap.");
    assert_eq!(result.status, GjkEpaStatus::Penetrating);
    assert_relative_eq!(result.distance, -0.5, epsilon = 1.0e-3);
}
