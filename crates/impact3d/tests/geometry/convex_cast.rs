use impact3d::math::{Isometry, Real, Vector};
use impact3d::query::cast::{
    CastOptions, CastResult, ContinuousConvexCollision, ConvexCast, DebugDraw, GjkConvexCast,
    SubsimplexConvexCast,
};
use impact3d::query::gjk::VoronoiSimplexSolver;
use impact3d::query::penetration::GjkEpaPenetrationDepthSolver;
use impact3d::shape::{ConvexShape, Plane};

#[derive(Default)]
struct FractionRecorder {
    fractions: Vec<Real>,
    failures: Vec<(i32, usize)>,
}

impl DebugDraw for FractionRecorder {
    fn debug_draw(&mut self, fraction: Real) {
        self.fractions.push(fraction);
    }

    fn report_failure(&mut self, error: i32, num_iterations: usize) {
        self.failures.push((error, num_iterations));
    }
}

fn sweep() -> (Isometry<Real>, Isometry<Real>, Isometry<Real>) {
    // A moves along +x by 10 units, and hits B once their centers are 2 units apart.
    (
        Isometry::translation(-6.0, 0.0, 0.0),
        Isometry::translation(4.0, 0.0, 0.0),
        Isometry::identity(),
    )
}

#[test]
fn every_cast_finds_the_time_of_impact() {
    let ball = ConvexShape::sphere(1.0);
    let (from_a, to_a, pos_b) = sweep();
    let penetration_solver = GjkEpaPenetrationDepthSolver::new();

    let mut simplex1 = VoronoiSimplexSolver::new();
    let mut simplex2 = VoronoiSimplexSolver::new();
    let mut simplex3 = VoronoiSimplexSolver::new();
    let mut casts: Vec<Box<dyn ConvexCast + '_>> = Vec::new();
    casts.push(Box::new(SubsimplexConvexCast::new(&ball, &ball, &mut simplex1)));
    casts.push(Box::new(GjkConvexCast::new(&ball, &ball, &mut simplex2)));
    casts.push(Box::new(ContinuousConvexCollision::new(
        &ball,
        &ball,
        &mut simplex3,
        Some(&penetration_solver),
    )));

    for cast in &mut casts {
        let mut result = CastResult::default();
        assert!(cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));
        assert_relative_eq!(result.fraction, 0.4, epsilon = 1.0e-2);
        assert_relative_eq!(result.normal.x, -1.0, epsilon = 1.0e-2);
    }
}

#[test]
fn casts_miss_shapes_out_of_the_path() {
    let ball = ConvexShape::sphere(1.0);
    let from_a = Isometry::translation(-6.0, 3.0, 0.0);
    let to_a = Isometry::translation(4.0, 3.0, 0.0);
    let pos_b = Isometry::identity();

    let mut simplex = VoronoiSimplexSolver::new();
    let mut cast = SubsimplexConvexCast::new(&ball, &ball, &mut simplex);
    let mut result = CastResult::default();
    assert!(!cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));

    let mut simplex = VoronoiSimplexSolver::new();
    let mut cast = ContinuousConvexCollision::new(&ball, &ball, &mut simplex, None);
    let mut result = CastResult::default();
    assert!(!cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));
}

#[test]
fn conservative_advancement_is_monotonic() {
    let ball = ConvexShape::sphere(1.0);
    let (from_a, to_a, pos_b) = sweep();
    let mut recorder = FractionRecorder::default();

    {
        let mut simplex = VoronoiSimplexSolver::new();
        let mut cast = ContinuousConvexCollision::new(&ball, &ball, &mut simplex, None);
        let mut result = CastResult::default().with_debug_drawer(&mut recorder);
        assert!(cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));
    }

    assert!(!recorder.fractions.is_empty());
    assert!(recorder.fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!(recorder.fractions.iter().all(|f| *f >= 0.0 && *f <= 1.0));
}

#[test]
fn cast_against_a_plane() {
    let ball = ConvexShape::sphere(1.0);
    let ground = Plane::new(na::Vector3::y_axis(), 0.0);
    let from_a = Isometry::translation(0.0, 5.0, 0.0);
    let to_a = Isometry::translation(0.0, -5.0, 0.0);
    let pos_b = Isometry::identity();

    let mut simplex = VoronoiSimplexSolver::new();
    let mut cast = ContinuousConvexCollision::with_plane(&ball, &ground, &mut simplex);
    let mut result = CastResult::default();
    assert!(cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));
    assert_relative_eq!(result.fraction, 0.4, epsilon = 1.0e-2);
}

fn edge_grazing_sweep() -> (Isometry<Real>, Isometry<Real>, Isometry<Real>) {
    // A ball passing over the top edge of a box: the closest features are
    // never aligned with the motion, so advancement takes several steps.
    (
        Isometry::translation(-5.0, 1.3, 0.0),
        Isometry::translation(5.0, 1.3, 0.0),
        Isometry::identity(),
    )
}

#[test]
fn linear_casts_report_the_iteration_limit() {
    let ball = ConvexShape::sphere(0.5);
    let cube = ConvexShape::cuboid(Vector::repeat(1.0));
    let (from_a, to_a, pos_b) = edge_grazing_sweep();
    let options = CastOptions {
        max_iterations: 1,
        ..CastOptions::default()
    };

    let mut recorder = FractionRecorder::default();
    {
        let mut simplex = VoronoiSimplexSolver::new();
        let mut cast = SubsimplexConvexCast::new(&ball, &cube, &mut simplex);
        let mut result = CastResult::with_options(options).with_debug_drawer(&mut recorder);
        assert!(!cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));
    }
    assert!(matches!(recorder.failures.as_slice(), [(-2, _)]));

    let mut recorder = FractionRecorder::default();
    {
        let mut simplex = VoronoiSimplexSolver::new();
        let mut cast = GjkConvexCast::new(&ball, &cube, &mut simplex);
        let mut result = CastResult::with_options(options).with_debug_drawer(&mut recorder);
        assert!(!cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));
    }
    assert_eq!(recorder.failures, vec![(-2, 2)]);
    assert_eq!(recorder.fractions.len(), 1);

    // With the default limit, the same sweep hits the edge.
    let mut simplex = VoronoiSimplexSolver::new();
    let mut cast = GjkConvexCast::new(&ball, &cube, &mut simplex);
    let mut result = CastResult::default();
    assert!(cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));
    assert!(result.fraction > 0.3 && result.fraction < 0.4);
}

#[test]
fn continuous_cast_reports_the_iteration_limit() {
    let ball = ConvexShape::sphere(0.5);
    let cube = ConvexShape::cuboid(Vector::repeat(1.0));
    let (from_a, to_a, pos_b) = edge_grazing_sweep();
    let mut recorder = FractionRecorder::default();

    {
        let mut simplex = VoronoiSimplexSolver::new();
        let mut cast = ContinuousConvexCollision::new(&ball, &cube, &mut simplex, None);
        cast.max_iterations = 1;
        let mut result = CastResult::default().with_debug_drawer(&mut recorder);
        assert!(!cast.calc_time_of_impact(&from_a, &to_a, &pos_b, &pos_b, &mut result));
    }

    assert_eq!(recorder.failures, vec![(-2, 2)]);
}
