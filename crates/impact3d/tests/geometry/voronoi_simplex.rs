use impact3d::math::{Point, Real, Vector};
use impact3d::query::gjk::VoronoiSimplexSolver;

fn random_vector(rng: &mut oorandom::Rand64) -> Vector<Real> {
    Vector::new(
        rng.rand_float() as Real * 10.0 - 5.0,
        rng.rand_float() as Real * 10.0 - 5.0,
        rng.rand_float() as Real * 10.0 - 5.0,
    )
}

#[test]
fn closest_point_never_moves_away_from_the_origin() {
    let mut rng = oorandom::Rand64::new(0x5eed);

    for _ in 0..200 {
        let mut solver = VoronoiSimplexSolver::new();
        let mut prev_dist = Real::MAX;

        for _ in 0..4 {
            let w = random_vector(&mut rng);
            solver.add_vertex(w, Point::from(w), Point::origin());

            let Some(v) = solver.closest() else {
                break;
            };

            let dist = v.norm();
            assert!(dist <= w.norm() + 1.0e-3);
            assert!(dist <= prev_dist + 1.0e-3);
            assert!(solver.num_vertices() <= 4);
            assert!(solver.closest_result().is_valid());
            prev_dist = dist;
        }
    }
}

#[test]
fn closest_point_is_idempotent() {
    let mut rng = oorandom::Rand64::new(1234);

    for _ in 0..50 {
        let mut solver = VoronoiSimplexSolver::new();

        for _ in 0..3 {
            let w = random_vector(&mut rng);
            solver.add_vertex(w, Point::from(w), Point::origin());
        }

        if let Some(first) = solver.closest() {
            let num_vertices = solver.num_vertices();
            let second = solver.closest().expect("The reduced simplex must stay valid.");
            assert_relative_eq!(first, second, epsilon = 1.0e-4);
            assert_eq!(num_vertices, solver.num_vertices());
        }
    }
}

#[test]
fn origin_inside_tetrahedron() {
    let mut solver = VoronoiSimplexSolver::new();
    let vertices = [
        Vector::new(1.0, 1.0, 1.0),
        Vector::new(-1.0, -1.0, 1.0),
        Vector::new(-1.0, 1.0, -1.0),
        Vector::new(1.0, -1.0, -1.0),
    ];

    for w in vertices {
        solver.add_vertex(w, Point::from(w), Point::origin());
    }

    let v = solver.closest().expect("A regular tetrahedron is not degenerate.");
    assert_relative_eq!(v, Vector::zeros(), epsilon = 1.0e-5);
    assert_eq!(solver.num_vertices(), 4);
}

#[test]
fn reset_solver_matches_fresh_solver() {
    let mut rng = oorandom::Rand64::new(99);
    let points: Vec<_> = (0..4).map(|_| random_vector(&mut rng)).collect();

    let run = |solver: &mut VoronoiSimplexSolver| {
        let mut out = Vec::new();
        for w in &points {
            solver.add_vertex(*w, Point::from(*w), Point::origin());
            out.push(solver.closest());
            if solver.num_vertices() == 4 {
                break;
            }
        }
        out
    };

    let mut reused = VoronoiSimplexSolver::new();
    let _ = run(&mut reused);
    reused.reset();

    assert_eq!(run(&mut reused), run(&mut VoronoiSimplexSolver::new()));
}
