use impact3d::dynamics::{
    ConstraintSolver, ManifoldResult, PersistentManifold, RigidBody, RigidBodySet,
    SequentialImpulseConstraintSolver, SolverInfo,
};
use impact3d::math::{Isometry, Point, Vector};
use impact3d::query::ClosestPointsResult;

#[test]
fn fast_impacts_bounce() {
    let mut bodies = RigidBodySet::new();
    let mut ground = RigidBody::new_static(Isometry::identity());
    ground.restitution = 1.0;
    let ground = bodies.insert(ground);

    let mut ball = RigidBody::new_dynamic(
        Isometry::translation(0.0, 0.5, 0.0),
        1.0,
        Vector::repeat(0.1),
    );
    ball.restitution = 0.8;
    ball.set_linvel(Vector::new(0.0, -5.0, 0.0));
    let ball = bodies.insert(ball);

    let mut manifolds = vec![PersistentManifold::new(ball, ground)];
    {
        let (body_a, body_b) = (bodies.get(ball).unwrap(), bodies.get(ground).unwrap());
        let mut result = ManifoldResult::new(&mut manifolds[0], body_a, body_b);
        result.add_contact_point(&Vector::y(), &Point::origin(), 0.0);
    }

    let mut solver = SequentialImpulseConstraintSolver::new();
    let _ = solver.solve_group(&mut bodies, &mut manifolds, &mut [], &SolverInfo::default());

    let ball = bodies.get(ball).unwrap();
    assert_relative_eq!(ball.linvel().y, 4.0, epsilon = 1.0e-3);
    assert_relative_eq!(manifolds[0].points()[0].applied_impulse, 9.0, epsilon = 1.0e-3);
}

#[test]
fn slow_impacts_do_not_bounce() {
    let mut bodies = RigidBodySet::new();
    let mut ground = RigidBody::new_static(Isometry::identity());
    ground.restitution = 1.0;
    let ground = bodies.insert(ground);

    let mut ball = RigidBody::new_dynamic(
        Isometry::translation(0.0, 0.5, 0.0),
        1.0,
        Vector::repeat(0.1),
    );
    ball.restitution = 1.0;
    ball.set_linvel(Vector::new(0.0, -0.1, 0.0));
    let ball = bodies.insert(ball);

    let mut manifolds = vec![PersistentManifold::new(ball, ground)];
    {
        let (body_a, body_b) = (bodies.get(ball).unwrap(), bodies.get(ground).unwrap());
        let mut result = ManifoldResult::new(&mut manifolds[0], body_a, body_b);
        result.add_contact_point(&Vector::y(), &Point::origin(), 0.0);
    }

    let mut solver = SequentialImpulseConstraintSolver::new();
    let _ = solver.solve_group(&mut bodies, &mut manifolds, &mut [], &SolverInfo::default());

    assert_relative_eq!(bodies.get(ball).unwrap().linvel().y, 0.0, epsilon = 1.0e-4);
}
