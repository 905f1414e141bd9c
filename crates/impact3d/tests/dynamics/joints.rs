use impact3d::dynamics::{
    ConstraintSolver, HingeJoint, JointMotor, Point2PointJoint, RigidBody, RigidBodySet,
    SequentialImpulseConstraintSolver, SolverInfo, TypedConstraint,
};
use impact3d::math::{Isometry, Point, Vector};

fn pendulum(bodies: &mut RigidBodySet) -> (impact3d::dynamics::RigidBodyHandle, TypedConstraint) {
    let mut body = RigidBody::new_dynamic(
        Isometry::translation(1.0, 0.0, 0.0),
        1.0,
        Vector::repeat(1.0),
    );
    body.set_linvel(Vector::new(0.0, -3.0, 0.0));
    let body = bodies.insert(body);
    let joint = Point2PointJoint::new(Point::new(-1.0, 0.0, 0.0), Point::origin());
    let constraint = TypedConstraint::new(bodies, body, None, joint).unwrap();
    (body, constraint)
}

#[test]
fn pendulum_swings_around_its_pivot() {
    let mut bodies = RigidBodySet::new();
    let (body, constraint) = pendulum(&mut bodies);
    let mut constraints = [constraint];
    let mut solver = SequentialImpulseConstraintSolver::new();
    let info = SolverInfo::default();

    for _ in 0..60 {
        let b = bodies.get_mut(body).unwrap();
        b.apply_central_force(&Vector::new(0.0, -9.81, 0.0));
        let _ = solver.solve_group(&mut bodies, &mut [], &mut constraints, &info);
        let b = bodies.get_mut(body).unwrap();
        b.clear_forces();
        b.integrate_transform(info.time_step);
    }

    // The pivot stays at the world origin, and the body keeps its distance to it.
    let b = bodies.get(body).unwrap();
    let pivot = b.position() * Point::new(-1.0, 0.0, 0.0);
    assert!(pivot.coords.norm() < 0.05, "{:?}", pivot);
    assert_relative_eq!(b.position().translation.vector.norm(), 1.0, epsilon = 0.05);
    assert!(constraints[0].is_enabled());
}

#[test]
fn joints_break_above_their_threshold() {
    let mut bodies = RigidBodySet::new();
    let (body, mut constraint) = pendulum(&mut bodies);
    constraint.breaking_impulse_threshold = 0.1;
    let mut constraints = [constraint];
    let mut solver = SequentialImpulseConstraintSolver::new();
    let info = SolverInfo::default();

    let _ = solver.solve_group(&mut bodies, &mut [], &mut constraints, &info);
    assert!(!constraints[0].is_enabled());

    // A broken joint no longer constrains the body.
    let before = *bodies.get(body).unwrap().linvel();
    let _ = solver.solve_group(&mut bodies, &mut [], &mut constraints, &info);
    assert_eq!(*bodies.get(body).unwrap().linvel(), before);
}

#[test]
fn hinge_motor_reaches_its_target_velocity() {
    let mut bodies = RigidBodySet::new();
    let body = bodies.insert(RigidBody::new_dynamic(
        Isometry::identity(),
        1.0,
        Vector::repeat(1.0),
    ));

    let mut hinge = HingeJoint::from_pivots_and_axes(
        Point::origin(),
        Point::origin(),
        Vector::z(),
        Vector::z(),
    );
    hinge.motor = Some(JointMotor::new(2.0, 100.0));
    let mut constraints = [TypedConstraint::new(&bodies, body, None, hinge).unwrap()];

    let mut solver = SequentialImpulseConstraintSolver::new();
    let info = SolverInfo {
        num_iterations: 30,
        ..SolverInfo::default()
    };
    let _ = solver.solve_group(&mut bodies, &mut [], &mut constraints, &info);

    let angvel = *bodies.get(body).unwrap().angvel();
    assert_relative_eq!(angvel.z.abs(), 2.0, epsilon = 1.0e-2);
    assert_relative_eq!(angvel.x, 0.0, epsilon = 1.0e-3);
    assert_relative_eq!(angvel.y, 0.0, epsilon = 1.0e-3);
}

#[test]
fn overridden_iterations_still_converge() {
    let mut bodies = RigidBodySet::new();
    let (body, mut constraint) = pendulum(&mut bodies);
    constraint.override_num_solver_iterations = Some(40);
    let mut constraints = [constraint];
    let mut solver = SequentialImpulseConstraintSolver::new();
    let info = SolverInfo {
        num_iterations: 1,
        ..SolverInfo::default()
    };

    let _ = solver.solve_group(&mut bodies, &mut [], &mut constraints, &info);

    let b = bodies.get(body).unwrap();
    let pivot_vel = b.velocity_in_local_point(&Vector::new(-1.0, 0.0, 0.0));
    assert!(pivot_vel.norm() < 1.0e-3);
}
