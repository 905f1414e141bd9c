use impact3d::dynamics::{
    ConstraintSolver, ManifoldResult, PersistentManifold, RigidBody, RigidBodyHandle,
    RigidBodySet, SequentialImpulseConstraintSolver, SolverInfo, SolverMode,
};
use impact3d::math::{Isometry, Point, Real, Vector};
use impact3d::query::ClosestPointsResult;

const HALF_EXTENT: Real = 0.5;
const GRAVITY: Real = -9.81;

struct Scene {
    bodies: RigidBodySet,
    ground: RigidBodyHandle,
    cube: RigidBodyHandle,
    manifolds: Vec<PersistentManifold>,
}

impl Scene {
    fn new() -> Self {
        let mut bodies = RigidBodySet::new();
        let ground = bodies.insert(RigidBody::new_static(Isometry::identity()));
        let inertia = 2.0 * HALF_EXTENT * HALF_EXTENT / 3.0;
        let cube = bodies.insert(RigidBody::new_dynamic(
            Isometry::translation(0.0, HALF_EXTENT, 0.0),
            1.0,
            Vector::repeat(inertia),
        ));
        let manifolds = vec![PersistentManifold::new(cube, ground)];

        Self {
            bodies,
            ground,
            cube,
            manifolds,
        }
    }

    /// Feeds the bottom corners of the cube to the manifold, as a narrow-phase would.
    fn update_contacts(&mut self) {
        let cube = self.bodies.get(self.cube).unwrap();
        let ground = self.bodies.get(self.ground).unwrap();
        let manifold = &mut self.manifolds[0];
        manifold.refresh_contact_points(cube.position(), ground.position());

        let mut result = ManifoldResult::new(manifold, cube, ground);
        for (x, z) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = cube.position() * Point::new(x * HALF_EXTENT, -HALF_EXTENT, z * HALF_EXTENT);
            let on_ground = Point::new(corner.x, 0.0, corner.z);
            result.add_contact_point(&Vector::y(), &on_ground, corner.y);
        }
    }

    fn step(&mut self, solver: &mut SequentialImpulseConstraintSolver, info: &SolverInfo) {
        self.update_contacts();

        let cube = self.bodies.get_mut(self.cube).unwrap();
        cube.apply_central_force(&Vector::new(0.0, GRAVITY, 0.0));

        let _ = solver.solve_group(&mut self.bodies, &mut self.manifolds, &mut [], info);

        let cube = self.bodies.get_mut(self.cube).unwrap();
        cube.clear_forces();
        cube.integrate_transform(info.time_step);
    }
}

#[test]
fn resting_cube_stays_on_the_ground() {
    let mut scene = Scene::new();
    let mut solver = SequentialImpulseConstraintSolver::new();
    let info = SolverInfo::default();

    for _ in 0..120 {
        scene.step(&mut solver, &info);
    }

    let cube = scene.bodies.get(scene.cube).unwrap();
    assert!(cube.linvel().norm() < 0.05, "{:?}", cube.linvel());
    assert!(cube.angvel().norm() < 0.05, "{:?}", cube.angvel());
    assert!((cube.position().translation.y - HALF_EXTENT).abs() < 0.05);
    assert_eq!(scene.manifolds[0].num_contacts(), 4);
    assert!(scene.manifolds[0].points().iter().all(|pt| pt.applied_impulse > 0.0));
}

#[test]
fn randomized_solves_are_reproducible() {
    let info = SolverInfo {
        solver_mode: SolverMode::default() | SolverMode::RANDOMIZE_ORDER,
        ..SolverInfo::default()
    };

    let run = || {
        let mut scene = Scene::new();
        let mut solver = SequentialImpulseConstraintSolver::new();
        solver.set_rand_seed(17);

        for _ in 0..30 {
            scene.step(&mut solver, &info);
        }

        let cube = scene.bodies.get(scene.cube).unwrap();
        (*cube.position(), *cube.linvel(), *cube.angvel(), solver.rand_seed())
    };

    assert_eq!(run(), run());
}

#[test]
fn both_row_solvers_give_the_same_motion() {
    use impact3d::dynamics::RowSolver;

    let info = SolverInfo::default();
    let run = |row_solver| {
        let mut scene = Scene::new();
        let mut solver = SequentialImpulseConstraintSolver::with_row_solver(row_solver);

        for _ in 0..30 {
            scene.step(&mut solver, &info);
        }

        *scene.bodies.get(scene.cube).unwrap().position()
    };

    let generic = run(RowSolver::Generic);
    let batched = run(RowSolver::Batched);
    assert_relative_eq!(generic, batched, epsilon = 1.0e-3);
}
