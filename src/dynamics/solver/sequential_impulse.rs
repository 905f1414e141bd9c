use super::{
    ConstraintOrigin, ConstraintSolver, ConstraintSolverType, RowSolver, SolverBody,
    SolverConstraint, SolverInfo, SolverMode,
};
use crate::dynamics::joint::{JointRow, JointRows, RowContext};
use crate::dynamics::{
    ContactPointFlags, ManifoldPoint, PersistentManifold, RigidBody, RigidBodyHandle,
    RigidBodySet, TypedConstraint,
};
use crate::math::{Real, Vector, DEFAULT_EPSILON};
use crate::utils::plane_space;
use arrayvec::ArrayVec;

/// The upper bound of the normal impulse of a contact.
const MAX_CONTACT_IMPULSE: Real = 1.0e10;

/// Mutable access to two distinct solver bodies.
///
/// Returns `None` if both ids are the same, which only happens for rows
/// between two static bodies: such rows cannot change any velocity.
fn body_pair(
    bodies: &mut [SolverBody],
    a: usize,
    b: usize,
) -> Option<(&mut SolverBody, &mut SolverBody)> {
    if a < b {
        let (left, right) = bodies.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else if a > b {
        let (left, right) = bodies.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    } else {
        None
    }
}

fn resolve_generic(solver: RowSolver, bodies: &mut [SolverBody], c: &mut SolverConstraint) -> Real {
    match body_pair(bodies, c.solver_body_id_a, c.solver_body_id_b) {
        Some((a, b)) => solver.resolve_single_constraint_row_generic(a, b, c),
        None => 0.0,
    }
}

fn resolve_lower_limit(
    solver: RowSolver,
    bodies: &mut [SolverBody],
    c: &mut SolverConstraint,
) -> Real {
    match body_pair(bodies, c.solver_body_id_a, c.solver_body_id_b) {
        Some((a, b)) => solver.resolve_single_constraint_row_lower_limit(a, b, c),
        None => 0.0,
    }
}

fn resolve_split(solver: RowSolver, bodies: &mut [SolverBody], c: &mut SolverConstraint) -> Real {
    match body_pair(bodies, c.solver_body_id_a, c.solver_body_id_b) {
        Some((a, b)) => solver.resolve_split_penetration_impulse(a, b, c),
        None => 0.0,
    }
}

/// Solves a friction row, bounded by the impulse of its contact.
fn resolve_friction(
    solver: RowSolver,
    bodies: &mut [SolverBody],
    fc: &mut SolverConstraint,
    total_impulse: Real,
) -> Real {
    if total_impulse > 0.0 {
        fc.lower_limit = -(fc.friction * total_impulse);
        fc.upper_limit = fc.friction * total_impulse;
        resolve_generic(solver, bodies, fc)
    } else {
        0.0
    }
}

/// The angular velocity change of `body` per unit impulse along the angular Jacobian `axis`.
#[inline]
fn angular_component(body: &RigidBody, axis: &Vector<Real>) -> Vector<Real> {
    (body.inv_inertia_world() * axis).component_mul(body.angular_factor())
}

/// The relative velocity measured by a row, including the external forces of the step.
#[inline]
fn row_velocity(a: &SolverBody, b: &SolverBody, c: &SolverConstraint) -> Real {
    c.contact_normal1
        .dot(&(a.linear_velocity + a.external_force_impulse))
        + c.relpos1_cross_normal
            .dot(&(a.angular_velocity + a.external_torque_impulse))
        + c.contact_normal2
            .dot(&(b.linear_velocity + b.external_force_impulse))
        + c.relpos2_cross_normal
            .dot(&(b.angular_velocity + b.external_torque_impulse))
}

/// A constraint solver applying sequential impulses (projected Gauss-Seidel)
/// to contacts, friction and joints.
///
/// Each call to [`ConstraintSolver::solve_group`] rebuilds its working pools
/// from the bodies, manifolds and joints, iterates on them, and writes the
/// resulting velocities and impulses back. Forces accumulated on the bodies
/// are applied during the solve; the caller clears them afterwards.
#[derive(Clone, Debug)]
pub struct SequentialImpulseConstraintSolver {
    tmp_solver_body_pool: Vec<SolverBody>,
    tmp_solver_contact_constraint_pool: Vec<SolverConstraint>,
    tmp_solver_non_contact_constraint_pool: Vec<SolverConstraint>,
    tmp_solver_contact_friction_constraint_pool: Vec<SolverConstraint>,
    tmp_solver_contact_rolling_friction_constraint_pool: Vec<SolverConstraint>,
    order_tmp_constraint_pool: Vec<usize>,
    order_non_contact_constraint_pool: Vec<usize>,
    order_friction_constraint_pool: Vec<usize>,
    solver_body_ids: Vec<Option<usize>>,
    fixed_body_id: Option<usize>,
    max_override_num_solver_iterations: usize,
    least_squares_residual: Real,
    seed: u32,
    row_solver: RowSolver,
}

impl Default for SequentialImpulseConstraintSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialImpulseConstraintSolver {
    /// A solver using the row solver best suited to the target hardware.
    pub fn new() -> Self {
        Self::with_row_solver(RowSolver::detect())
    }

    /// A solver using the given row solver whenever [`SolverMode::SIMD`] is set.
    pub fn with_row_solver(row_solver: RowSolver) -> Self {
        Self {
            tmp_solver_body_pool: Vec::new(),
            tmp_solver_contact_constraint_pool: Vec::new(),
            tmp_solver_non_contact_constraint_pool: Vec::new(),
            tmp_solver_contact_friction_constraint_pool: Vec::new(),
            tmp_solver_contact_rolling_friction_constraint_pool: Vec::new(),
            order_tmp_constraint_pool: Vec::new(),
            order_non_contact_constraint_pool: Vec::new(),
            order_friction_constraint_pool: Vec::new(),
            solver_body_ids: Vec::new(),
            fixed_body_id: None,
            max_override_num_solver_iterations: 0,
            least_squares_residual: 0.0,
            seed: 0,
            row_solver,
        }
    }

    /// The row solver used when [`SolverMode::SIMD`] is set.
    #[inline]
    pub fn row_solver(&self) -> RowSolver {
        self.row_solver
    }

    /// Sets the row solver used when [`SolverMode::SIMD`] is set.
    #[inline]
    pub fn set_row_solver(&mut self, row_solver: RowSolver) {
        self.row_solver = row_solver;
    }

    /// Seeds the generator shuffling the constraint order.
    #[inline]
    pub fn set_rand_seed(&mut self, seed: u32) {
        self.seed = seed;
    }

    /// The current state of the generator shuffling the constraint order.
    #[inline]
    pub fn rand_seed(&self) -> u32 {
        self.seed
    }

    /// The largest squared residual of the last iteration of the last solve.
    #[inline]
    pub fn least_squares_residual(&self) -> Real {
        self.least_squares_residual
    }

    /// The next value of the linear congruential generator.
    pub fn rand2(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(1664525).wrapping_add(1013904223);
        self.seed
    }

    /// A pseudo-random integer in `[0, n)`; `n` must not be zero.
    ///
    /// The high bits of the generator are folded onto the low bits before
    /// taking the modulo, since the low bits of a linear congruential
    /// generator have short periods.
    pub fn rand_int2(&mut self, n: usize) -> usize {
        let un = n as u32;
        let mut r = self.rand2();

        if un <= 0x0001_0000 {
            r ^= r >> 16;
            if un <= 0x0000_0100 {
                r ^= r >> 8;
                if un <= 0x0000_0010 {
                    r ^= r >> 4;
                    if un <= 0x0000_0004 {
                        r ^= r >> 2;
                        if un <= 0x0000_0002 {
                            r ^= r >> 1;
                        }
                    }
                }
            }
        }

        (r % un) as usize
    }

    /// The bounce velocity of a contact approaching at `rel_vel`.
    ///
    /// Slow approaches, below `velocity_threshold`, never bounce.
    pub fn restitution_curve(rel_vel: Real, restitution: Real, velocity_threshold: Real) -> Real {
        if rel_vel.abs() < velocity_threshold {
            0.0
        } else {
            restitution * -rel_vel
        }
    }

    fn get_or_init_solver_body(
        &mut self,
        handle: RigidBodyHandle,
        body: &RigidBody,
        dt: Real,
    ) -> usize {
        if body.is_dynamic() {
            if let Some(id) = self.solver_body_ids.get(handle.index()).copied().flatten() {
                return id;
            }

            let id = self.tmp_solver_body_pool.len();
            self.tmp_solver_body_pool
                .push(SolverBody::from_rigid_body(handle, body, dt));
            if let Some(slot) = self.solver_body_ids.get_mut(handle.index()) {
                *slot = Some(id);
            }
            id
        } else {
            match self.fixed_body_id {
                Some(id) => id,
                None => {
                    let id = self.tmp_solver_body_pool.len();
                    self.tmp_solver_body_pool.push(SolverBody::fixed());
                    self.fixed_body_id = Some(id);
                    id
                }
            }
        }
    }

    fn convert_bodies(&mut self, bodies: &RigidBodySet, info: &SolverInfo) {
        self.tmp_solver_body_pool.clear();
        self.solver_body_ids.clear();
        self.solver_body_ids.resize(bodies.slot_capacity(), None);
        self.fixed_body_id = None;

        for (handle, body) in bodies.iter() {
            let _ = self.get_or_init_solver_body(handle, body, info.time_step);
        }
    }

    fn convert_joints(
        &mut self,
        bodies: &RigidBodySet,
        constraints: &mut [TypedConstraint],
        info: &SolverInfo,
    ) {
        let ctx = RowContext {
            fps: 1.0 / info.time_step,
            erp: info.erp,
            cfm: info.global_cfm,
            num_iterations: info.num_iterations,
        };
        let mut rows = JointRows::new();

        for (index, constraint) in constraints.iter_mut().enumerate() {
            constraint.reset_feedback();

            if !constraint.is_enabled() {
                continue;
            }

            let (Some(body_a), Some(body_b)) =
                (bodies.get(constraint.body_a()), bodies.get(constraint.body_b()))
            else {
                log::debug!("Skipping a joint attached to a removed rigid-body.");
                continue;
            };

            if let Some(n) = constraint.override_num_solver_iterations {
                self.max_override_num_solver_iterations =
                    self.max_override_num_solver_iterations.max(n);
            }

            rows.clear();
            constraint.append_rows(body_a, body_b, &ctx, &mut rows);

            let id_a = self.get_or_init_solver_body(constraint.body_a(), body_a, info.time_step);
            let id_b = self.get_or_init_solver_body(constraint.body_b(), body_b, info.time_step);
            let num_iterations = constraint
                .override_num_solver_iterations
                .unwrap_or(info.num_iterations);
            let threshold = constraint.breaking_impulse_threshold;

            for row in &rows {
                let mut c = self.joint_row_constraint(row, id_a, id_b, body_a, body_b, info);
                c.upper_limit = c.upper_limit.min(threshold);
                c.lower_limit = c.lower_limit.max(-threshold);
                c.override_num_solver_iterations = num_iterations;
                c.origin = ConstraintOrigin::Joint(index);
                self.tmp_solver_non_contact_constraint_pool.push(c);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn joint_row_constraint(
        &self,
        row: &JointRow,
        id_a: usize,
        id_b: usize,
        body_a: &RigidBody,
        body_b: &RigidBody,
        info: &SolverInfo,
    ) -> SolverConstraint {
        let mut c = SolverConstraint {
            contact_normal1: row.j1_linear,
            relpos1_cross_normal: row.j1_angular,
            contact_normal2: row.j2_linear,
            relpos2_cross_normal: row.j2_angular,
            angular_component_a: angular_component(body_a, &row.j1_angular),
            angular_component_b: angular_component(body_b, &row.j2_angular),
            lower_limit: row.lower_limit,
            upper_limit: row.upper_limit,
            solver_body_id_a: id_a,
            solver_body_id_b: id_b,
            ..SolverConstraint::default()
        };

        let sum = row.j1_linear.norm_squared() * body_a.inv_mass()
            + (body_a.inv_inertia_world() * row.j1_angular).dot(&row.j1_angular)
            + row.j2_linear.norm_squared() * body_b.inv_mass()
            + (body_b.inv_inertia_world() * row.j2_angular).dot(&row.j2_angular);
        c.jac_diag_ab_inv = if sum.abs() > DEFAULT_EPSILON {
            1.0 / sum
        } else {
            0.0
        };

        let rel_vel = row_velocity(
            &self.tmp_solver_body_pool[id_a],
            &self.tmp_solver_body_pool[id_b],
            &c,
        );
        let velocity_error = -rel_vel * info.damping;
        c.rhs = row.rhs * c.jac_diag_ab_inv + velocity_error * c.jac_diag_ab_inv;
        c.cfm = row.cfm * c.jac_diag_ab_inv;
        c
    }

    fn convert_contacts(
        &mut self,
        bodies: &RigidBodySet,
        manifolds: &mut [PersistentManifold],
        info: &SolverInfo,
    ) {
        for (manifold_id, manifold) in manifolds.iter_mut().enumerate() {
            let (Some(body_a), Some(body_b)) =
                (bodies.get(manifold.body_a()), bodies.get(manifold.body_b()))
            else {
                continue;
            };

            // No response between two static bodies.
            if !body_a.is_dynamic() && !body_b.is_dynamic() {
                continue;
            }

            let id_a = self.get_or_init_solver_body(manifold.body_a(), body_a, info.time_step);
            let id_b = self.get_or_init_solver_body(manifold.body_b(), body_b, info.time_step);
            let threshold = manifold.contact_processing_threshold;

            for (point_id, cp) in manifold.points_mut().iter_mut().enumerate() {
                if cp.distance <= threshold {
                    let origin = ConstraintOrigin::Contact {
                        manifold: manifold_id,
                        point: point_id,
                    };
                    self.convert_contact(cp, origin, id_a, id_b, body_a, body_b, info);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_contact(
        &mut self,
        cp: &mut ManifoldPoint,
        origin: ConstraintOrigin,
        id_a: usize,
        id_b: usize,
        body_a: &RigidBody,
        body_b: &RigidBody,
        info: &SolverInfo,
    ) {
        let rel_pos1 = cp.position_world_on_a - body_a.center_of_mass();
        let rel_pos2 = cp.position_world_on_b - body_b.center_of_mass();
        let contact_index = self.tmp_solver_contact_constraint_pool.len();

        let mut c = self.setup_contact_constraint(cp, id_a, id_b, body_a, body_b, &rel_pos1, &rel_pos2, info);
        c.origin = origin;
        c.friction_index = self.tmp_solver_contact_friction_constraint_pool.len();
        self.tmp_solver_contact_constraint_pool.push(c);

        let mut torsional_axes = ArrayVec::<(Vector<Real>, Real), 3>::new();
        if cp.combined_spinning_friction > 0.0 {
            torsional_axes.push((cp.normal_world_on_b, cp.combined_spinning_friction));
        }
        if cp.combined_rolling_friction > 0.0 {
            let (axis0, axis1) = plane_space(&cp.normal_world_on_b);
            torsional_axes.push((axis0, cp.combined_rolling_friction));
            torsional_axes.push((axis1, cp.combined_rolling_friction));
        }
        for (axis, friction) in torsional_axes {
            let c = self.torsional_friction_constraint(&axis, friction, contact_index, id_a, id_b, body_a, body_b);
            self.tmp_solver_contact_rolling_friction_constraint_pool.push(c);
        }

        let mode = info.solver_mode;
        let two_directions = mode.contains(SolverMode::USE_2_FRICTION_DIRECTIONS);
        let vel = self.tmp_solver_body_pool[id_a].velocity_in_local_point_no_delta(&rel_pos1)
            - self.tmp_solver_body_pool[id_b].velocity_in_local_point_no_delta(&rel_pos2);
        let rel_vel = cp.normal_world_on_b.dot(&vel);

        let mut directions = ArrayVec::<Vector<Real>, 2>::new();

        if !mode.contains(SolverMode::ENABLE_FRICTION_DIRECTION_CACHING)
            || !cp.flags.contains(ContactPointFlags::LATERAL_FRICTION_INITIALIZED)
        {
            let lateral = vel - cp.normal_world_on_b * rel_vel;
            let lat_rel_vel = lateral.norm_squared();

            if !mode.contains(SolverMode::DISABLE_VELOCITY_DEPENDENT_FRICTION_DIRECTION)
                && lat_rel_vel > DEFAULT_EPSILON
            {
                cp.lateral_friction_dir1 = lateral / lat_rel_vel.sqrt();
                cp.lateral_friction_dir2 = cp
                    .lateral_friction_dir1
                    .cross(&cp.normal_world_on_b)
                    .normalize();
            } else {
                let (dir1, dir2) = plane_space(&cp.normal_world_on_b);
                cp.lateral_friction_dir1 = dir1;
                cp.lateral_friction_dir2 = dir2;

                if two_directions
                    && mode.contains(SolverMode::DISABLE_VELOCITY_DEPENDENT_FRICTION_DIRECTION)
                {
                    cp.flags.insert(ContactPointFlags::LATERAL_FRICTION_INITIALIZED);
                }
            }
        }

        directions.push(cp.lateral_friction_dir1);
        if two_directions {
            directions.push(cp.lateral_friction_dir2);
        }

        for dir in directions {
            let c = self.friction_constraint(&dir, cp, contact_index, id_a, id_b, body_a, body_b, &rel_pos1, &rel_pos2, info);
            self.tmp_solver_contact_friction_constraint_pool.push(c);
        }

        self.set_friction_constraint_impulse(contact_index, cp, info);
    }

    #[allow(clippy::too_many_arguments)]
    fn setup_contact_constraint(
        &mut self,
        cp: &ManifoldPoint,
        id_a: usize,
        id_b: usize,
        body_a: &RigidBody,
        body_b: &RigidBody,
        rel_pos1: &Vector<Real>,
        rel_pos2: &Vector<Real>,
        info: &SolverInfo,
    ) -> SolverConstraint {
        let normal = cp.normal_world_on_b;
        let inv_dt = 1.0 / info.time_step;
        let mut c = SolverConstraint {
            solver_body_id_a: id_a,
            solver_body_id_b: id_b,
            friction: cp.combined_friction,
            lower_limit: 0.0,
            upper_limit: MAX_CONTACT_IMPULSE,
            ..SolverConstraint::default()
        };

        let torque_axis0 = rel_pos1.cross(&normal);
        let torque_axis1 = rel_pos2.cross(&normal);
        let mut denom = 0.0;

        if body_a.is_dynamic() {
            c.contact_normal1 = normal;
            c.relpos1_cross_normal = torque_axis0;
            c.angular_component_a = angular_component(body_a, &torque_axis0);
            denom += body_a.inv_mass() + normal.dot(&c.angular_component_a.cross(rel_pos1));
        }

        if body_b.is_dynamic() {
            c.contact_normal2 = -normal;
            c.relpos2_cross_normal = -torque_axis1;
            c.angular_component_b = angular_component(body_b, &-torque_axis1);
            denom += body_b.inv_mass() + normal.dot(&(-c.angular_component_b).cross(rel_pos2));
        }

        c.jac_diag_ab_inv = info.sor / (denom + info.global_cfm);

        let (body_pool_a, body_pool_b) = (
            &self.tmp_solver_body_pool[id_a],
            &self.tmp_solver_body_pool[id_b],
        );
        let vel = body_pool_a.velocity_in_local_point_no_delta(rel_pos1)
            - body_pool_b.velocity_in_local_point_no_delta(rel_pos2);
        let approach_vel = normal.dot(&vel);
        let penetration = cp.distance + info.linear_slop;

        let restitution = if cp.lifetime > info.resting_contact_restitution_threshold {
            0.0
        } else {
            Self::restitution_curve(
                approach_vel,
                cp.combined_restitution,
                info.restitution_velocity_threshold,
            )
            .max(0.0)
        };

        if info.solver_mode.contains(SolverMode::USE_WARMSTARTING) {
            c.applied_impulse = cp.applied_impulse * info.warmstarting_factor;
            if let Some((a, b)) = body_pair(&mut self.tmp_solver_body_pool, id_a, id_b) {
                a.internal_apply_impulse(
                    &c.contact_normal1.component_mul(&a.inv_mass),
                    &c.angular_component_a,
                    c.applied_impulse,
                );
                b.internal_apply_impulse(
                    &c.contact_normal2.component_mul(&b.inv_mass),
                    &c.angular_component_b,
                    c.applied_impulse,
                );
            }
        }

        let rel_vel = row_velocity(
            &self.tmp_solver_body_pool[id_a],
            &self.tmp_solver_body_pool[id_b],
            &c,
        );

        let split = info.split_impulse && penetration <= info.split_impulse_penetration_threshold;
        let erp = if split { info.erp2 } else { info.erp };
        let mut velocity_error = restitution - rel_vel;
        let positional_error = if penetration > 0.0 {
            // Speculative contact: only remove the approach velocity that closes the gap.
            velocity_error -= penetration * inv_dt;
            0.0
        } else {
            -penetration * erp * inv_dt
        };

        let penetration_impulse = positional_error * c.jac_diag_ab_inv;
        let velocity_impulse = velocity_error * c.jac_diag_ab_inv;

        if split {
            c.rhs = velocity_impulse;
            c.rhs_penetration = penetration_impulse;
        } else {
            c.rhs = penetration_impulse + velocity_impulse;
            c.rhs_penetration = 0.0;
        }

        c.cfm = info.global_cfm * c.jac_diag_ab_inv;
        c
    }

    #[allow(clippy::too_many_arguments)]
    fn friction_constraint(
        &self,
        axis: &Vector<Real>,
        cp: &ManifoldPoint,
        contact_index: usize,
        id_a: usize,
        id_b: usize,
        body_a: &RigidBody,
        body_b: &RigidBody,
        rel_pos1: &Vector<Real>,
        rel_pos2: &Vector<Real>,
        info: &SolverInfo,
    ) -> SolverConstraint {
        let mut c = SolverConstraint {
            contact_normal1: *axis,
            contact_normal2: -axis,
            solver_body_id_a: id_a,
            solver_body_id_b: id_b,
            friction: cp.combined_friction,
            friction_index: contact_index,
            lower_limit: -cp.combined_friction,
            upper_limit: cp.combined_friction,
            ..SolverConstraint::default()
        };

        let mut denom = 0.0;

        if body_a.is_dynamic() {
            c.relpos1_cross_normal = rel_pos1.cross(&c.contact_normal1);
            c.angular_component_a = angular_component(body_a, &c.relpos1_cross_normal);
            denom += body_a.inv_mass() + axis.dot(&c.angular_component_a.cross(rel_pos1));
        }

        if body_b.is_dynamic() {
            c.relpos2_cross_normal = rel_pos2.cross(&c.contact_normal2);
            c.angular_component_b = angular_component(body_b, &c.relpos2_cross_normal);
            denom += body_b.inv_mass() + axis.dot(&(-c.angular_component_b).cross(rel_pos2));
        }

        c.jac_diag_ab_inv = info.sor / denom;

        let rel_vel = row_velocity(
            &self.tmp_solver_body_pool[id_a],
            &self.tmp_solver_body_pool[id_b],
            &c,
        );
        c.rhs = -rel_vel * c.jac_diag_ab_inv;
        c
    }

    #[allow(clippy::too_many_arguments)]
    fn torsional_friction_constraint(
        &self,
        axis: &Vector<Real>,
        friction: Real,
        contact_index: usize,
        id_a: usize,
        id_b: usize,
        body_a: &RigidBody,
        body_b: &RigidBody,
    ) -> SolverConstraint {
        let mut c = SolverConstraint {
            relpos1_cross_normal: -axis,
            relpos2_cross_normal: *axis,
            angular_component_a: angular_component(body_a, &-axis),
            angular_component_b: angular_component(body_b, axis),
            solver_body_id_a: id_a,
            solver_body_id_b: id_b,
            friction,
            friction_index: contact_index,
            lower_limit: -friction,
            upper_limit: friction,
            ..SolverConstraint::default()
        };

        let sum = (body_a.inv_inertia_world() * c.relpos1_cross_normal).dot(&c.relpos1_cross_normal)
            + (body_b.inv_inertia_world() * c.relpos2_cross_normal).dot(&c.relpos2_cross_normal);
        c.jac_diag_ab_inv = if sum > 0.0 { 1.0 / sum } else { 0.0 };

        let rel_vel = row_velocity(
            &self.tmp_solver_body_pool[id_a],
            &self.tmp_solver_body_pool[id_b],
            &c,
        );
        c.rhs = -rel_vel * c.jac_diag_ab_inv;
        c
    }

    fn set_friction_constraint_impulse(
        &mut self,
        contact_index: usize,
        cp: &ManifoldPoint,
        info: &SolverInfo,
    ) {
        let warmstarting = info.solver_mode.contains(SolverMode::USE_WARMSTARTING);
        let first = self.tmp_solver_contact_constraint_pool[contact_index].friction_index;
        let cached = [cp.applied_impulse_lateral1, cp.applied_impulse_lateral2];
        let end = self.tmp_solver_contact_friction_constraint_pool.len();

        for (fc, cached) in self.tmp_solver_contact_friction_constraint_pool[first..end]
            .iter_mut()
            .zip(cached.iter())
        {
            if !warmstarting {
                fc.applied_impulse = 0.0;
                continue;
            }

            fc.applied_impulse = cached * info.warmstarting_factor;
            if let Some((a, b)) = body_pair(
                &mut self.tmp_solver_body_pool,
                fc.solver_body_id_a,
                fc.solver_body_id_b,
            ) {
                a.internal_apply_impulse(
                    &fc.contact_normal1.component_mul(&a.inv_mass),
                    &fc.angular_component_a,
                    fc.applied_impulse,
                );
                b.internal_apply_impulse(
                    &fc.contact_normal2.component_mul(&b.inv_mass),
                    &fc.angular_component_b,
                    fc.applied_impulse,
                );
            }
        }
    }

    fn solve_group_cache_friendly_setup(
        &mut self,
        bodies: &RigidBodySet,
        manifolds: &mut [PersistentManifold],
        constraints: &mut [TypedConstraint],
        info: &SolverInfo,
    ) {
        self.max_override_num_solver_iterations = 0;
        self.tmp_solver_contact_constraint_pool.clear();
        self.tmp_solver_non_contact_constraint_pool.clear();
        self.tmp_solver_contact_friction_constraint_pool.clear();
        self.tmp_solver_contact_rolling_friction_constraint_pool.clear();

        self.convert_bodies(bodies, info);
        self.convert_joints(bodies, constraints, info);
        self.convert_contacts(bodies, manifolds, info);

        self.order_non_contact_constraint_pool.clear();
        self.order_non_contact_constraint_pool
            .extend(0..self.tmp_solver_non_contact_constraint_pool.len());
        self.order_tmp_constraint_pool.clear();
        self.order_tmp_constraint_pool
            .extend(0..self.tmp_solver_contact_constraint_pool.len());
        self.order_friction_constraint_pool.clear();
        self.order_friction_constraint_pool
            .extend(0..self.tmp_solver_contact_friction_constraint_pool.len());
    }

    fn shuffle(&mut self, order: &mut [usize]) {
        for j in 0..order.len() {
            let swapi = self.rand_int2(j + 1);
            order.swap(j, swapi);
        }
    }

    fn solve_single_iteration(
        &mut self,
        iteration: usize,
        info: &SolverInfo,
        row_solver: RowSolver,
    ) -> Real {
        let mut least_squares_residual: Real = 0.0;
        let contact_iteration = iteration < info.num_iterations;

        if info.solver_mode.contains(SolverMode::RANDOMIZE_ORDER) && iteration & 7 == 0 {
            let mut order = std::mem::take(&mut self.order_non_contact_constraint_pool);
            self.shuffle(&mut order);
            self.order_non_contact_constraint_pool = order;

            if contact_iteration {
                let mut order = std::mem::take(&mut self.order_tmp_constraint_pool);
                self.shuffle(&mut order);
                self.order_tmp_constraint_pool = order;

                let mut order = std::mem::take(&mut self.order_friction_constraint_pool);
                self.shuffle(&mut order);
                self.order_friction_constraint_pool = order;
            }
        }

        let bodies = &mut self.tmp_solver_body_pool;

        for &j in &self.order_non_contact_constraint_pool {
            let c = &mut self.tmp_solver_non_contact_constraint_pool[j];
            if iteration < c.override_num_solver_iterations {
                let residual = resolve_generic(row_solver, bodies, c);
                least_squares_residual = least_squares_residual.max(residual * residual);
            }
        }

        if !contact_iteration {
            return least_squares_residual;
        }

        let contacts = &mut self.tmp_solver_contact_constraint_pool;
        let frictions = &mut self.tmp_solver_contact_friction_constraint_pool;

        if info
            .solver_mode
            .contains(SolverMode::INTERLEAVE_CONTACT_AND_FRICTION_CONSTRAINTS)
        {
            let num_frictions = if info
                .solver_mode
                .contains(SolverMode::USE_2_FRICTION_DIRECTIONS)
            {
                2
            } else {
                1
            };

            for &j in &self.order_tmp_constraint_pool {
                let c = &mut contacts[j];
                let residual = resolve_lower_limit(row_solver, bodies, c);
                least_squares_residual = least_squares_residual.max(residual * residual);
                let total_impulse = c.applied_impulse;
                let first = c.friction_index;

                for fc in frictions.iter_mut().skip(first).take(num_frictions) {
                    let residual = resolve_friction(row_solver, bodies, fc, total_impulse);
                    least_squares_residual = least_squares_residual.max(residual * residual);
                }
            }
        } else {
            for &j in &self.order_tmp_constraint_pool {
                let residual = resolve_lower_limit(row_solver, bodies, &mut contacts[j]);
                least_squares_residual = least_squares_residual.max(residual * residual);
            }

            for &j in &self.order_friction_constraint_pool {
                let fc = &mut frictions[j];
                let total_impulse = contacts[fc.friction_index].applied_impulse;
                let residual = resolve_friction(row_solver, bodies, fc, total_impulse);
                least_squares_residual = least_squares_residual.max(residual * residual);
            }
        }

        for rc in &mut self.tmp_solver_contact_rolling_friction_constraint_pool {
            let total_impulse = contacts[rc.friction_index].applied_impulse;
            if total_impulse > 0.0 {
                let magnitude = (rc.friction * total_impulse).min(rc.friction);
                rc.lower_limit = -magnitude;
                rc.upper_limit = magnitude;
                let residual = resolve_generic(row_solver, bodies, rc);
                least_squares_residual = least_squares_residual.max(residual * residual);
            }
        }

        least_squares_residual
    }

    fn solve_group_cache_friendly_split_impulse_iterations(
        &mut self,
        info: &SolverInfo,
        row_solver: RowSolver,
    ) {
        if !info.split_impulse {
            return;
        }

        for iteration in 0..info.num_iterations {
            let mut least_squares_residual: Real = 0.0;

            for &j in &self.order_tmp_constraint_pool {
                let residual = resolve_split(
                    row_solver,
                    &mut self.tmp_solver_body_pool,
                    &mut self.tmp_solver_contact_constraint_pool[j],
                );
                least_squares_residual = least_squares_residual.max(residual * residual);
            }

            if least_squares_residual <= info.least_squares_residual_threshold
                || iteration + 1 >= info.num_iterations
            {
                break;
            }
        }
    }

    fn solve_group_cache_friendly_iterations(&mut self, info: &SolverInfo, row_solver: RowSolver) {
        self.solve_group_cache_friendly_split_impulse_iterations(info, row_solver);

        let max_iterations = self
            .max_override_num_solver_iterations
            .max(info.num_iterations);

        for iteration in 0..max_iterations {
            self.least_squares_residual = self.solve_single_iteration(iteration, info, row_solver);

            if self.least_squares_residual <= info.least_squares_residual_threshold
                || iteration + 1 >= max_iterations
            {
                break;
            }
        }
    }

    fn write_back_contacts(&self, manifolds: &mut [PersistentManifold], info: &SolverInfo) {
        let two_directions = info
            .solver_mode
            .contains(SolverMode::USE_2_FRICTION_DIRECTIONS);
        let frictions = &self.tmp_solver_contact_friction_constraint_pool;

        for c in &self.tmp_solver_contact_constraint_pool {
            let ConstraintOrigin::Contact { manifold, point } = c.origin else {
                continue;
            };
            let Some(pt) = manifolds
                .get_mut(manifold)
                .and_then(|m| m.points_mut().get_mut(point))
            else {
                continue;
            };

            pt.applied_impulse = c.applied_impulse;
            if let Some(fc) = frictions.get(c.friction_index) {
                pt.applied_impulse_lateral1 = fc.applied_impulse;
            }
            if two_directions {
                if let Some(fc) = frictions.get(c.friction_index + 1) {
                    pt.applied_impulse_lateral2 = fc.applied_impulse;
                }
            }
        }
    }

    fn write_back_joints(&self, constraints: &mut [TypedConstraint], info: &SolverInfo) {
        let inv_dt = 1.0 / info.time_step;

        for c in &self.tmp_solver_non_contact_constraint_pool {
            let ConstraintOrigin::Joint(index) = c.origin else {
                continue;
            };
            let Some(constraint) = constraints.get_mut(index) else {
                continue;
            };

            let body_a = &self.tmp_solver_body_pool[c.solver_body_id_a];
            let body_b = &self.tmp_solver_body_pool[c.solver_body_id_b];

            if let Some(feedback) = constraint.feedback_mut() {
                let impulse = c.applied_impulse * inv_dt;
                feedback.applied_force_body_a +=
                    c.contact_normal1.component_mul(&body_a.linear_factor) * impulse;
                feedback.applied_force_body_b +=
                    c.contact_normal2.component_mul(&body_b.linear_factor) * impulse;
                feedback.applied_torque_body_a +=
                    c.relpos1_cross_normal.component_mul(&body_a.angular_factor) * impulse;
                feedback.applied_torque_body_b +=
                    c.relpos2_cross_normal.component_mul(&body_b.angular_factor) * impulse;
            }

            constraint.set_applied_impulse(c.applied_impulse);

            if constraint.is_enabled()
                && c.applied_impulse.abs() >= constraint.breaking_impulse_threshold
            {
                log::warn!(
                    "Joint {} broke: impulse {} reached its breaking threshold {}.",
                    index,
                    c.applied_impulse,
                    constraint.breaking_impulse_threshold
                );
                constraint.set_enabled(false);
            }
        }
    }

    fn write_back_bodies(&mut self, bodies: &mut RigidBodySet, info: &SolverInfo) {
        for solver_body in &mut self.tmp_solver_body_pool {
            let Some(handle) = solver_body.original_body else {
                continue;
            };

            if info.split_impulse {
                solver_body
                    .writeback_velocity_and_transform(info.time_step, info.split_impulse_turn_erp);
            } else {
                solver_body.writeback_velocity();
            }

            if let Some(body) = bodies.get_mut(handle) {
                body.set_linvel(solver_body.linear_velocity + solver_body.external_force_impulse);
                body.set_angvel(solver_body.angular_velocity + solver_body.external_torque_impulse);
                body.set_split_impulse_velocities(
                    solver_body.push_velocity,
                    solver_body.turn_velocity,
                );

                if info.split_impulse {
                    body.set_position(solver_body.world_transform);
                }
            }
        }
    }

    fn solve_group_cache_friendly_finish(
        &mut self,
        bodies: &mut RigidBodySet,
        manifolds: &mut [PersistentManifold],
        constraints: &mut [TypedConstraint],
        info: &SolverInfo,
    ) {
        self.write_back_contacts(manifolds, info);
        self.write_back_joints(constraints, info);
        self.write_back_bodies(bodies, info);

        self.tmp_solver_contact_constraint_pool.clear();
        self.tmp_solver_non_contact_constraint_pool.clear();
        self.tmp_solver_contact_friction_constraint_pool.clear();
        self.tmp_solver_contact_rolling_friction_constraint_pool.clear();
        self.tmp_solver_body_pool.clear();
    }
}

impl ConstraintSolver for SequentialImpulseConstraintSolver {
    fn solve_group(
        &mut self,
        bodies: &mut RigidBodySet,
        manifolds: &mut [PersistentManifold],
        constraints: &mut [TypedConstraint],
        info: &SolverInfo,
    ) -> Real {
        let row_solver = if info.solver_mode.contains(SolverMode::SIMD) {
            self.row_solver
        } else {
            RowSolver::Generic
        };

        self.solve_group_cache_friendly_setup(bodies, manifolds, constraints, info);
        self.solve_group_cache_friendly_iterations(info, row_solver);
        self.solve_group_cache_friendly_finish(bodies, manifolds, constraints, info);
        self.least_squares_residual
    }

    fn reset(&mut self) {
        self.seed = 0;
    }

    fn solver_type(&self) -> ConstraintSolverType {
        ConstraintSolverType::SequentialImpulse
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::{Point2PointJoint, RigidBody};
    use crate::math::{Isometry, Point};

    #[test]
    fn rand_int2_stays_in_range() {
        let mut solver = SequentialImpulseConstraintSolver::new();
        solver.set_rand_seed(42);
        for n in [1, 2, 3, 5, 17, 300, 70_000] {
            for _ in 0..100 {
                assert!(solver.rand_int2(n) < n);
            }
        }
    }

    #[test]
    fn rand2_is_reproducible() {
        let mut a = SequentialImpulseConstraintSolver::new();
        let mut b = SequentialImpulseConstraintSolver::new();
        a.set_rand_seed(7);
        b.set_rand_seed(7);
        let va: Vec<u32> = (0..10).map(|_| a.rand2()).collect();
        let vb: Vec<u32> = (0..10).map(|_| b.rand2()).collect();
        assert_eq!(va, vb);

        let mut expected = 7u32;
        for _ in 0..10 {
            expected = expected.wrapping_mul(1664525).wrapping_add(1013904223);
        }
        assert_eq!(a.rand_seed(), expected);

        a.reset();
        assert_eq!(a.rand_seed(), 0);
    }

    #[test]
    fn restitution_curve_ignores_slow_contacts() {
        assert_eq!(
            SequentialImpulseConstraintSolver::restitution_curve(-0.1, 0.5, 0.2),
            0.0
        );
        assert_relative_eq!(
            SequentialImpulseConstraintSolver::restitution_curve(-2.0, 0.5, 0.2),
            1.0
        );
    }

    #[test]
    fn resting_contact_stops_the_fall() {
        let mut bodies = RigidBodySet::new();
        let ground = bodies.insert(RigidBody::new_static(Isometry::identity()));
        let mut ball = RigidBody::new_dynamic(
            Isometry::translation(0.0, 1.0, 0.0),
            1.0,
            Vector::repeat(0.4),
        );
        ball.set_linvel(Vector::new(0.0, -1.0, 0.0));
        let ball = bodies.insert(ball);

        let mut manifold = PersistentManifold::new(ball, ground);
        let mut pt = ManifoldPoint::new(Point::new(0.0, -1.0, 0.0), Point::origin(), Vector::y(), 0.0);
        pt.position_world_on_a = Point::origin();
        pt.position_world_on_b = Point::origin();
        let _ = manifold.add_manifold_point(pt);
        let mut manifolds = [manifold];

        let mut solver = SequentialImpulseConstraintSolver::new();
        let info = SolverInfo::default();
        let _ = solver.solve_group(&mut bodies, &mut manifolds, &mut [], &info);

        let ball = bodies.get(ball).unwrap();
        assert!(ball.linvel().y.abs() < 1.0e-3);
        assert!(manifolds[0].points()[0].applied_impulse > 0.0);
    }

    #[test]
    fn ball_joint_keeps_pivots_together() {
        let mut bodies = RigidBodySet::new();
        let mut body = RigidBody::new_dynamic(
            Isometry::translation(1.0, 0.0, 0.0),
            1.0,
            Vector::repeat(1.0),
        );
        body.set_linvel(Vector::new(0.0, -3.0, 0.0));
        let body = bodies.insert(body);

        let joint = Point2PointJoint::new(Point::new(-1.0, 0.0, 0.0), Point::origin());
        let mut joints = [TypedConstraint::new(&bodies, body, None, joint).unwrap()];
        joints[0].enable_feedback(true);

        let mut solver = SequentialImpulseConstraintSolver::new();
        let info = SolverInfo {
            num_iterations: 50,
            ..SolverInfo::default()
        };
        let _ = solver.solve_group(&mut bodies, &mut [], &mut joints, &info);

        // The pivot velocity vanishes: the body only spins around the anchor.
        let body = bodies.get(body).unwrap();
        let pivot_vel = body.velocity_in_local_point(&Vector::new(-1.0, 0.0, 0.0));
        assert!(pivot_vel.norm() < 1.0e-3);
        assert!(body.angvel().z.abs() > 0.1);

        let feedback = joints[0].joint_feedback().unwrap();
        assert!(feedback.applied_force_body_a.y > 0.0);
    }
}
