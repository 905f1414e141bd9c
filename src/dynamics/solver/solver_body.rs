use crate::dynamics::{RigidBody, RigidBodyHandle};
use crate::math::{Isometry, Matrix, Real, Vector};
use crate::utils::transform_util;

/// The working copy of a rigid body used during one solve.
///
/// Impulses only modify the delta velocities, and the split-impulse
/// push/turn velocities. They are written back to the rigid body once the
/// solve completes.
#[repr(C, align(16))]
#[derive(Clone, Debug, PartialEq)]
pub struct SolverBody {
    /// The pose of the body at the start of the solve.
    pub world_transform: Isometry<Real>,
    /// Linear velocity change accumulated by the solver.
    pub delta_linear_velocity: Vector<Real>,
    /// Angular velocity change accumulated by the solver.
    pub delta_angular_velocity: Vector<Real>,
    /// The body's angular factor.
    pub angular_factor: Vector<Real>,
    /// The body's linear factor.
    pub linear_factor: Vector<Real>,
    /// The inverse mass, scaled by the linear factor.
    pub inv_mass: Vector<Real>,
    /// Linear pseudo-velocity of the split-impulse position correction.
    pub push_velocity: Vector<Real>,
    /// Angular pseudo-velocity of the split-impulse position correction.
    pub turn_velocity: Vector<Real>,
    /// The linear velocity at the start of the solve.
    pub linear_velocity: Vector<Real>,
    /// The angular velocity at the start of the solve.
    pub angular_velocity: Vector<Real>,
    /// Linear velocity change due to the external forces over the step.
    pub external_force_impulse: Vector<Real>,
    /// Angular velocity change due to the external torques over the step.
    pub external_torque_impulse: Vector<Real>,
    /// The world-space inverse inertia tensor.
    pub inv_inertia_world: Matrix<Real>,
    /// The dynamic body this solver body was created from, if any.
    pub original_body: Option<RigidBodyHandle>,
}

impl SolverBody {
    /// A solver body that no impulse can move.
    pub fn fixed() -> Self {
        Self {
            world_transform: Isometry::identity(),
            delta_linear_velocity: Vector::zeros(),
            delta_angular_velocity: Vector::zeros(),
            angular_factor: Vector::repeat(1.0),
            linear_factor: Vector::repeat(1.0),
            inv_mass: Vector::zeros(),
            push_velocity: Vector::zeros(),
            turn_velocity: Vector::zeros(),
            linear_velocity: Vector::zeros(),
            angular_velocity: Vector::zeros(),
            external_force_impulse: Vector::zeros(),
            external_torque_impulse: Vector::zeros(),
            inv_inertia_world: Matrix::zeros(),
            original_body: None,
        }
    }

    /// The working copy of a dynamic body for a step of length `dt`.
    pub fn from_rigid_body(handle: RigidBodyHandle, body: &RigidBody, dt: Real) -> Self {
        Self {
            world_transform: *body.position(),
            angular_factor: *body.angular_factor(),
            linear_factor: *body.linear_factor(),
            inv_mass: body.linear_factor() * body.inv_mass(),
            linear_velocity: *body.linvel(),
            angular_velocity: *body.angvel(),
            external_force_impulse: body.total_force() * (body.inv_mass() * dt),
            external_torque_impulse: body.inv_inertia_world() * body.total_torque() * dt,
            inv_inertia_world: *body.inv_inertia_world(),
            original_body: Some(handle),
            ..Self::fixed()
        }
    }

    /// Accumulates the velocity change caused by an impulse of magnitude `impulse_magnitude`.
    #[inline]
    pub fn internal_apply_impulse(
        &mut self,
        linear_component: &Vector<Real>,
        angular_component: &Vector<Real>,
        impulse_magnitude: Real,
    ) {
        if self.original_body.is_some() {
            self.delta_linear_velocity +=
                (linear_component * impulse_magnitude).component_mul(&self.linear_factor);
            self.delta_angular_velocity +=
                angular_component.component_mul(&(self.angular_factor * impulse_magnitude));
        }
    }

    /// Accumulates the pseudo-velocity change caused by a split-impulse correction.
    #[inline]
    pub fn internal_apply_push_impulse(
        &mut self,
        linear_component: &Vector<Real>,
        angular_component: &Vector<Real>,
        impulse_magnitude: Real,
    ) {
        if self.original_body.is_some() {
            self.push_velocity +=
                (linear_component * impulse_magnitude).component_mul(&self.linear_factor);
            self.turn_velocity +=
                angular_component.component_mul(&(self.angular_factor * impulse_magnitude));
        }
    }

    /// The velocity of the point at `rel_pos` from the center of mass, ignoring
    /// the velocity changes accumulated by the solver.
    #[inline]
    pub fn velocity_in_local_point_no_delta(&self, rel_pos: &Vector<Real>) -> Vector<Real> {
        if self.original_body.is_some() {
            self.linear_velocity
                + self.external_force_impulse
                + (self.angular_velocity + self.external_torque_impulse).cross(rel_pos)
        } else {
            Vector::zeros()
        }
    }

    /// Adds the accumulated velocity changes to the velocities.
    pub fn writeback_velocity(&mut self) {
        if self.original_body.is_some() {
            self.linear_velocity += self.delta_linear_velocity;
            self.angular_velocity += self.delta_angular_velocity;
        }
    }

    /// Adds the accumulated velocity changes to the velocities, and moves the
    /// body by its split-impulse pseudo-velocities.
    pub fn writeback_velocity_and_transform(&mut self, dt: Real, split_impulse_turn_erp: Real) {
        if self.original_body.is_some() {
            self.writeback_velocity();

            if self.push_velocity != Vector::zeros() || self.turn_velocity != Vector::zeros() {
                self.world_transform = transform_util::integrate_transform(
                    &self.world_transform,
                    &self.push_velocity,
                    &(self.turn_velocity * split_impulse_turn_erp),
                    dt,
                );
            }
        }
    }
}
