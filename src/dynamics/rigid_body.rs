use crate::math::{Isometry, Matrix, Point, Real, Vector};
use crate::utils::transform_util;
use slab::Slab;

/// The largest angular velocity norm, per unit time step, a body may reach
/// after velocity integration.
pub const MAX_ANGULAR_VELOCITY_STEP: Real = core::f64::consts::FRAC_PI_2 as Real;

/// A rigid body simulated by the constraint solver.
///
/// The position is the pose of the center of mass. Bodies with a zero inverse
/// mass are static: the solver never changes their velocities.
#[derive(Clone, Debug)]
pub struct RigidBody {
    position: Isometry<Real>,
    linvel: Vector<Real>,
    angvel: Vector<Real>,
    inv_mass: Real,
    inv_inertia_local: Vector<Real>,
    inv_inertia_world: Matrix<Real>,
    linear_factor: Vector<Real>,
    angular_factor: Vector<Real>,
    total_force: Vector<Real>,
    total_torque: Vector<Real>,
    push_velocity: Vector<Real>,
    turn_velocity: Vector<Real>,
    /// The friction coefficient of this body.
    pub friction: Real,
    /// The restitution coefficient of this body.
    pub restitution: Real,
    /// The rolling friction coefficient of this body.
    pub rolling_friction: Real,
    /// The spinning friction coefficient of this body.
    pub spinning_friction: Real,
}

impl RigidBody {
    /// Creates a dynamic body with the given mass and principal inertia.
    ///
    /// A zero mass, or a zero principal inertia component, results in an
    /// infinite mass (resp. inertia) along that component.
    pub fn new_dynamic(position: Isometry<Real>, mass: Real, local_inertia: Vector<Real>) -> Self {
        let inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        let inv_inertia_local =
            local_inertia.map(|i| if i != 0.0 { 1.0 / i } else { 0.0 });
        let mut result = Self::with_mass_properties(position, inv_mass, inv_inertia_local);
        result.update_inertia_tensor();
        result
    }

    /// Creates a static body.
    pub fn new_static(position: Isometry<Real>) -> Self {
        Self::with_mass_properties(position, 0.0, Vector::zeros())
    }

    fn with_mass_properties(
        position: Isometry<Real>,
        inv_mass: Real,
        inv_inertia_local: Vector<Real>,
    ) -> Self {
        Self {
            position,
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            inv_mass,
            inv_inertia_local,
            inv_inertia_world: Matrix::zeros(),
            linear_factor: Vector::repeat(1.0),
            angular_factor: Vector::repeat(1.0),
            total_force: Vector::zeros(),
            total_torque: Vector::zeros(),
            push_velocity: Vector::zeros(),
            turn_velocity: Vector::zeros(),
            friction: 0.5,
            restitution: 0.0,
            rolling_friction: 0.0,
            spinning_friction: 0.0,
        }
    }

    /// Is this body affected by impulses?
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.inv_mass != 0.0
    }

    /// The pose of this body's center of mass.
    #[inline]
    pub fn position(&self) -> &Isometry<Real> {
        &self.position
    }

    /// Moves this body, updating its world-space inertia tensor.
    pub fn set_position(&mut self, position: Isometry<Real>) {
        self.position = position;
        self.update_inertia_tensor();
    }

    /// The world-space center of mass.
    #[inline]
    pub fn center_of_mass(&self) -> Point<Real> {
        Point::from(self.position.translation.vector)
    }

    /// The linear velocity of this body.
    #[inline]
    pub fn linvel(&self) -> &Vector<Real> {
        &self.linvel
    }

    /// Sets the linear velocity of this body.
    #[inline]
    pub fn set_linvel(&mut self, linvel: Vector<Real>) {
        self.linvel = linvel;
    }

    /// The angular velocity of this body.
    #[inline]
    pub fn angvel(&self) -> &Vector<Real> {
        &self.angvel
    }

    /// Sets the angular velocity of this body.
    #[inline]
    pub fn set_angvel(&mut self, angvel: Vector<Real>) {
        self.angvel = angvel;
    }

    /// The inverse mass of this body.
    #[inline]
    pub fn inv_mass(&self) -> Real {
        self.inv_mass
    }

    /// The diagonal of the inverse inertia tensor, in local space.
    #[inline]
    pub fn inv_inertia_local(&self) -> &Vector<Real> {
        &self.inv_inertia_local
    }

    /// The inverse inertia tensor, in world space.
    #[inline]
    pub fn inv_inertia_world(&self) -> &Matrix<Real> {
        &self.inv_inertia_world
    }

    /// Per-axis multiplier applied to every linear velocity change.
    #[inline]
    pub fn linear_factor(&self) -> &Vector<Real> {
        &self.linear_factor
    }

    /// Sets the per-axis linear velocity change multiplier.
    pub fn set_linear_factor(&mut self, factor: Vector<Real>) {
        self.linear_factor = factor;
    }

    /// Per-axis multiplier applied to every angular velocity change.
    #[inline]
    pub fn angular_factor(&self) -> &Vector<Real> {
        &self.angular_factor
    }

    /// Sets the per-axis angular velocity change multiplier.
    pub fn set_angular_factor(&mut self, factor: Vector<Real>) {
        self.angular_factor = factor;
    }

    /// The force accumulated since the last call to [`Self::clear_forces`].
    #[inline]
    pub fn total_force(&self) -> &Vector<Real> {
        &self.total_force
    }

    /// The torque accumulated since the last call to [`Self::clear_forces`].
    #[inline]
    pub fn total_torque(&self) -> &Vector<Real> {
        &self.total_torque
    }

    /// Adds a force applied at the center of mass.
    pub fn apply_central_force(&mut self, force: &Vector<Real>) {
        self.total_force += force.component_mul(&self.linear_factor);
    }

    /// Adds a torque.
    pub fn apply_torque(&mut self, torque: &Vector<Real>) {
        self.total_torque += torque.component_mul(&self.angular_factor);
    }

    /// Adds a force applied at `rel_pos`, relative to the center of mass.
    pub fn apply_force(&mut self, force: &Vector<Real>, rel_pos: &Vector<Real>) {
        self.apply_central_force(force);
        self.apply_torque(&rel_pos.cross(&force.component_mul(&self.linear_factor)));
    }

    /// Changes the velocities of this body as if `impulse` was applied at `rel_pos`.
    pub fn apply_impulse(&mut self, impulse: &Vector<Real>, rel_pos: &Vector<Real>) {
        if self.is_dynamic() {
            self.linvel += impulse.component_mul(&self.linear_factor) * self.inv_mass;
            let torque = rel_pos.cross(&impulse.component_mul(&self.linear_factor));
            self.angvel +=
                (self.inv_inertia_world * torque).component_mul(&self.angular_factor);
        }
    }

    /// Resets the accumulated force and torque.
    pub fn clear_forces(&mut self) {
        self.total_force.fill(0.0);
        self.total_torque.fill(0.0);
    }

    /// The split-impulse positional correction velocities `(push, turn)`
    /// written back by the last solve.
    #[inline]
    pub fn split_impulse_velocities(&self) -> (&Vector<Real>, &Vector<Real>) {
        (&self.push_velocity, &self.turn_velocity)
    }

    pub(crate) fn set_split_impulse_velocities(&mut self, push: Vector<Real>, turn: Vector<Real>) {
        self.push_velocity = push;
        self.turn_velocity = turn;
    }

    /// The velocity of the material point at `rel_pos` from the center of mass.
    #[inline]
    pub fn velocity_in_local_point(&self, rel_pos: &Vector<Real>) -> Vector<Real> {
        self.linvel + self.angvel.cross(rel_pos)
    }

    /// Recomputes the world-space inverse inertia tensor from the current orientation.
    pub fn update_inertia_tensor(&mut self) {
        let rot = self.position.rotation.to_rotation_matrix();
        self.inv_inertia_world =
            rot.matrix() * Matrix::from_diagonal(&self.inv_inertia_local) * rot.matrix().transpose();
    }

    /// Applies the accumulated forces to the velocities for a step of length `dt`.
    pub fn integrate_velocities(&mut self, dt: Real) {
        if !self.is_dynamic() {
            return;
        }

        self.linvel += self.total_force * (self.inv_mass * dt);
        self.angvel += self.inv_inertia_world * self.total_torque * dt;

        let angvel = self.angvel.norm();
        if angvel * dt > MAX_ANGULAR_VELOCITY_STEP {
            self.angvel *= (MAX_ANGULAR_VELOCITY_STEP / dt) / angvel;
        }
    }

    /// The pose this body would reach after moving with its current velocities for `dt`.
    pub fn predict_integrated_transform(&self, dt: Real) -> Isometry<Real> {
        transform_util::integrate_transform(&self.position, &self.linvel, &self.angvel, dt)
    }

    /// Moves this body with its current velocities for `dt`.
    pub fn integrate_transform(&mut self, dt: Real) {
        if self.is_dynamic() {
            let position = self.predict_integrated_transform(dt);
            self.set_position(position);
        }
    }
}

/// The unique identifier of a rigid body added to a [`RigidBodySet`].
///
/// Handles are generational: the handle of a removed body never aliases a
/// body inserted later at the same slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RigidBodyHandle {
    index: u32,
    generation: u32,
}

impl RigidBodyHandle {
    /// The slot index of this handle.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// The raw `(index, generation)` parts of this handle.
    #[inline]
    pub fn into_raw_parts(self) -> (u32, u32) {
        (self.index, self.generation)
    }
}

/// An arena of rigid bodies.
///
/// Every set owns one static body, the world anchor, which cannot be
/// removed nor mutated. It is the implicit second body of single-body joints.
#[derive(Clone, Debug)]
pub struct RigidBodySet {
    bodies: Slab<(u32, RigidBody)>,
    generation: u32,
    world_anchor: RigidBodyHandle,
}

impl Default for RigidBodySet {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBodySet {
    /// Creates a set containing only the world anchor.
    pub fn new() -> Self {
        let mut bodies = Slab::new();
        let index = bodies.insert((0, RigidBody::new_static(Isometry::identity())));
        Self {
            bodies,
            generation: 1,
            world_anchor: RigidBodyHandle {
                index: index as u32,
                generation: 0,
            },
        }
    }

    /// The immovable body single-body joints are attached to.
    #[inline]
    pub fn world_anchor(&self) -> RigidBodyHandle {
        self.world_anchor
    }

    /// The number of bodies, world anchor included.
    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Is this set empty? Never true, because of the world anchor.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Adds a body to this set.
    pub fn insert(&mut self, body: RigidBody) -> RigidBodyHandle {
        let generation = self.generation;
        self.generation = self.generation.wrapping_add(1);
        let index = self.bodies.insert((generation, body));
        RigidBodyHandle {
            index: index as u32,
            generation,
        }
    }

    /// Removes a body. Returns `None` for a stale handle or for the world anchor.
    pub fn remove(&mut self, handle: RigidBodyHandle) -> Option<RigidBody> {
        if handle == self.world_anchor || !self.contains(handle) {
            return None;
        }

        Some(self.bodies.remove(handle.index()).1)
    }

    /// Does `handle` refer to a body of this set?
    #[inline]
    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.get(handle).is_some()
    }

    /// The body identified by `handle`.
    pub fn get(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies
            .get(handle.index())
            .filter(|(generation, _)| *generation == handle.generation)
            .map(|(_, body)| body)
    }

    /// Mutable access to the body identified by `handle`.
    ///
    /// Returns `None` for the world anchor.
    pub fn get_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        if handle == self.world_anchor {
            return None;
        }

        self.bodies
            .get_mut(handle.index())
            .filter(|(generation, _)| *generation == handle.generation)
            .map(|(_, body)| body)
    }

    /// Iterates through every body and its handle.
    pub fn iter(&self) -> impl Iterator<Item = (RigidBodyHandle, &RigidBody)> {
        self.bodies.iter().map(|(index, (generation, body))| {
            (
                RigidBodyHandle {
                    index: index as u32,
                    generation: *generation,
                },
                body,
            )
        })
    }

    /// Iterates mutably through every body except the world anchor.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (RigidBodyHandle, &mut RigidBody)> {
        let anchor = self.world_anchor;
        self.bodies
            .iter_mut()
            .map(|(index, (generation, body))| {
                (
                    RigidBodyHandle {
                        index: index as u32,
                        generation: *generation,
                    },
                    body,
                )
            })
            .filter(move |(handle, _)| *handle != anchor)
    }

    /// One plus the largest slot index in use.
    pub(crate) fn slot_capacity(&self) -> usize {
        self.bodies
            .iter()
            .map(|(index, _)| index + 1)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stale_handles_are_rejected() {
        let mut bodies = RigidBodySet::new();
        let h1 = bodies.insert(RigidBody::new_dynamic(
            Isometry::identity(),
            1.0,
            Vector::repeat(1.0),
        ));
        assert!(bodies.remove(h1).is_some());

        let h2 = bodies.insert(RigidBody::new_static(Isometry::identity()));
        assert_eq!(h1.index(), h2.index());
        assert!(bodies.get(h1).is_none());
        assert!(bodies.get(h2).is_some());
    }

    #[test]
    fn world_anchor_is_immutable() {
        let mut bodies = RigidBodySet::new();
        let anchor = bodies.world_anchor();
        assert!(bodies.get(anchor).is_some());
        assert!(bodies.get_mut(anchor).is_none());
        assert!(bodies.remove(anchor).is_none());
        assert_eq!(bodies.iter_mut().count(), 0);
        assert_eq!(bodies.len(), 1);
    }

    #[test]
    fn world_inertia_follows_orientation() {
        let rot = Vector::z() * core::f64::consts::FRAC_PI_2 as Real;
        let body = RigidBody::new_dynamic(
            Isometry::new(Vector::zeros(), rot),
            2.0,
            Vector::new(1.0, 2.0, 4.0),
        );
        let inv = body.inv_inertia_world();
        assert_relative_eq!(inv[(0, 0)], 0.5, epsilon = 1.0e-5);
        assert_relative_eq!(inv[(1, 1)], 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(inv[(2, 2)], 0.25, epsilon = 1.0e-5);
        assert_relative_eq!(body.inv_mass(), 0.5);
    }

    #[test]
    fn integration_applies_forces() {
        let mut body = RigidBody::new_dynamic(Isometry::identity(), 2.0, Vector::repeat(1.0));
        body.apply_central_force(&Vector::new(0.0, -20.0, 0.0));
        body.integrate_velocities(0.1);
        assert_relative_eq!(*body.linvel(), Vector::new(0.0, -1.0, 0.0), epsilon = 1.0e-6);
        body.integrate_transform(0.1);
        assert_relative_eq!(
            body.position().translation.vector,
            Vector::new(0.0, -0.1, 0.0),
            epsilon = 1.0e-6
        );
    }
}
