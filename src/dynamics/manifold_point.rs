use crate::math::{Point, Real, Vector};

bitflags::bitflags! {
    /// Flags describing how a contact point must be handled by the solver.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ContactPointFlags: u32 {
        /// The lateral friction directions have been computed and must be reused.
        const LATERAL_FRICTION_INITIALIZED = 1;
        /// The contact is kept while the friction impulse stays inside the friction cone.
        const FRICTION_ANCHOR = 1 << 1;
    }
}

/// A contact point persisting across simulation steps.
///
/// The normal points from the second body toward the first one, and the
/// distance is negative when both bodies penetrate.
#[derive(Clone, Debug, PartialEq)]
pub struct ManifoldPoint {
    /// The contact point on the first body, in its local frame.
    pub local_point_a: Point<Real>,
    /// The contact point on the second body, in its local frame.
    pub local_point_b: Point<Real>,
    /// The contact point on the first body, in world space.
    pub position_world_on_a: Point<Real>,
    /// The contact point on the second body, in world space.
    pub position_world_on_b: Point<Real>,
    /// The contact normal, pointing from the second body toward the first one.
    pub normal_world_on_b: Vector<Real>,
    /// The signed distance between both contact points along the normal.
    pub distance: Real,
    /// Friction coefficient combined from both bodies.
    pub combined_friction: Real,
    /// Restitution coefficient combined from both bodies.
    pub combined_restitution: Real,
    /// Rolling friction coefficient combined from both bodies.
    pub combined_rolling_friction: Real,
    /// Spinning friction coefficient combined from both bodies.
    pub combined_spinning_friction: Real,
    /// Shape part identifier on the first body.
    pub part_id0: i32,
    /// Shape part identifier on the second body.
    pub part_id1: i32,
    /// Sub-shape index on the first body.
    pub index0: i32,
    /// Sub-shape index on the second body.
    pub index1: i32,
    /// Accumulated normal impulse, used for warm starting.
    pub applied_impulse: Real,
    /// Accumulated friction impulse along `lateral_friction_dir1`.
    pub applied_impulse_lateral1: Real,
    /// Accumulated friction impulse along `lateral_friction_dir2`.
    pub applied_impulse_lateral2: Real,
    /// First friction direction, orthogonal to the normal.
    pub lateral_friction_dir1: Vector<Real>,
    /// Second friction direction, orthogonal to the normal and to the first one.
    pub lateral_friction_dir2: Vector<Real>,
    /// Number of steps this point survived.
    pub lifetime: u32,
    /// Solver flags of this point.
    pub flags: ContactPointFlags,
    /// Opaque data attached by the user.
    pub user_data: Option<u64>,
}

impl ManifoldPoint {
    /// A new contact point with zeroed impulses.
    pub fn new(
        local_point_a: Point<Real>,
        local_point_b: Point<Real>,
        normal_world_on_b: Vector<Real>,
        distance: Real,
    ) -> Self {
        Self {
            local_point_a,
            local_point_b,
            position_world_on_a: Point::origin(),
            position_world_on_b: Point::origin(),
            normal_world_on_b,
            distance,
            combined_friction: 0.0,
            combined_restitution: 0.0,
            combined_rolling_friction: 0.0,
            combined_spinning_friction: 0.0,
            part_id0: -1,
            part_id1: -1,
            index0: -1,
            index1: -1,
            applied_impulse: 0.0,
            applied_impulse_lateral1: 0.0,
            applied_impulse_lateral2: 0.0,
            lateral_friction_dir1: Vector::zeros(),
            lateral_friction_dir2: Vector::zeros(),
            lifetime: 0,
            flags: ContactPointFlags::empty(),
            user_data: None,
        }
    }

    /// The signed distance between both contact points.
    #[inline]
    pub fn distance(&self) -> Real {
        self.distance
    }

    /// Number of steps this point survived.
    #[inline]
    pub fn lifetime(&self) -> u32 {
        self.lifetime
    }
}
