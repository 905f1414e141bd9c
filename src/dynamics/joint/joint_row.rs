use crate::dynamics::RigidBody;
use crate::math::{Isometry, Matrix, Point, Real, Rotation, Vector};
use na::Rotation3;
use smallvec::SmallVec;

/// One scalar velocity constraint produced by a joint.
///
/// The constrained quantity is the relative velocity
/// `j1_linear·v_a + j1_angular·ω_a + j2_linear·v_b + j2_angular·ω_b`,
/// driven toward `rhs` with an accumulated impulse kept inside
/// `[lower_limit, upper_limit]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct JointRow {
    pub j1_linear: Vector<Real>,
    pub j1_angular: Vector<Real>,
    pub j2_linear: Vector<Real>,
    pub j2_angular: Vector<Real>,
    pub rhs: Real,
    pub cfm: Real,
    pub lower_limit: Real,
    pub upper_limit: Real,
}

impl JointRow {
    /// A row constraining the relative angular velocity around `axis`.
    pub fn angular(axis: &Vector<Real>) -> Self {
        Self {
            j1_linear: Vector::zeros(),
            j1_angular: *axis,
            j2_linear: Vector::zeros(),
            j2_angular: -axis,
            rhs: 0.0,
            cfm: 0.0,
            lower_limit: -Real::MAX,
            upper_limit: Real::MAX,
        }
    }
}

pub(crate) type JointRows = SmallVec<[JointRow; 6]>;

/// Solver-wide values needed to build the joint rows of one step.
#[derive(Copy, Clone, Debug)]
pub(crate) struct RowContext {
    pub fps: Real,
    pub erp: Real,
    pub cfm: Real,
    pub num_iterations: usize,
}

/// Per-axis error reduction and constraint force mixing of a joint.
///
/// Axes `0..3` are linear and `3..6` are angular.
#[derive(Copy, Clone, Debug)]
pub(crate) struct RowParams {
    pub fps: Real,
    pub num_iterations: usize,
    pub erp: [Real; 6],
    pub cfm: [Real; 6],
    pub stop_erp: [Real; 6],
    pub stop_cfm: [Real; 6],
}

impl RowParams {
    /// The error correction gain of a locked axis.
    #[inline]
    pub fn k(&self, axis: usize) -> Real {
        self.fps * self.erp[axis]
    }

    /// The error correction gain of a limit.
    #[inline]
    pub fn k_stop(&self, axis: usize) -> Real {
        self.fps * self.stop_erp[axis]
    }

    /// The step length.
    #[inline]
    pub fn dt(&self) -> Real {
        1.0 / self.fps
    }
}

/// The range a joint coordinate is allowed to move in.
///
/// A range with `lower > upper` leaves the coordinate free, a range with
/// `lower == upper` locks it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointLimit {
    /// The smallest allowed value.
    pub lower: Real,
    /// The largest allowed value.
    pub upper: Real,
}

impl JointLimit {
    /// A limit leaving the coordinate free.
    pub const FREE: Self = Self {
        lower: 1.0,
        upper: -1.0,
    };

    /// A limit restricting the coordinate to `[lower, upper]`.
    pub const fn new(lower: Real, upper: Real) -> Self {
        Self { lower, upper }
    }

    /// A limit locking the coordinate at `value`.
    pub const fn locked(value: Real) -> Self {
        Self {
            lower: value,
            upper: value,
        }
    }

    /// Is the coordinate free?
    #[inline]
    pub fn is_free(&self) -> bool {
        self.lower > self.upper
    }

    /// Is the coordinate locked?
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lower == self.upper
    }
}

/// A velocity motor driving a joint coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointMotor {
    /// The rate of change the motor tries to reach for the coordinate.
    pub target_velocity: Real,
    /// The largest impulse the motor may apply during one step.
    pub max_impulse: Real,
}

impl JointMotor {
    /// A motor driving the coordinate at `target_velocity`.
    pub const fn new(target_velocity: Real, max_impulse: Real) -> Self {
        Self {
            target_velocity,
            max_impulse,
        }
    }
}

/// A damped spring pulling a joint coordinate toward an equilibrium value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointSpring {
    /// The spring stiffness.
    pub stiffness: Real,
    /// The spring damping.
    pub damping: Real,
    /// The coordinate value at rest.
    pub equilibrium_point: Real,
}

impl JointSpring {
    /// The motor emulating this spring during one step, given the current coordinate.
    pub(crate) fn as_motor(&self, coordinate: Real, params: &RowParams) -> JointMotor {
        let force = (coordinate - self.equilibrium_point) * self.stiffness;
        let vel_factor = params.fps * self.damping / params.num_iterations.max(1) as Real;
        JointMotor {
            target_velocity: -vel_factor * force,
            max_impulse: force.abs() * params.dt(),
        }
    }
}

/// Appends the row enforcing `limit` and `motor` on a coordinate of current value `q`.
///
/// The rate of change of `q` must be the opposite of the relative velocity
/// measured by `template`. A violated limit takes precedence over the motor.
pub(crate) fn push_limit_motor_row(
    rows: &mut JointRows,
    template: JointRow,
    q: Real,
    limit: &JointLimit,
    motor: Option<&JointMotor>,
    params: &RowParams,
    axis: usize,
    angular: bool,
) {
    let mut row = template;

    let error = |target: Real| {
        let err = q - target;
        if angular {
            wrap_angle(err)
        } else {
            err
        }
    };

    if limit.is_locked() {
        row.rhs = params.k(axis) * error(limit.lower);
        row.cfm = params.cfm[axis];
    } else if !limit.is_free() && q < limit.lower {
        row.rhs = params.k_stop(axis) * error(limit.lower);
        row.cfm = params.stop_cfm[axis];
        row.lower_limit = -Real::MAX;
        row.upper_limit = 0.0;
    } else if !limit.is_free() && q > limit.upper {
        row.rhs = params.k_stop(axis) * error(limit.upper);
        row.cfm = params.stop_cfm[axis];
        row.lower_limit = 0.0;
        row.upper_limit = Real::MAX;
    } else if let Some(motor) = motor {
        row.rhs = -motor.target_velocity;
        row.cfm = params.cfm[axis];
        row.lower_limit = -motor.max_impulse;
        row.upper_limit = motor.max_impulse;
    } else {
        return;
    }

    rows.push(row);
}

/// The world-space frames of a joint attached to two bodies.
#[derive(Copy, Clone, Debug)]
pub(crate) struct JointFrames {
    pub frame_a: Isometry<Real>,
    pub frame_b: Isometry<Real>,
    /// Joint origin on A relative to A's center of mass.
    pub r_a: Vector<Real>,
    /// Joint origin on B relative to B's center of mass.
    pub r_b: Vector<Real>,
}

impl JointFrames {
    pub fn new(
        body_a: &RigidBody,
        local_frame_a: &Isometry<Real>,
        body_b: &RigidBody,
        local_frame_b: &Isometry<Real>,
    ) -> Self {
        let frame_a = body_a.position() * local_frame_a;
        let frame_b = body_b.position() * local_frame_b;
        Self {
            frame_a,
            frame_b,
            r_a: frame_a.translation.vector - body_a.position().translation.vector,
            r_b: frame_b.translation.vector - body_b.position().translation.vector,
        }
    }

    pub fn from_pivots(
        body_a: &RigidBody,
        pivot_a: &Point<Real>,
        body_b: &RigidBody,
        pivot_b: &Point<Real>,
    ) -> Self {
        Self::new(
            body_a,
            &Isometry::translation(pivot_a.x, pivot_a.y, pivot_a.z),
            body_b,
            &Isometry::translation(pivot_b.x, pivot_b.y, pivot_b.z),
        )
    }

    /// The `i`-th axis of the frame attached to A, in world space.
    #[inline]
    pub fn axis_a(&self, i: usize) -> Vector<Real> {
        self.frame_a.rotation * Vector::ith(i, 1.0)
    }

    /// The `i`-th axis of the frame attached to B, in world space.
    #[inline]
    pub fn axis_b(&self, i: usize) -> Vector<Real> {
        self.frame_b.rotation * Vector::ith(i, 1.0)
    }

    /// The displacement of B's frame origin relative to A's, projected on `axis`.
    #[inline]
    pub fn linear_coordinate(&self, axis: &Vector<Real>) -> Real {
        axis.dot(&(self.frame_b.translation.vector - self.frame_a.translation.vector))
    }

    /// The rotation bringing A's frame onto B's frame, as a world-space scaled axis.
    #[inline]
    pub fn angular_error(&self) -> Vector<Real> {
        (self.frame_b.rotation * self.frame_a.rotation.inverse()).scaled_axis()
    }

    /// The rotation of B's frame relative to A's frame, in A's frame.
    #[inline]
    pub fn relative_rotation(&self) -> Rotation<Real> {
        self.frame_a.rotation.inverse() * self.frame_b.rotation
    }

    /// A row constraining the relative velocity of both frame origins along `axis`.
    pub fn linear_row(&self, axis: &Vector<Real>) -> JointRow {
        JointRow {
            j1_linear: *axis,
            j1_angular: self.r_a.cross(axis),
            j2_linear: -axis,
            j2_angular: -self.r_b.cross(axis),
            rhs: 0.0,
            cfm: 0.0,
            lower_limit: -Real::MAX,
            upper_limit: Real::MAX,
        }
    }

    /// Appends a row keeping both frame origins at the same coordinate along `axis`.
    pub fn push_locked_linear_row(
        &self,
        rows: &mut JointRows,
        axis: &Vector<Real>,
        params: &RowParams,
        param_axis: usize,
    ) {
        let mut row = self.linear_row(axis);
        row.rhs = params.k(param_axis) * self.linear_coordinate(axis);
        row.cfm = params.cfm[param_axis];
        rows.push(row);
    }

    /// Appends a row cancelling the relative rotation of both frames around `axis`.
    pub fn push_locked_angular_row(
        &self,
        rows: &mut JointRows,
        axis: &Vector<Real>,
        error: Real,
        params: &RowParams,
        param_axis: usize,
    ) {
        let mut row = JointRow::angular(axis);
        row.rhs = params.k(param_axis) * error;
        row.cfm = params.cfm[param_axis];
        rows.push(row);
    }
}

/// Wraps an angle into `[-π, π]`.
pub(crate) fn wrap_angle(angle: Real) -> Real {
    const PI: Real = core::f64::consts::PI as Real;
    const TWO_PI: Real = core::f64::consts::TAU as Real;

    if angle > PI {
        angle - TWO_PI
    } else if angle < -PI {
        angle + TWO_PI
    } else {
        angle
    }
}

/// The rotation whose matrix has the columns `x`, `y`, `z`.
///
/// The columns are assumed to form a right-handed orthonormal basis.
pub(crate) fn rotation_from_basis(
    x: &Vector<Real>,
    y: &Vector<Real>,
    z: &Vector<Real>,
) -> Rotation<Real> {
    let mat = Matrix::from_columns(&[*x, *y, *z]);
    Rotation::from_rotation_matrix(&Rotation3::from_matrix_unchecked(mat))
}

/// Decomposes `rot` into the angles `(x, y, z)` such that
/// `rot = Rx(x) * Ry(y) * Rz(z)`.
pub(crate) fn matrix_to_euler_xyz(rot: &Rotation<Real>) -> Vector<Real> {
    const FRAC_PI_2: Real = core::f64::consts::FRAC_PI_2 as Real;
    let m = rot.to_rotation_matrix().into_inner();
    let fi = m[(0, 2)];

    if fi < 1.0 {
        if fi > -1.0 {
            Vector::new(
                (-m[(1, 2)]).atan2(m[(2, 2)]),
                fi.asin(),
                (-m[(0, 1)]).atan2(m[(0, 0)]),
            )
        } else {
            // Not unique: x - z = -atan2(m10, m11).
            Vector::new(-m[(1, 0)].atan2(m[(1, 1)]), -FRAC_PI_2, 0.0)
        }
    } else {
        // Not unique: x + z = atan2(m10, m11).
        Vector::new(m[(1, 0)].atan2(m[(1, 1)]), FRAC_PI_2, 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn euler_xyz_round_trip() {
        let angles = Vector::new(0.3, -0.4, 1.2);
        let rot = Rotation::from_axis_angle(&Vector::x_axis(), angles.x)
            * Rotation::from_axis_angle(&Vector::y_axis(), angles.y)
            * Rotation::from_axis_angle(&Vector::z_axis(), angles.z);
        assert_relative_eq!(matrix_to_euler_xyz(&rot), angles, epsilon = 1.0e-5);
    }

    #[test]
    fn limit_rows_bound_the_impulse_sign() {
        let params = RowParams {
            fps: 60.0,
            num_iterations: 10,
            erp: [0.2; 6],
            cfm: [0.0; 6],
            stop_erp: [0.2; 6],
            stop_cfm: [0.0; 6],
        };
        let template = JointRow::angular(&Vector::z());
        let limit = JointLimit::new(-0.5, 0.5);
        let mut rows = JointRows::new();

        push_limit_motor_row(&mut rows, template, 0.0, &limit, None, &params, 5, true);
        assert!(rows.is_empty());

        push_limit_motor_row(&mut rows, template, -0.6, &limit, None, &params, 5, true);
        assert_eq!(rows[0].upper_limit, 0.0);
        assert!(rows[0].rhs < 0.0);

        push_limit_motor_row(&mut rows, template, 0.7, &limit, None, &params, 5, true);
        assert_eq!(rows[1].lower_limit, 0.0);
        assert!(rows[1].rhs > 0.0);

        let motor = JointMotor::new(2.0, 1.0);
        push_limit_motor_row(&mut rows, template, 0.0, &limit, Some(&motor), &params, 5, true);
        assert_eq!(rows[2].rhs, -2.0);
        assert_eq!(rows[2].upper_limit, 1.0);
    }
}
