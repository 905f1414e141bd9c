use super::joint_row::{
    matrix_to_euler_xyz, push_limit_motor_row, JointFrames, JointLimit, JointMotor, JointRow,
    JointRows, JointSpring, RowParams,
};
use crate::dynamics::RigidBody;
use crate::math::{Isometry, Real, Vector, DEFAULT_EPSILON, DIM};

/// A joint with an independent limit and motor on each of its six degrees of freedom.
///
/// Linear coordinates are the displacement of B's frame origin along the
/// axes of A's frame. Angular coordinates are the `x`, `y`, `z` Euler angles
/// of B's frame relative to A's frame. Every coordinate is locked at zero by
/// default.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Generic6DofJoint {
    /// The joint frame, in the local frame of the first body.
    pub frame_in_a: Isometry<Real>,
    /// The joint frame, in the local frame of the second body.
    pub frame_in_b: Isometry<Real>,
    /// The ranges of the linear coordinates.
    pub linear_limits: [JointLimit; DIM],
    /// The ranges of the angular coordinates.
    pub angular_limits: [JointLimit; DIM],
    /// The motors of the linear coordinates.
    pub linear_motors: [Option<JointMotor>; DIM],
    /// The motors of the angular coordinates.
    pub angular_motors: [Option<JointMotor>; DIM],
}

/// The joint coordinates and the world-space axes their rates are measured along.
struct Coordinates {
    frames: JointFrames,
    values: [Real; 6],
    angular_axes: [Vector<Real>; DIM],
}

impl Generic6DofJoint {
    /// A joint between two frames with every coordinate locked.
    pub fn new(frame_in_a: Isometry<Real>, frame_in_b: Isometry<Real>) -> Self {
        Self {
            frame_in_a,
            frame_in_b,
            linear_limits: [JointLimit::locked(0.0); DIM],
            angular_limits: [JointLimit::locked(0.0); DIM],
            linear_motors: [None; DIM],
            angular_motors: [None; DIM],
        }
    }

    /// Sets the ranges of the three linear coordinates.
    pub fn set_linear_limits(&mut self, lower: Vector<Real>, upper: Vector<Real>) {
        for i in 0..DIM {
            self.linear_limits[i] = JointLimit::new(lower[i], upper[i]);
        }
    }

    /// Sets the ranges of the three angular coordinates.
    pub fn set_angular_limits(&mut self, lower: Vector<Real>, upper: Vector<Real>) {
        for i in 0..DIM {
            self.angular_limits[i] = JointLimit::new(lower[i], upper[i]);
        }
    }

    /// The six joint coordinates for the current body poses.
    pub fn coordinates(&self, body_a: &RigidBody, body_b: &RigidBody) -> [Real; 6] {
        self.compute_coordinates(body_a, body_b).values
    }

    fn compute_coordinates(&self, body_a: &RigidBody, body_b: &RigidBody) -> Coordinates {
        let frames = JointFrames::new(body_a, &self.frame_in_a, body_b, &self.frame_in_b);
        let euler = matrix_to_euler_xyz(&frames.relative_rotation());

        let axis0 = frames.axis_b(0);
        let axis2 = frames.axis_a(2);
        let axis1 = axis2.cross(&axis0);
        // Degenerate at a ±π/2 rotation around `y`; fall back to A's axes.
        let mut angular_axes = [axis1.cross(&axis2), axis1, axis0.cross(&axis1)];
        for (i, axis) in angular_axes.iter_mut().enumerate() {
            *axis = axis
                .try_normalize(DEFAULT_EPSILON)
                .unwrap_or_else(|| frames.axis_a(i));
        }

        let mut values = [0.0; 6];
        for i in 0..DIM {
            values[i] = frames.linear_coordinate(&frames.axis_a(i));
            values[3 + i] = euler[i];
        }

        Coordinates {
            frames,
            values,
            angular_axes,
        }
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        self.append_rows_with_springs(body_a, body_b, params, &[None; 6], rows)
    }

    fn append_rows_with_springs(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        springs: &[Option<JointSpring>; 6],
        rows: &mut JointRows,
    ) {
        let coords = self.compute_coordinates(body_a, body_b);
        let motor = |i: usize, motor: &Option<JointMotor>| {
            springs[i]
                .map(|spring| spring.as_motor(coords.values[i], params))
                .or(*motor)
        };

        for i in 0..DIM {
            let axis = coords.frames.axis_a(i);
            push_limit_motor_row(
                rows,
                coords.frames.linear_row(&axis),
                coords.values[i],
                &self.linear_limits[i],
                motor(i, &self.linear_motors[i]).as_ref(),
                params,
                i,
                false,
            );
        }

        for i in 0..DIM {
            push_limit_motor_row(
                rows,
                JointRow::angular(&coords.angular_axes[i]),
                coords.values[3 + i],
                &self.angular_limits[i],
                motor(3 + i, &self.angular_motors[i]).as_ref(),
                params,
                3 + i,
                true,
            );
        }
    }
}

/// A [`Generic6DofJoint`] with an optional spring on each coordinate.
///
/// Springs act through the motor of their coordinate, which they override.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Generic6DofSpringJoint {
    /// The underlying joint.
    pub joint: Generic6DofJoint,
    /// The spring of each coordinate; `0..3` are linear and `3..6` angular.
    pub springs: [Option<JointSpring>; 6],
}

impl Generic6DofSpringJoint {
    /// A joint between two frames with every coordinate locked and no spring.
    pub fn new(frame_in_a: Isometry<Real>, frame_in_b: Isometry<Real>) -> Self {
        Self {
            joint: Generic6DofJoint::new(frame_in_a, frame_in_b),
            springs: [None; 6],
        }
    }

    /// Attaches a spring to the coordinate `index`, or removes it.
    pub fn set_spring(&mut self, index: usize, spring: Option<JointSpring>) {
        if let Some(slot) = self.springs.get_mut(index) {
            *slot = spring;
        }
    }

    /// Moves the equilibrium point of every spring to the current coordinates.
    pub fn set_equilibrium_point(&mut self, body_a: &RigidBody, body_b: &RigidBody) {
        let values = self.joint.coordinates(body_a, body_b);
        for (spring, value) in self.springs.iter_mut().zip(values.iter()) {
            if let Some(spring) = spring {
                spring.equilibrium_point = *value;
            }
        }
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        self.joint
            .append_rows_with_springs(body_a, body_b, params, &self.springs, rows)
    }
}
