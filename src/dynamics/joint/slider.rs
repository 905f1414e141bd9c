use super::joint_row::{
    push_limit_motor_row, JointFrames, JointLimit, JointMotor, JointRow, JointRows, RowParams,
};
use crate::dynamics::RigidBody;
use crate::math::{Isometry, Real};

/// A joint allowing the translation along, and the rotation around, one axis.
///
/// The slider axis is the `x` axis of both joint frames. By default the
/// translation is free and the rotation is locked.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliderJoint {
    /// The joint frame, in the local frame of the first body.
    pub frame_in_a: Isometry<Real>,
    /// The joint frame, in the local frame of the second body.
    pub frame_in_b: Isometry<Real>,
    /// The range of the translation along the slider axis.
    pub linear_limit: JointLimit,
    /// The range of the rotation around the slider axis.
    pub angular_limit: JointLimit,
    /// The motor driving the translation.
    pub linear_motor: Option<JointMotor>,
    /// The motor driving the rotation.
    pub angular_motor: Option<JointMotor>,
}

impl SliderJoint {
    /// A slider between two joint frames.
    pub fn new(frame_in_a: Isometry<Real>, frame_in_b: Isometry<Real>) -> Self {
        Self {
            frame_in_a,
            frame_in_b,
            linear_limit: JointLimit::FREE,
            angular_limit: JointLimit::locked(0.0),
            linear_motor: None,
            angular_motor: None,
        }
    }

    /// The translation of the second frame relative to the first one, along the slider axis.
    pub fn linear_position(&self, body_a: &RigidBody, body_b: &RigidBody) -> Real {
        let frames = JointFrames::new(body_a, &self.frame_in_a, body_b, &self.frame_in_b);
        frames.linear_coordinate(&frames.axis_a(0))
    }

    fn angular_position(frames: &JointFrames) -> Real {
        let b_y = frames.axis_b(1);
        b_y.dot(&frames.axis_a(2)).atan2(b_y.dot(&frames.axis_a(1)))
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        let frames = JointFrames::new(body_a, &self.frame_in_a, body_b, &self.frame_in_b);
        let angular_error = frames.angular_error();

        for i in 1..3 {
            let axis = frames.axis_a(i);
            frames.push_locked_linear_row(rows, &axis, params, i);
            frames.push_locked_angular_row(rows, &axis, angular_error.dot(&axis), params, 3 + i);
        }

        let axis = frames.axis_a(0);
        push_limit_motor_row(
            rows,
            frames.linear_row(&axis),
            frames.linear_coordinate(&axis),
            &self.linear_limit,
            self.linear_motor.as_ref(),
            params,
            0,
            false,
        );
        push_limit_motor_row(
            rows,
            JointRow::angular(&axis),
            Self::angular_position(&frames),
            &self.angular_limit,
            self.angular_motor.as_ref(),
            params,
            3,
            true,
        );
    }
}
