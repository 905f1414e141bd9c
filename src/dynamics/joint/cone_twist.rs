use super::joint_row::{
    push_limit_motor_row, wrap_angle, JointFrames, JointLimit, JointRow, JointRows, RowParams,
};
use crate::dynamics::RigidBody;
use crate::math::{Isometry, Real, Vector, DEFAULT_EPSILON, DIM, LARGE_FLOAT};

/// A ball-and-socket joint with an elliptic swing cone and a twist range.
///
/// The twist axis is the `x` axis of both joint frames. The swing around
/// the frame's `y` axis is bounded by `swing_span1`, and around its `z` axis
/// by `swing_span2`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConeTwistJoint {
    /// The joint frame, in the local frame of the first body.
    pub frame_in_a: Isometry<Real>,
    /// The joint frame, in the local frame of the second body.
    pub frame_in_b: Isometry<Real>,
    /// Half-angle of the swing cone around the `y` axis.
    pub swing_span1: Real,
    /// Half-angle of the swing cone around the `z` axis.
    pub swing_span2: Real,
    /// Half-range of the twist around the `x` axis.
    pub twist_span: Real,
}

impl ConeTwistJoint {
    /// A joint between two frames, with unbounded swing and twist.
    pub fn new(frame_in_a: Isometry<Real>, frame_in_b: Isometry<Real>) -> Self {
        Self {
            frame_in_a,
            frame_in_b,
            swing_span1: LARGE_FLOAT,
            swing_span2: LARGE_FLOAT,
            twist_span: LARGE_FLOAT,
        }
    }

    /// Sets the swing and twist ranges.
    pub fn set_limit(&mut self, swing_span1: Real, swing_span2: Real, twist_span: Real) {
        self.swing_span1 = swing_span1;
        self.swing_span2 = swing_span2;
        self.twist_span = twist_span;
    }

    pub(crate) fn append_rows(
        &self,
        body_a: &RigidBody,
        body_b: &RigidBody,
        params: &RowParams,
        rows: &mut JointRows,
    ) {
        let frames = JointFrames::new(body_a, &self.frame_in_a, body_b, &self.frame_in_b);

        for i in 0..DIM {
            frames.push_locked_linear_row(rows, &Vector::ith(i, 1.0), params, i);
        }

        let twist_a = frames.axis_a(0);
        let twist_b = frames.axis_b(0);
        let swing = twist_a.cross(&twist_b);
        let swing_sin = swing.norm();

        if swing_sin > DEFAULT_EPSILON {
            let swing_axis = swing / swing_sin;
            let swing_angle = swing_sin.atan2(twist_a.dot(&twist_b));
            let sy = swing_axis.dot(&frames.axis_a(1)) / self.swing_span1;
            let sz = swing_axis.dot(&frames.axis_a(2)) / self.swing_span2;
            let swing_limit = 1.0 / (sy * sy + sz * sz).sqrt();

            push_limit_motor_row(
                rows,
                JointRow::angular(&swing_axis),
                swing_angle,
                &JointLimit::new(0.0, swing_limit),
                None,
                params,
                4,
                true,
            );
        }

        if self.twist_span < LARGE_FLOAT {
            let rel = frames.relative_rotation();
            let twist = wrap_angle(2.0 * rel.i.atan2(rel.w));

            push_limit_motor_row(
                rows,
                JointRow::angular(&twist_a),
                twist,
                &JointLimit::new(-self.twist_span, self.twist_span),
                None,
                params,
                3,
                true,
            );
        }
    }
}
